//! End-to-end checkout tests: the full order flow, retry behavior, and
//! shipping totals.

#![allow(clippy::unwrap_used)]

use alma_artesana_core::ProductSummary;
use alma_artesana_integration_tests::{spawn_fake_api, test_state};
use alma_artesana_storefront::ApiError;
use alma_artesana_storefront::checkout::{CheckoutForm, PaymentMethod};
use rust_decimal::Decimal;
use serde_json::json;

fn summary(id: i64, name: &str, slug: &str, price: &str) -> ProductSummary {
    serde_json::from_value(json!({
        "id": id,
        "name": name,
        "slug": slug,
        "price": price,
    }))
    .unwrap()
}

fn shipping_form() -> CheckoutForm {
    CheckoutForm {
        email: "ana@example.com".into(),
        phone: "+502 5555-0000".into(),
        first_name: "Ana".into(),
        last_name: "García".into(),
        address: "4a Calle 12-45, Zona 10".into(),
        address_line2: String::new(),
        city: "Guatemala".into(),
        department: "Guatemala".into(),
        postal_code: "01010".into(),
        payment_method: PaymentMethod::Card,
        notes: None,
    }
}

#[tokio::test]
async fn full_order_flow_returns_an_order_number_and_clears_the_cart() {
    let fake = spawn_fake_api().await;
    let state = test_state(&fake);

    state
        .cart()
        .add(&summary(1, "Canasta de Palma", "canasta-de-palma", "200.00"), 1);

    let order = state.place_order(&shipping_form()).await.unwrap();

    assert!(!order.order_number.is_empty());
    assert_eq!(order.subtotal, Decimal::new(200, 0));
    assert_eq!(order.shipping_cost, Decimal::new(35, 0));
    assert_eq!(order.total, Decimal::new(235, 0));
    assert!(state.cart().is_empty());
}

#[tokio::test]
async fn failed_order_creation_keeps_the_cart_for_retry() {
    let fake = spawn_fake_api().await;
    let state = test_state(&fake);
    fake.shop().fail_create_order = true;

    state
        .cart()
        .add(&summary(1, "Canasta de Palma", "canasta-de-palma", "200.00"), 1);

    let err = state.place_order(&shipping_form()).await.unwrap_err();
    assert!(matches!(err, ApiError::Status { status: 502, .. }));

    // The cart was not cleared, so the customer can retry...
    assert_eq!(state.cart().count(), 1);

    // ...and the retry succeeds once the backend recovers
    fake.shop().fail_create_order = false;
    let order = state.place_order(&shipping_form()).await.unwrap();
    assert!(!order.order_number.is_empty());
    assert!(state.cart().is_empty());
}

#[tokio::test]
async fn shipping_is_free_above_the_threshold() {
    let fake = spawn_fake_api().await;
    let state = test_state(&fake);

    state
        .cart()
        .add(&summary(2, "Huipil Bordado", "huipil-bordado", "780.00"), 1);

    let order = state.place_order(&shipping_form()).await.unwrap();

    assert_eq!(order.shipping_cost, Decimal::ZERO);
    assert_eq!(order.total, Decimal::new(780, 0));
}

#[tokio::test]
async fn an_empty_cart_is_rejected_before_any_remote_call() {
    let fake = spawn_fake_api().await;
    let state = test_state(&fake);

    let err = state.place_order(&shipping_form()).await.unwrap_err();

    assert!(matches!(err, ApiError::Validation(_)));
    assert_eq!(fake.shop().order_calls, 0);
}

#[tokio::test]
async fn authenticated_checkout_lands_in_the_order_history() {
    let fake = spawn_fake_api().await;
    fake.shop()
        .seed_user("maria@example.com", "hunter2secret", "María", "López");
    let state = test_state(&fake);
    state.login("maria@example.com", "hunter2secret").await.unwrap();

    state
        .cart()
        .add(&summary(1, "Canasta de Palma", "canasta-de-palma", "200.00"), 2);
    let order = state.place_order(&shipping_form()).await.unwrap();

    let history = state.orders().list_orders(state.session()).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history.first().unwrap().order_number, order.order_number);
    // Two units of Q200: above the free-shipping threshold
    assert_eq!(order.total, Decimal::new(400, 0));

    // The order can be looked up by its number as well
    let looked_up = state
        .orders()
        .get_order(state.session(), &order.order_number)
        .await
        .unwrap();
    assert_eq!(looked_up.items.len(), 1);
    assert_eq!(looked_up.total, order.total);
}

#[tokio::test]
async fn guest_checkout_needs_no_session() {
    let fake = spawn_fake_api().await;
    let state = test_state(&fake);
    assert!(!state.session().is_authenticated());

    state
        .cart()
        .add(&summary(1, "Canasta de Palma", "canasta-de-palma", "200.00"), 1);

    let order = state.place_order(&shipping_form()).await.unwrap();
    assert!(!order.order_number.is_empty());
}
