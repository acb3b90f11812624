//! End-to-end startup tests: restoring, validating, and demoting persisted
//! sessions.

#![allow(clippy::unwrap_used)]

use alma_artesana_core::ProductId;
use alma_artesana_integration_tests::{spawn_fake_api, test_state, test_state_with_store};
use alma_artesana_storefront::bootstrap;
use alma_artesana_storefront::store::{StateStore, keys};

#[tokio::test]
async fn restart_with_a_valid_session_restores_user_and_wishlist() {
    let fake = spawn_fake_api().await;
    fake.shop()
        .seed_user("maria@example.com", "hunter2secret", "María", "López");

    // First run: log in, which persists the session
    let store = StateStore::in_memory();
    let first_run = test_state_with_store(&fake, store.clone());
    first_run.login("maria@example.com", "hunter2secret").await.unwrap();

    // A favorite lands on the remote wishlist while the app is "closed"
    {
        let mut shop = fake.shop();
        let product = shop.seed_product(3, "Colgante de Macramé", "colgante-de-macrame", "350.00");
        shop.seed_wishlist_entry(product);
    }

    // Second run over the same store
    let second_run = test_state_with_store(&fake, store);
    bootstrap::run(&second_run).await;

    assert_eq!(
        second_run.session().current_user().unwrap().email.as_str(),
        "maria@example.com"
    );
    assert!(second_run.wishlist().contains(ProductId::new(3)));
}

#[tokio::test]
async fn a_token_without_a_user_snapshot_refetches_the_profile() {
    let fake = spawn_fake_api().await;
    fake.shop()
        .seed_user("maria@example.com", "hunter2secret", "María", "López");

    let store = StateStore::in_memory();
    let first_run = test_state_with_store(&fake, store.clone());
    first_run.login("maria@example.com", "hunter2secret").await.unwrap();

    // The user snapshot goes missing but the tokens survive
    store.remove(keys::USER);

    let second_run = test_state_with_store(&fake, store.clone());
    assert!(second_run.session().current_user().is_none());

    bootstrap::run(&second_run).await;

    assert_eq!(
        second_run.session().current_user().unwrap().first_name,
        "María"
    );
    // The refetched snapshot was persisted again
    assert!(store.read::<serde_json::Value>(keys::USER).is_some());
}

#[tokio::test]
async fn an_invalid_persisted_token_demotes_to_anonymous() {
    let fake = spawn_fake_api().await;
    let store = StateStore::in_memory();
    store.write(keys::ACCESS_TOKEN, "stale-access");
    store.write(keys::REFRESH_TOKEN, "stale-refresh");

    let state = test_state_with_store(&fake, store.clone());
    assert!(state.session().is_authenticated());

    bootstrap::run(&state).await;

    // Silently demoted: no user, no tokens, nothing persisted
    assert!(!state.session().is_authenticated());
    assert!(state.session().current_user().is_none());
    assert!(store.read::<String>(keys::ACCESS_TOKEN).is_none());
    assert!(store.read::<String>(keys::REFRESH_TOKEN).is_none());
}

#[tokio::test]
async fn an_anonymous_start_makes_no_remote_calls() {
    let fake = spawn_fake_api().await;
    let state = test_state(&fake);

    bootstrap::run(&state).await;

    let shop = fake.shop();
    assert_eq!(shop.profile_calls, 0);
    assert_eq!(shop.wishlist_list_calls, 0);
}

#[tokio::test]
async fn a_malformed_cart_slot_degrades_to_an_empty_cart() {
    let fake = spawn_fake_api().await;
    let store = StateStore::in_memory();
    // Something that is not a list of line items landed in the cart slot
    store.write(keys::CART, "this is not a cart");

    let state = test_state_with_store(&fake, store);
    bootstrap::run(&state).await;

    assert!(state.cart().is_empty());
    assert_eq!(state.cart().count(), 0);
}
