//! Test support: an in-process fake of the remote Alma Artesana shop API.
//!
//! The fake serves the same endpoints, shapes, and status codes as the real
//! backend, over a real TCP socket, so the storefront client is exercised
//! end-to-end including its HTTP layer. Shared [`FakeShop`] state lets tests
//! inject failures (expired tokens, broken refresh, failing toggles) and
//! assert on call counters.

#![cfg_attr(not(test), forbid(unsafe_code))]
// Test support crate: panicking on broken fixtures is the desired behavior
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::missing_panics_doc)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use rust_decimal::Decimal;
use serde_json::{Value, json};

use alma_artesana_storefront::AppState;
use alma_artesana_storefront::config::StorefrontConfig;
use alma_artesana_storefront::store::StateStore;

type Shared = Arc<Mutex<FakeShop>>;

/// Mutable world state of the fake shop.
#[derive(Default)]
pub struct FakeShop {
    /// email -> (password, user payload)
    pub users: HashMap<String, (String, Value)>,
    /// Email of the customer the bearer tokens belong to.
    pub current_email: Option<String>,
    pub valid_access: HashSet<String>,
    pub valid_refresh: HashSet<String>,
    next_token: u32,
    next_user_id: i64,

    /// Remote wishlist: (entry id, product payload).
    pub wishlist: Vec<(i64, Value)>,
    next_entry_id: i64,

    pub orders: Vec<Value>,
    next_order: u32,

    pub products: Vec<Value>,

    // Failure injection
    pub fail_toggle: bool,
    pub fail_refresh: bool,
    pub fail_create_order: bool,
    pub fail_wishlist_delete: bool,
    /// Serve the wishlist as `{count, results}` instead of a bare array.
    pub paginate_wishlist: bool,

    // Call counters
    pub login_calls: u32,
    pub refresh_calls: u32,
    pub profile_calls: u32,
    pub wishlist_list_calls: u32,
    pub toggle_calls: u32,
    pub wishlist_delete_calls: u32,
    pub order_calls: u32,
}

impl FakeShop {
    /// Register a user and return its payload.
    pub fn seed_user(&mut self, email: &str, password: &str, first_name: &str, last_name: &str) {
        self.next_user_id += 1;
        let user = json!({
            "id": self.next_user_id,
            "username": email,
            "email": email,
            "first_name": first_name,
            "last_name": last_name,
            "full_name": format!("{first_name} {last_name}"),
            "profile": {
                "phone": "", "address": "", "address_line2": "",
                "city": "", "department": "", "postal_code": ""
            }
        });
        self.users
            .insert(email.to_owned(), (password.to_owned(), user));
    }

    /// Put a product into the catalog and return its summary payload.
    pub fn seed_product(&mut self, id: i64, name: &str, slug: &str, price: &str) -> Value {
        let product = json!({
            "id": id,
            "name": name,
            "slug": slug,
            "short_description": "",
            "price": price,
            "stock": 10,
            "in_stock": true,
            "primary_image": format!("https://cdn.almaartesana.gt/p/{id}.jpg"),
        });
        self.products.push(product.clone());
        product
    }

    /// Put an entry onto the remote wishlist, returning its entry id.
    pub fn seed_wishlist_entry(&mut self, product: Value) -> i64 {
        self.next_entry_id += 1;
        self.wishlist.push((self.next_entry_id, product));
        self.next_entry_id
    }

    /// Invalidate every issued access token (refresh tokens stay valid), as
    /// if they all just expired.
    pub fn expire_access_tokens(&mut self) {
        self.valid_access.clear();
    }

    fn mint_access(&mut self) -> String {
        self.next_token += 1;
        let token = format!("access-{}", self.next_token);
        self.valid_access.insert(token.clone());
        token
    }

    fn mint_refresh(&mut self) -> String {
        self.next_token += 1;
        let token = format!("refresh-{}", self.next_token);
        self.valid_refresh.insert(token.clone());
        token
    }

    fn current_user(&self) -> Option<Value> {
        let email = self.current_email.as_ref()?;
        self.users.get(email).map(|(_, user)| user.clone())
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        bearer_token(headers).is_some_and(|token| self.valid_access.contains(&token))
    }
}

/// Handle to a running fake API.
pub struct FakeApi {
    /// Base URL including the `/api` prefix.
    pub base_url: String,
    pub state: Shared,
}

impl FakeApi {
    /// Lock the world state.
    pub fn shop(&self) -> MutexGuard<'_, FakeShop> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Bind the fake API to an ephemeral local port and serve it in the
/// background for the rest of the test.
pub async fn spawn_fake_api() -> FakeApi {
    let state: Shared = Arc::new(Mutex::new(FakeShop::default()));

    let app = router(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fake API listener");
    let addr = listener.local_addr().expect("fake API local addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve fake API");
    });

    FakeApi {
        base_url: format!("http://{addr}/api"),
        state,
    }
}

/// Build an [`AppState`] over an in-memory store, pointed at the fake API.
pub fn test_state(fake: &FakeApi) -> AppState {
    let config = StorefrontConfig::for_base_url(&fake.base_url).expect("test config");
    AppState::with_store(config, StateStore::in_memory()).expect("test app state")
}

/// Build an [`AppState`] over an explicit store (to simulate restarts that
/// share persisted state).
pub fn test_state_with_store(fake: &FakeApi, store: StateStore) -> AppState {
    let config = StorefrontConfig::for_base_url(&fake.base_url).expect("test config");
    AppState::with_store(config, store).expect("test app state")
}

// =============================================================================
// Router
// =============================================================================

fn router(state: Shared) -> Router {
    Router::new()
        .route("/api/auth/register/", post(register))
        .route("/api/auth/login/", post(login))
        .route("/api/auth/refresh/", post(refresh))
        .route("/api/auth/profile/", get(get_profile).put(update_profile))
        .route("/api/auth/change-password/", post(change_password))
        .route("/api/wishlist/", get(list_wishlist))
        .route("/api/wishlist/toggle/", post(toggle_wishlist))
        .route("/api/wishlist/{id}/", delete(delete_wishlist_entry))
        .route("/api/orders/", get(list_orders))
        .route("/api/orders/create/", post(create_order))
        .route("/api/orders/{order_number}/", get(get_order))
        .route("/api/products/", get(list_products))
        .route("/api/products/{slug}/", get(get_product))
        .with_state(state)
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_owned)
}

fn unauthorized() -> (StatusCode, Json<Value>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"detail": "Las credenciales de autenticación no se proveyeron."})),
    )
}

fn lock(state: &Shared) -> MutexGuard<'_, FakeShop> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// Auth handlers
// =============================================================================

async fn register(State(state): State<Shared>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let mut shop = lock(&state);

    let email = body["email"].as_str().unwrap_or_default().to_owned();
    let password = body["password"].as_str().unwrap_or_default().to_owned();
    let confirm = body["password_confirm"].as_str().unwrap_or_default();

    if shop.users.contains_key(&email) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"email": ["Ya existe un usuario con este email."]})),
        );
    }
    if password != confirm {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"password_confirm": ["Las contraseñas no coinciden."]})),
        );
    }
    if password.len() < 8 {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"password": ["Esta contraseña es demasiado corta."]})),
        );
    }

    shop.seed_user(
        &email,
        &password,
        body["first_name"].as_str().unwrap_or_default(),
        body["last_name"].as_str().unwrap_or_default(),
    );
    shop.current_email = Some(email.clone());
    let user = shop
        .users
        .get(&email)
        .map(|(_, user)| user.clone())
        .unwrap_or_default();
    let access = shop.mint_access();
    let refresh = shop.mint_refresh();

    (
        StatusCode::CREATED,
        Json(json!({"user": user, "tokens": {"access": access, "refresh": refresh}})),
    )
}

async fn login(State(state): State<Shared>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let mut shop = lock(&state);
    shop.login_calls += 1;

    let username = body["username"].as_str().unwrap_or_default().to_owned();
    let password = body["password"].as_str().unwrap_or_default();

    let matches = shop
        .users
        .get(&username)
        .is_some_and(|(stored, _)| stored == password);
    if !matches {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "No active account found with the given credentials"})),
        );
    }

    shop.current_email = Some(username);
    let access = shop.mint_access();
    let refresh = shop.mint_refresh();
    (
        StatusCode::OK,
        Json(json!({"access": access, "refresh": refresh})),
    )
}

async fn refresh(State(state): State<Shared>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let mut shop = lock(&state);
    shop.refresh_calls += 1;

    let token = body["refresh"].as_str().unwrap_or_default().to_owned();
    if shop.fail_refresh || !shop.valid_refresh.contains(&token) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Token is invalid or expired", "code": "token_not_valid"})),
        );
    }

    let access = shop.mint_access();
    (StatusCode::OK, Json(json!({"access": access})))
}

async fn get_profile(State(state): State<Shared>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    let mut shop = lock(&state);
    shop.profile_calls += 1;

    if !shop.authorized(&headers) {
        return unauthorized();
    }
    match shop.current_user() {
        Some(user) => (StatusCode::OK, Json(user)),
        None => unauthorized(),
    }
}

async fn update_profile(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut shop = lock(&state);
    if !shop.authorized(&headers) {
        return unauthorized();
    }

    let Some(email) = shop.current_email.clone() else {
        return unauthorized();
    };
    let Some((_, user)) = shop.users.get_mut(&email) else {
        return unauthorized();
    };

    for field in ["first_name", "last_name", "email"] {
        if let Some(value) = body.get(field) {
            user[field] = value.clone();
        }
    }
    for field in [
        "phone",
        "address",
        "address_line2",
        "city",
        "department",
        "postal_code",
    ] {
        if let Some(value) = body.get(field) {
            user["profile"][field] = value.clone();
        }
    }

    (StatusCode::OK, Json(user.clone()))
}

async fn change_password(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut shop = lock(&state);
    if !shop.authorized(&headers) {
        return unauthorized();
    }

    let Some(email) = shop.current_email.clone() else {
        return unauthorized();
    };
    let current = body["current_password"].as_str().unwrap_or_default();
    let new = body["new_password"].as_str().unwrap_or_default().to_owned();

    let Some((password, _)) = shop.users.get_mut(&email) else {
        return unauthorized();
    };
    if password.as_str() != current {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"current_password": ["La contraseña actual es incorrecta."]})),
        );
    }

    *password = new;
    (
        StatusCode::OK,
        Json(json!({"message": "Contraseña actualizada exitosamente"})),
    )
}

// =============================================================================
// Wishlist handlers
// =============================================================================

async fn list_wishlist(State(state): State<Shared>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    let mut shop = lock(&state);
    shop.wishlist_list_calls += 1;

    if !shop.authorized(&headers) {
        return unauthorized();
    }

    let entries: Vec<Value> = shop
        .wishlist
        .iter()
        .map(|(id, product)| json!({"id": id, "product": product}))
        .collect();

    let body = if shop.paginate_wishlist {
        json!({"count": entries.len(), "results": entries})
    } else {
        Value::Array(entries)
    };
    (StatusCode::OK, Json(body))
}

async fn toggle_wishlist(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut shop = lock(&state);
    shop.toggle_calls += 1;

    if !shop.authorized(&headers) {
        return unauthorized();
    }
    if shop.fail_toggle {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"detail": "wishlist backend unavailable"})),
        );
    }

    let product_id = body["product_id"].as_i64().unwrap_or_default();
    let existing = shop
        .wishlist
        .iter()
        .position(|(_, product)| product["id"].as_i64() == Some(product_id));

    match existing {
        Some(index) => {
            shop.wishlist.remove(index);
            (
                StatusCode::OK,
                Json(json!({"action": "removed", "in_wishlist": false})),
            )
        }
        None => {
            let product = shop
                .products
                .iter()
                .find(|p| p["id"].as_i64() == Some(product_id))
                .cloned()
                .unwrap_or_else(|| {
                    json!({
                        "id": product_id,
                        "name": format!("Producto {product_id}"),
                        "slug": format!("producto-{product_id}"),
                        "price": "100.00",
                    })
                });
            shop.next_entry_id += 1;
            let entry_id = shop.next_entry_id;
            shop.wishlist.push((entry_id, product));
            (
                StatusCode::OK,
                Json(json!({"action": "added", "in_wishlist": true})),
            )
        }
    }
}

async fn delete_wishlist_entry(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> StatusCode {
    let mut shop = lock(&state);
    shop.wishlist_delete_calls += 1;

    if !shop.authorized(&headers) {
        return StatusCode::UNAUTHORIZED;
    }
    if shop.fail_wishlist_delete {
        return StatusCode::INTERNAL_SERVER_ERROR;
    }

    let before = shop.wishlist.len();
    shop.wishlist.retain(|(entry_id, _)| *entry_id != id);
    if shop.wishlist.len() == before {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::NO_CONTENT
    }
}

// =============================================================================
// Order handlers
// =============================================================================

async fn create_order(State(state): State<Shared>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let mut shop = lock(&state);
    shop.order_calls += 1;

    if shop.fail_create_order {
        return (
            StatusCode::BAD_GATEWAY,
            Json(json!({"detail": "order backend unavailable"})),
        );
    }

    let empty = Vec::new();
    let items = body["items"].as_array().unwrap_or(&empty);
    let mut subtotal = Decimal::ZERO;
    let mut order_items = Vec::new();
    for item in items {
        let price: Decimal = item["price"]
            .as_str()
            .unwrap_or("0")
            .parse()
            .unwrap_or_default();
        let quantity = item["quantity"].as_u64().unwrap_or(0);
        let line = price * Decimal::from(quantity);
        subtotal += line;
        order_items.push(json!({
            "product_name": item["name"],
            "product_price": price.to_string(),
            "quantity": quantity,
            "subtotal": line.to_string(),
        }));
    }

    let shipping = if subtotal >= Decimal::from(500u32) {
        Decimal::ZERO
    } else {
        Decimal::from(35u32)
    };
    let total = subtotal + shipping;

    shop.next_order += 1;
    let order = json!({
        "order_number": format!("AA-2026-{:05}", shop.next_order),
        "email": body["email"],
        "first_name": body["first_name"],
        "last_name": body["last_name"],
        "subtotal": subtotal.to_string(),
        "shipping_cost": shipping.to_string(),
        "total": total.to_string(),
        "status": "pending",
        "status_display": "Pendiente",
        "payment_method": body["payment_method"],
        "is_paid": false,
        "items": order_items,
        "created_at": "2026-08-07T12:00:00Z",
    });
    shop.orders.push(order.clone());

    (
        StatusCode::CREATED,
        Json(json!({"order": order, "message": "Orden creada exitosamente"})),
    )
}

async fn list_orders(State(state): State<Shared>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    let shop = lock(&state);
    if !shop.authorized(&headers) {
        return unauthorized();
    }
    (
        StatusCode::OK,
        Json(json!({"count": shop.orders.len(), "results": shop.orders})),
    )
}

async fn get_order(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(order_number): Path<String>,
) -> (StatusCode, Json<Value>) {
    let shop = lock(&state);
    if !shop.authorized(&headers) {
        return unauthorized();
    }
    match shop
        .orders
        .iter()
        .find(|order| order["order_number"].as_str() == Some(order_number.as_str()))
    {
        Some(order) => (StatusCode::OK, Json(order.clone())),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"detail": "No encontrado."})),
        ),
    }
}

// =============================================================================
// Catalog handlers
// =============================================================================

async fn list_products(State(state): State<Shared>) -> Json<Value> {
    let shop = lock(&state);
    Json(Value::Array(shop.products.clone()))
}

async fn get_product(
    State(state): State<Shared>,
    Path(slug): Path<String>,
) -> (StatusCode, Json<Value>) {
    let shop = lock(&state);
    match shop
        .products
        .iter()
        .find(|p| p["slug"].as_str() == Some(slug.as_str()))
    {
        Some(product) => {
            let mut detail = product.clone();
            detail["description"] = json!("Hecho a mano en Guatemala.");
            detail["images"] = json!([]);
            (StatusCode::OK, Json(detail))
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"detail": "No encontrado."})),
        ),
    }
}
