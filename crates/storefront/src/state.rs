//! Application state shared across surfaces.
//!
//! The storefront deliberately has no ambient globals: everything the
//! original shop kept in top-level application state (cart, wishlist,
//! session) lives here and is passed down explicitly. The struct is cheaply
//! cloneable via `Arc`.

use std::sync::Arc;

use tracing::instrument;

use crate::api::types::{Order, OrderItemPayload};
use crate::api::{ApiClient, ApiError, CatalogClient, FieldErrors, OrdersClient};
use crate::cart::Cart;
use crate::checkout::CheckoutForm;
use crate::config::StorefrontConfig;
use crate::session::SessionManager;
use crate::store::{StateStore, StoreError};
use crate::wishlist::Wishlist;

/// Error creating the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateInitError {
    /// The durable state directory could not be opened.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Application state shared across all surfaces.
///
/// Owns the persisted store, the session, the cart, the wishlist, and the
/// API clients. Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    store: StateStore,
    catalog: CatalogClient,
    orders: OrdersClient,
    session: SessionManager,
    cart: Cart,
    wishlist: Wishlist,
}

impl AppState {
    /// Create the application state with a file-backed store under the
    /// configured data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be created or the HTTP
    /// client cannot be constructed.
    pub fn new(config: StorefrontConfig) -> Result<Self, StateInitError> {
        let store = StateStore::open(&config.data_dir)?;
        Self::with_store(config, store)
    }

    /// Create the application state over an explicit store (e.g. an
    /// in-memory one for tests).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn with_store(
        config: StorefrontConfig,
        store: StateStore,
    ) -> Result<Self, StateInitError> {
        let api = ApiClient::new(&config)?;
        let catalog = CatalogClient::new(api.clone());
        let orders = OrdersClient::new(api.clone());
        let session = SessionManager::new(api, store.clone());
        let cart = Cart::load(&store);
        let wishlist = Wishlist::load(&store);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                catalog,
                orders,
                session,
                cart,
                wishlist,
            }),
        })
    }

    /// Get a reference to the configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the durable state store.
    #[must_use]
    pub fn store(&self) -> &StateStore {
        &self.inner.store
    }

    /// Get a reference to the catalog client.
    #[must_use]
    pub fn catalog(&self) -> &CatalogClient {
        &self.inner.catalog
    }

    /// Get a reference to the orders client.
    #[must_use]
    pub fn orders(&self) -> &OrdersClient {
        &self.inner.orders
    }

    /// Get a reference to the session manager.
    #[must_use]
    pub fn session(&self) -> &SessionManager {
        &self.inner.session
    }

    /// Get a reference to the cart aggregate.
    #[must_use]
    pub fn cart(&self) -> &Cart {
        &self.inner.cart
    }

    /// Get a reference to the wishlist synchronizer.
    #[must_use]
    pub fn wishlist(&self) -> &Wishlist {
        &self.inner.wishlist
    }

    // =========================================================================
    // Flows spanning components
    // =========================================================================

    /// Log in and pull the remote wishlist for the now-active session.
    ///
    /// # Errors
    ///
    /// See [`SessionManager::login`]; wishlist hydration failures are
    /// contained there and never surface here.
    pub async fn login(&self, email: &str, password: &str) -> Result<crate::session::Session, ApiError> {
        let session = self.inner.session.login(email, password).await?;
        self.inner
            .wishlist
            .hydrate_from_remote(&self.inner.session)
            .await;
        Ok(session)
    }

    /// Register and pull the remote wishlist for the now-active session.
    ///
    /// # Errors
    ///
    /// See [`SessionManager::register`].
    pub async fn register(
        &self,
        form: &crate::api::types::RegisterForm,
    ) -> Result<crate::session::Session, ApiError> {
        let session = self.inner.session.register(form).await?;
        self.inner
            .wishlist
            .hydrate_from_remote(&self.inner.session)
            .await;
        Ok(session)
    }

    /// Submit the cart as an order.
    ///
    /// Snapshots the cart into order lines, submits them with the checkout
    /// form, and clears the cart only once the server has accepted the order.
    /// On failure the cart is left intact so the customer can retry.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty cart, or any `ApiError` from
    /// the order submission.
    #[instrument(skip(self, form))]
    pub async fn place_order(&self, form: &CheckoutForm) -> Result<Order, ApiError> {
        let items: Vec<OrderItemPayload> = self
            .inner
            .cart
            .items()
            .into_iter()
            .map(|line| OrderItemPayload {
                product_id: line.product_id,
                name: line.name,
                price: line.price,
                quantity: line.quantity,
            })
            .collect();

        if items.is_empty() {
            return Err(ApiError::Validation(FieldErrors::single(
                "items",
                "the cart is empty",
            )));
        }

        let order = self
            .inner
            .orders
            .create_order(&self.inner.session, form, &items)
            .await?;

        self.inner.cart.clear();

        Ok(order)
    }
}
