//! Orders client: creation and history.
//!
//! Order creation allows guest checkout, so it rides the anonymous transport
//! unless a session is active; history is account-scoped and always goes
//! through the authenticated transport. Nothing here is cached - orders are
//! mutable state.

use std::sync::Arc;

use reqwest::Method;
use serde::Serialize;
use tracing::instrument;

use super::types::{CreateOrderResponse, Order, OrderItemPayload};
use super::{ApiClient, ApiError, Paged};
use crate::checkout::CheckoutForm;
use crate::session::SessionManager;

/// Client for the order endpoints.
#[derive(Clone)]
pub struct OrdersClient {
    inner: Arc<OrdersClientInner>,
}

struct OrdersClientInner {
    api: ApiClient,
}

/// Order creation body: the checkout form fields plus the cart lines.
#[derive(Serialize)]
struct CreateOrderRequest<'a> {
    #[serde(flatten)]
    form: &'a CheckoutForm,
    items: &'a [OrderItemPayload],
}

impl OrdersClient {
    /// Create a new orders client sharing the given transport.
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self {
            inner: Arc::new(OrdersClientInner { api }),
        }
    }

    /// Create an order from the checkout form and cart lines.
    ///
    /// Guest checkout is allowed: with no active session the request is sent
    /// anonymously; with one, it is sent through the authenticated transport
    /// so the order lands in the customer's history.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects the order;
    /// the caller must keep the cart intact in that case so the customer can
    /// retry.
    #[instrument(skip(self, session, form, items), fields(item_count = items.len()))]
    pub async fn create_order(
        &self,
        session: &SessionManager,
        form: &CheckoutForm,
        items: &[OrderItemPayload],
    ) -> Result<Order, ApiError> {
        let body = CreateOrderRequest { form, items };

        let response: CreateOrderResponse = if session.is_authenticated() {
            session
                .send(Method::POST, "/orders/create/", Some(&body))
                .await?
        } else {
            let builder = self
                .inner
                .api
                .build(Method::POST, "/orders/create/", Some(&body), None);
            self.inner.api.execute(builder).await?
        };

        Ok(response.order)
    }

    /// The customer's order history, newest first as served by the API.
    ///
    /// # Errors
    ///
    /// Returns an error if no session is active or the request fails.
    #[instrument(skip(self, session))]
    pub async fn list_orders(&self, session: &SessionManager) -> Result<Vec<Order>, ApiError> {
        let page: Paged<Order> = session.send(Method::GET, "/orders/", None::<&()>).await?;
        Ok(page.into_results())
    }

    /// Look up one order by its order number.
    ///
    /// # Errors
    ///
    /// Returns an error if no session is active, the order does not exist, or
    /// the request fails.
    #[instrument(skip(self, session), fields(order_number = %order_number))]
    pub async fn get_order(
        &self,
        session: &SessionManager,
        order_number: &str,
    ) -> Result<Order, ApiError> {
        session
            .send(
                Method::GET,
                &format!("/orders/{order_number}/"),
                None::<&()>,
            )
            .await
    }
}
