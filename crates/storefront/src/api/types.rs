//! Wire types for the shop API.
//!
//! Request and response shapes exactly as the remote serves them. Local
//! domain types live in `alma-artesana-core`; conversions happen at the call
//! sites that own the semantics (e.g., the wishlist synchronizer decides what
//! to do with a remote entry whose product payload is missing an id).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use alma_artesana_core::{ProductId, User, WishlistEntryId};

// =============================================================================
// Auth
// =============================================================================

/// Access/refresh token pair issued by login and register.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Login request body. The shop API logs in with the email as username.
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Refresh request body.
#[derive(Debug, Serialize)]
pub struct RefreshRequest<'a> {
    pub refresh: &'a str,
}

/// Refresh response: a freshly rotated access token.
#[derive(Debug, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
}

/// Registration form.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    pub first_name: String,
    pub last_name: String,
}

/// Registration response: the created user plus a token pair.
#[derive(Debug, Deserialize)]
pub struct RegisterResponse {
    pub user: User,
    pub tokens: TokenPair,
}

/// Change-password request body.
#[derive(Debug, Serialize)]
pub struct ChangePasswordRequest<'a> {
    pub current_password: &'a str,
    pub new_password: &'a str,
}

/// Profile update. Only the set fields are sent.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_line2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
}

// =============================================================================
// Wishlist
// =============================================================================

/// One entry of the remote wishlist.
///
/// `id` addresses the entry for deletion and lives in a different value space
/// than the embedded product's id.
#[derive(Debug, Deserialize)]
pub struct RemoteWishlistEntry {
    pub id: WishlistEntryId,
    #[serde(default)]
    pub product: Option<RemoteWishlistProduct>,
}

/// The product payload embedded in a remote wishlist entry.
///
/// Tolerant shape: entries whose payload is missing an id are discarded
/// during hydration rather than failing the whole fetch.
#[derive(Debug, Deserialize)]
pub struct RemoteWishlistProduct {
    #[serde(default)]
    pub id: Option<ProductId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub price: Decimal,
    #[serde(default)]
    pub primary_image: Option<String>,
}

/// Toggle request body.
#[derive(Debug, Serialize)]
pub struct ToggleRequest {
    pub product_id: ProductId,
}

/// Toggle acknowledgement from the server.
#[derive(Debug, Deserialize)]
pub struct ToggleResponse {
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub in_wishlist: bool,
}

// =============================================================================
// Orders
// =============================================================================

/// One item of an order creation request.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItemPayload {
    pub product_id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub quantity: u32,
}

/// One item of an order as the server returns it.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderItem {
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub product_price: Decimal,
    #[serde(default)]
    pub quantity: u32,
    #[serde(default)]
    pub subtotal: Decimal,
}

/// An order as the server returns it.
#[derive(Debug, Clone, Deserialize)]
pub struct Order {
    pub order_number: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub subtotal: Decimal,
    #[serde(default)]
    pub shipping_cost: Decimal,
    #[serde(default)]
    pub total: Decimal,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub status_display: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub is_paid: bool,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Response of the order creation endpoint.
#[derive(Debug, Deserialize)]
pub struct CreateOrderResponse {
    pub order: Order,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_wishlist_entry_tolerates_missing_product_id() {
        let json = r#"{"id": 41, "product": {"name": "sin id", "slug": "", "price": "10.00"}}"#;
        let entry: RemoteWishlistEntry = serde_json::from_str(json).unwrap();
        assert!(entry.product.unwrap().id.is_none());
    }

    #[test]
    fn test_order_response_decodes() {
        let json = r#"{
            "order": {
                "order_number": "AA-2026-00017",
                "email": "ana@example.com",
                "subtotal": "200.00",
                "shipping_cost": "35.00",
                "total": "235.00",
                "status": "pending",
                "items": [
                    {"product_name": "Canasta", "product_price": "200.00", "quantity": 1, "subtotal": "200.00"}
                ],
                "created_at": "2026-08-01T12:30:00Z"
            },
            "message": "Orden creada exitosamente"
        }"#;

        let response: CreateOrderResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.order.order_number, "AA-2026-00017");
        assert_eq!(response.order.items.len(), 1);
        assert_eq!(response.order.total, "235.00".parse().unwrap());
    }

    #[test]
    fn test_profile_update_skips_unset_fields() {
        let update = ProfileUpdate {
            city: Some("Antigua".to_owned()),
            ..ProfileUpdate::default()
        };
        let json = serde_json::to_string(&update).unwrap();
        assert_eq!(json, r#"{"city":"Antigua"}"#);
    }
}
