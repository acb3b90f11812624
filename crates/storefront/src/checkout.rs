//! Checkout form and shipping quote.
//!
//! Payments are simulated throughout the shop - the payment method is
//! recorded on the order but nothing is ever charged. The server computes the
//! authoritative totals at order creation; the quote here exists so the
//! checkout summary can show the same numbers before submitting.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Subtotal at or above which shipping is free, in quetzales.
pub const FREE_SHIPPING_THRESHOLD: Decimal = Decimal::from_parts(500, 0, 0, false, 0);

/// Flat shipping rate below the threshold, in quetzales.
pub const FLAT_SHIPPING_RATE: Decimal = Decimal::from_parts(35, 0, 0, false, 0);

/// How the customer intends to pay. Recorded only - never charged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Credit or debit card.
    #[default]
    Card,
    /// Bank transfer.
    Transfer,
    /// Cash on delivery.
    Cash,
}

/// Contact and shipping details collected at checkout.
///
/// Serialized field-for-field into the order creation request.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckoutForm {
    pub email: String,
    pub phone: String,
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub address_line2: String,
    pub city: String,
    pub department: String,
    pub postal_code: String,
    pub payment_method: PaymentMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Shipping cost for a cart subtotal: free at or above the threshold,
/// otherwise the flat rate.
#[must_use]
pub fn shipping_cost(subtotal: Decimal) -> Decimal {
    if subtotal >= FREE_SHIPPING_THRESHOLD {
        Decimal::ZERO
    } else {
        FLAT_SHIPPING_RATE
    }
}

/// Order total for a cart subtotal, shipping included.
#[must_use]
pub fn order_total(subtotal: Decimal) -> Decimal {
    subtotal + shipping_cost(subtotal)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shipping_is_flat_below_threshold() {
        assert_eq!(shipping_cost(Decimal::new(499, 0)), FLAT_SHIPPING_RATE);
        assert_eq!(order_total(Decimal::new(200, 0)), Decimal::new(235, 0));
    }

    #[test]
    fn test_shipping_is_free_at_threshold() {
        assert_eq!(shipping_cost(Decimal::new(500, 0)), Decimal::ZERO);
        assert_eq!(shipping_cost(Decimal::new(1200, 0)), Decimal::ZERO);
    }

    #[test]
    fn test_payment_method_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&PaymentMethod::Transfer).unwrap(),
            "\"transfer\""
        );
    }

    #[test]
    fn test_form_serializes_api_field_names() {
        let form = CheckoutForm {
            email: "ana@example.com".into(),
            phone: "+502 5555-0000".into(),
            first_name: "Ana".into(),
            last_name: "García".into(),
            address: "4a Calle 12-45".into(),
            city: "Guatemala".into(),
            department: "Guatemala".into(),
            ..CheckoutForm::default()
        };

        let value = serde_json::to_value(&form).unwrap();
        assert_eq!(value["first_name"], "Ana");
        assert_eq!(value["payment_method"], "card");
        assert_eq!(value["address_line2"], "");
        assert!(value.get("notes").is_none());
    }
}
