//! Cart line item type.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::product::ProductSummary;

/// One line of the shopping cart: a product plus the quantity ordered.
///
/// Identity is the `product_id` - a cart never holds two lines for the same
/// product, and a quantity is always at least 1 (decrementing to zero removes
/// the line instead).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: ProductId,
    pub name: String,
    pub slug: String,
    pub price: Decimal,
    pub quantity: u32,
    #[serde(default)]
    pub image: Option<String>,
}

impl LineItem {
    /// Build a line for `quantity` units of `product`.
    #[must_use]
    pub fn new(product: &ProductSummary, quantity: u32) -> Self {
        Self {
            product_id: product.id,
            name: product.name.clone(),
            slug: product.slug.clone(),
            price: product.price,
            quantity,
            image: product.primary_image.clone(),
        }
    }

    /// Price of this line: unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_line_total() {
        let item = LineItem {
            product_id: ProductId::new(1),
            name: "Bolsa tejida".into(),
            slug: "bolsa-tejida".into(),
            price: "125.50".parse().unwrap(),
            quantity: 3,
            image: None,
        };
        assert_eq!(item.line_total(), "376.50".parse::<Decimal>().unwrap());
    }
}
