//! Wishlist entry type.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::product::ProductSummary;

/// One favorited product, in the local shape.
///
/// Identity is the `product_id`. When an entry originates from the remote
/// wishlist it also has a remote entry id there, but that id is deliberately
/// not carried here: remote deletions re-resolve it against a fresh fetch, so
/// the local shape stays identical whether the entry was created locally or
/// merged from the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishlistEntry {
    pub product_id: ProductId,
    pub name: String,
    pub slug: String,
    pub price: Decimal,
    #[serde(default)]
    pub image: Option<String>,
}

impl From<&ProductSummary> for WishlistEntry {
    fn from(product: &ProductSummary) -> Self {
        Self {
            product_id: product.id,
            name: product.name.clone(),
            slug: product.slug.clone(),
            price: product.price,
            image: product.primary_image.clone(),
        }
    }
}
