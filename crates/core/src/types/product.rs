//! Product and category types as served by the remote shop API.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{CategoryId, ProductId};

/// Lightweight product shape used in listings, search results, and as the
/// embedded product payload of cart and wishlist entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductSummary {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub short_description: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub original_price: Option<Decimal>,
    #[serde(default)]
    pub discount_percentage: Option<u32>,
    #[serde(default)]
    pub category: Option<CategoryId>,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub category_slug: Option<String>,
    #[serde(default)]
    pub badge: Option<String>,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub in_stock: bool,
    #[serde(default)]
    pub primary_image: Option<String>,
    #[serde(default)]
    pub is_featured: bool,
}

/// Full product shape served by the product detail endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductDetail {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub short_description: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub original_price: Option<Decimal>,
    #[serde(default)]
    pub discount_percentage: Option<u32>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub badge: Option<String>,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub in_stock: bool,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub artisan_name: Option<String>,
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub materials: Option<String>,
    #[serde(default)]
    pub dimensions: Option<String>,
    #[serde(default)]
    pub weight: Option<String>,
    #[serde(default)]
    pub images: Vec<ProductImage>,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ProductDetail {
    /// Reduce to the listing shape used by the cart and wishlist.
    #[must_use]
    pub fn summary(&self) -> ProductSummary {
        ProductSummary {
            id: self.id,
            name: self.name.clone(),
            slug: self.slug.clone(),
            short_description: self.short_description.clone(),
            price: self.price,
            original_price: self.original_price,
            discount_percentage: self.discount_percentage,
            category: self.category.as_ref().map(|c| c.id),
            category_name: self.category.as_ref().map(|c| c.name.clone()),
            category_slug: self.category.as_ref().map(|c| c.slug.clone()),
            badge: self.badge.clone(),
            stock: self.stock,
            in_stock: self.in_stock,
            primary_image: self
                .images
                .iter()
                .find(|img| img.is_primary)
                .or_else(|| self.images.first())
                .and_then(|img| img.image_url.clone()),
            is_featured: self.is_featured,
        }
    }
}

/// A product category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub product_count: u64,
    #[serde(default)]
    pub is_active: bool,
}

/// One image attached to a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductImage {
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub alt_text: Option<String>,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default)]
    pub order: i64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_deserializes_listing_payload() {
        // Shape produced by the shop's product list endpoint
        let json = r#"{
            "id": 3,
            "name": "Colgante de Macramé",
            "slug": "colgante-de-macrame",
            "short_description": "Tejido a mano",
            "price": "350.00",
            "original_price": "425.00",
            "discount_percentage": 18,
            "category": 1,
            "category_name": "Macramé",
            "category_slug": "macrame",
            "badge": "sale",
            "stock": 4,
            "in_stock": true,
            "primary_image": "https://cdn.almaartesana.gt/p/3.jpg",
            "is_featured": false
        }"#;

        let product: ProductSummary = serde_json::from_str(json).unwrap();
        assert_eq!(product.id, ProductId::new(3));
        assert_eq!(product.price, "350.00".parse().unwrap());
        assert_eq!(product.category_slug.as_deref(), Some("macrame"));
    }

    #[test]
    fn test_summary_tolerates_sparse_payload() {
        // Embedded product payloads (wishlist entries) omit most fields
        let json = r#"{"id": 9, "name": "Huipil", "slug": "huipil", "price": "780.00"}"#;
        let product: ProductSummary = serde_json::from_str(json).unwrap();
        assert!(product.primary_image.is_none());
        assert!(!product.in_stock);
    }

    #[test]
    fn test_detail_summary_prefers_primary_image() {
        let detail = ProductDetail {
            id: ProductId::new(1),
            name: "Canasta".into(),
            slug: "canasta".into(),
            description: String::new(),
            short_description: None,
            price: Decimal::new(200, 0),
            original_price: None,
            discount_percentage: None,
            category: None,
            badge: None,
            stock: 1,
            in_stock: true,
            sku: None,
            artisan_name: None,
            origin: None,
            materials: None,
            dimensions: None,
            weight: None,
            images: vec![
                ProductImage {
                    image_url: Some("second.jpg".into()),
                    alt_text: None,
                    is_primary: false,
                    order: 1,
                },
                ProductImage {
                    image_url: Some("primary.jpg".into()),
                    alt_text: None,
                    is_primary: true,
                    order: 0,
                },
            ],
            is_featured: false,
            created_at: None,
            updated_at: None,
        };

        assert_eq!(detail.summary().primary_image.as_deref(), Some("primary.jpg"));
    }
}
