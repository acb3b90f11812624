//! Catalog client: products and categories.
//!
//! Read-only passthrough to the public product endpoints. Filtering, search,
//! and ordering are server concerns - this client just forwards the
//! parameters. Responses are cached for 5 minutes; search queries are not
//! cached.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::Method;
use rust_decimal::Decimal;
use tracing::{debug, instrument};

use alma_artesana_core::{Category, ProductDetail, ProductSummary};

use super::{ApiClient, ApiError, Paged};

/// Query parameters accepted by the product list endpoint.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Category slug.
    pub category: Option<String>,
    /// Free-text search query.
    pub search: Option<String>,
    /// Badge filter (e.g. `new`, `sale`).
    pub badge: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub in_stock: Option<bool>,
    pub featured: Option<bool>,
    /// Ordering key, e.g. `price` or `-price`.
    pub ordering: Option<String>,
}

impl ProductFilter {
    fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(v) = &self.category {
            query.push(("category", v.clone()));
        }
        if let Some(v) = &self.search {
            query.push(("search", v.clone()));
        }
        if let Some(v) = &self.badge {
            query.push(("badge", v.clone()));
        }
        if let Some(v) = self.min_price {
            query.push(("min_price", v.to_string()));
        }
        if let Some(v) = self.max_price {
            query.push(("max_price", v.to_string()));
        }
        if let Some(v) = self.in_stock {
            query.push(("in_stock", v.to_string()));
        }
        if let Some(v) = self.featured {
            query.push(("featured", v.to_string()));
        }
        if let Some(v) = &self.ordering {
            query.push(("ordering", v.clone()));
        }
        query
    }

    fn cache_key(&self) -> String {
        format!(
            "products:{}:{}:{}:{}:{}:{}:{}",
            self.category.as_deref().unwrap_or(""),
            self.badge.as_deref().unwrap_or(""),
            self.min_price.map(|v| v.to_string()).unwrap_or_default(),
            self.max_price.map(|v| v.to_string()).unwrap_or_default(),
            self.in_stock.map(|v| v.to_string()).unwrap_or_default(),
            self.featured.map(|v| v.to_string()).unwrap_or_default(),
            self.ordering.as_deref().unwrap_or(""),
        )
    }
}

/// Cached catalog responses.
#[derive(Clone)]
enum CacheValue {
    Product(Box<ProductDetail>),
    Products(Vec<ProductSummary>),
    Categories(Vec<Category>),
}

/// Client for the public catalog endpoints.
///
/// Products and categories are cached for 5 minutes.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    api: ApiClient,
    cache: Cache<String, CacheValue>,
}

impl CatalogClient {
    /// Create a new catalog client sharing the given transport.
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self {
            inner: Arc::new(CatalogClientInner { api, cache }),
        }
    }

    /// List products matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, filter))]
    pub async fn list_products(
        &self,
        filter: &ProductFilter,
    ) -> Result<Vec<ProductSummary>, ApiError> {
        let cache_key = filter.cache_key();

        // Check cache (never for search queries)
        if filter.search.is_none()
            && let Some(CacheValue::Products(products)) = self.inner.cache.get(&cache_key).await
        {
            debug!("cache hit for products");
            return Ok(products);
        }

        let builder = self
            .inner
            .api
            .request(Method::GET, "/products/")
            .query(&filter.to_query());
        let page: Paged<ProductSummary> = self.inner.api.execute(builder).await?;
        let products = page.into_results();

        if filter.search.is_none() {
            self.inner
                .cache
                .insert(cache_key, CacheValue::Products(products.clone()))
                .await;
        }

        Ok(products)
    }

    /// Get a product by its slug.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found or the API request fails.
    #[instrument(skip(self), fields(slug = %slug))]
    pub async fn get_product(&self, slug: &str) -> Result<ProductDetail, ApiError> {
        let cache_key = format!("product:{slug}");

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("cache hit for product");
            return Ok(*product);
        }

        let builder = self
            .inner
            .api
            .request(Method::GET, &format!("/products/{slug}/"));
        let product: ProductDetail = self.inner.api.execute(builder).await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Curated featured products.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn featured(&self) -> Result<Vec<ProductSummary>, ApiError> {
        self.product_collection("/products/featured/").await
    }

    /// Newest products.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn new_arrivals(&self) -> Result<Vec<ProductSummary>, ApiError> {
        self.product_collection("/products/new_arrivals/").await
    }

    /// Discounted products.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn on_sale(&self) -> Result<Vec<ProductSummary>, ApiError> {
        self.product_collection("/products/on_sale/").await
    }

    /// List all categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        let cache_key = "categories".to_owned();

        if let Some(CacheValue::Categories(categories)) = self.inner.cache.get(&cache_key).await {
            debug!("cache hit for categories");
            return Ok(categories);
        }

        let builder = self.inner.api.request(Method::GET, "/categories/");
        let page: Paged<Category> = self.inner.api.execute(builder).await?;
        let categories = page.into_results();

        self.inner
            .cache
            .insert(cache_key, CacheValue::Categories(categories.clone()))
            .await;

        Ok(categories)
    }

    /// List the products in one category.
    ///
    /// # Errors
    ///
    /// Returns an error if the category is not found or the API request fails.
    #[instrument(skip(self), fields(slug = %slug))]
    pub async fn category_products(&self, slug: &str) -> Result<Vec<ProductSummary>, ApiError> {
        self.product_collection(&format!("/categories/{slug}/products/"))
            .await
    }

    /// Shared fetch-and-cache path for unparameterized product collections.
    async fn product_collection(&self, path: &str) -> Result<Vec<ProductSummary>, ApiError> {
        let cache_key = format!("collection:{path}");

        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&cache_key).await {
            debug!("cache hit for product collection");
            return Ok(products);
        }

        let builder = self.inner.api.request(Method::GET, path);
        let page: Paged<ProductSummary> = self.inner.api.execute(builder).await?;
        let products = page.into_results();

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    /// Invalidate all cached catalog data.
    pub async fn invalidate_all(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_query_passthrough() {
        let filter = ProductFilter {
            category: Some("macrame".into()),
            search: Some("colgante".into()),
            min_price: Some(Decimal::new(100, 0)),
            ordering: Some("-price".into()),
            ..ProductFilter::default()
        };

        let query = filter.to_query();
        assert!(query.contains(&("category", "macrame".to_string())));
        assert!(query.contains(&("search", "colgante".to_string())));
        assert!(query.contains(&("min_price", "100".to_string())));
        assert!(query.contains(&("ordering", "-price".to_string())));
    }

    #[test]
    fn test_cache_key_ignores_search() {
        // Search results bypass the cache entirely, so two filters differing
        // only by search share a key without ever colliding in practice.
        let base = ProductFilter {
            category: Some("textiles".into()),
            ..ProductFilter::default()
        };
        let with_search = ProductFilter {
            search: Some("huipil".into()),
            ..base.clone()
        };
        assert_eq!(base.cache_key(), with_search.cache_key());
    }
}
