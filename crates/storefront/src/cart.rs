//! Shopping cart aggregate.
//!
//! The cart is a pure client construct: the remote system only ever sees its
//! lines at checkout time. Every mutation updates the in-memory list and
//! writes through to the persisted cart slot before returning; `count` and
//! `total` are recomputed on every call rather than cached, so they can never
//! go stale relative to the last mutation.

use std::sync::{Arc, Mutex, PoisonError};

use rust_decimal::Decimal;
use tracing::debug;

use alma_artesana_core::{LineItem, ProductId, ProductSummary};

use crate::store::{StateStore, keys};

/// The shopping cart: an ordered list of line items, unique by product.
///
/// Cheaply cloneable; clones share the same lines.
#[derive(Clone)]
pub struct Cart {
    inner: Arc<CartInner>,
}

struct CartInner {
    items: Mutex<Vec<LineItem>>,
    store: StateStore,
}

impl Cart {
    /// Load the cart from the persisted snapshot (empty if absent or
    /// malformed).
    #[must_use]
    pub fn load(store: &StateStore) -> Self {
        let items: Vec<LineItem> = store.read_or_default(keys::CART);
        Self {
            inner: Arc::new(CartInner {
                items: Mutex::new(items),
                store: store.clone(),
            }),
        }
    }

    /// Add `quantity` units of `product`.
    ///
    /// If the product is already in the cart its quantity accumulates;
    /// otherwise a new line is appended.
    pub fn add(&self, product: &ProductSummary, quantity: u32) {
        let mut items = self.lock();
        if let Some(item) = items.iter_mut().find(|item| item.product_id == product.id) {
            item.quantity = item.quantity.saturating_add(quantity);
        } else {
            items.push(LineItem::new(product, quantity));
        }
        debug!(product_id = %product.id, quantity, "added to cart");
        self.persist(&items);
    }

    /// Remove the line for `product_id`. Removing an absent product is a
    /// no-op, not an error.
    pub fn remove(&self, product_id: ProductId) {
        let mut items = self.lock();
        items.retain(|item| item.product_id != product_id);
        self.persist(&items);
    }

    /// Replace the quantity of the line for `product_id`.
    ///
    /// A quantity of zero or less removes the line instead - a persisted
    /// quantity is always at least 1.
    pub fn set_quantity(&self, product_id: ProductId, quantity: i64) {
        if quantity <= 0 {
            self.remove(product_id);
            return;
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);

        let mut items = self.lock();
        if let Some(item) = items.iter_mut().find(|item| item.product_id == product_id) {
            item.quantity = quantity;
        }
        self.persist(&items);
    }

    /// Empty the cart. Used after successful order placement.
    pub fn clear(&self) {
        let mut items = self.lock();
        items.clear();
        self.persist(&items);
    }

    /// Snapshot of the current lines, in insertion order.
    #[must_use]
    pub fn items(&self) -> Vec<LineItem> {
        self.lock().clone()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.lock().iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Sum of line totals.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.lock().iter().map(LineItem::line_total).sum()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<LineItem>> {
        self.inner
            .items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Write-through, ordered after the in-memory update (the lines lock is
    /// still held by the caller).
    fn persist(&self, items: &[LineItem]) {
        self.inner.store.write(keys::CART, items);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(id: i64, price: &str) -> ProductSummary {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "name": format!("Producto {id}"),
            "slug": format!("producto-{id}"),
            "price": price,
        }))
        .unwrap()
    }

    #[test]
    fn test_add_accumulates_quantity() {
        let cart = Cart::load(&StateStore::in_memory());
        let p = product(1, "100.00");

        cart.add(&p, 1);
        cart.add(&p, 1);

        let items = cart.items();
        assert_eq!(items.len(), 1);
        assert_eq!(items.first().unwrap().quantity, 2);
    }

    #[test]
    fn test_quantity_floor_removes_line() {
        let cart = Cart::load(&StateStore::in_memory());
        let p = product(1, "100.00");

        cart.add(&p, 2);
        cart.set_quantity(p.id, 0);
        assert!(cart.is_empty());

        cart.add(&p, 2);
        cart.set_quantity(p.id, -3);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_replaces_in_place() {
        let cart = Cart::load(&StateStore::in_memory());
        let p = product(1, "100.00");

        cart.add(&p, 2);
        cart.set_quantity(p.id, 5);
        assert_eq!(cart.items().first().unwrap().quantity, 5);
    }

    #[test]
    fn test_count_and_total() {
        let cart = Cart::load(&StateStore::in_memory());
        cart.add(&product(1, "100"), 2);
        cart.add(&product(2, "50"), 1);

        assert_eq!(cart.count(), 3);
        assert_eq!(cart.total(), Decimal::new(250, 0));
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let cart = Cart::load(&StateStore::in_memory());
        cart.add(&product(1, "100"), 1);
        cart.remove(ProductId::new(99));
        assert_eq!(cart.count(), 1);
    }

    #[test]
    fn test_persistence_roundtrip() {
        let store = StateStore::in_memory();
        {
            let cart = Cart::load(&store);
            cart.add(&product(1, "100.00"), 1);
            cart.add(&product(2, "50.00"), 2);
            cart.add(&product(3, "19.99"), 1);
        }

        let reloaded = Cart::load(&store);
        let items = reloaded.items();
        assert_eq!(items.len(), 3);
        assert_eq!(items, Cart::load(&store).items());
        assert_eq!(reloaded.count(), 4);
    }

    #[test]
    fn test_clear_persists_empty_cart() {
        let store = StateStore::in_memory();
        let cart = Cart::load(&store);
        cart.add(&product(1, "100"), 1);
        cart.clear();

        assert!(Cart::load(&store).is_empty());
    }
}
