//! Wishlist synchronizer.
//!
//! The wishlist is mutated optimistically: every operation applies its local
//! flip first, persists it, and only then talks to the remote - and only when
//! a session is active. Remote failures never surface to the caller; they are
//! logged and compensated by reverting the local flip, for toggle and remove
//! alike.
//!
//! Hydration (triggered whenever a session becomes active) replaces the whole
//! local set with the remote one. Responses are sequenced against a version
//! counter bumped by every applied local mutation, so a hydration that
//! resolves after an interleaved toggle is discarded as stale instead of
//! silently undoing it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use reqwest::Method;
use tracing::{debug, instrument, warn};

use alma_artesana_core::{ProductId, ProductSummary, WishlistEntry};

use crate::api::types::{RemoteWishlistEntry, ToggleRequest, ToggleResponse};
use crate::api::{ApiError, Paged};
use crate::session::SessionManager;
use crate::store::{StateStore, keys};

/// The set of favorited products, unique by product id.
///
/// Cheaply cloneable; clones share the same entries.
#[derive(Clone)]
pub struct Wishlist {
    inner: Arc<WishlistInner>,
}

struct WishlistInner {
    entries: Mutex<Vec<WishlistEntry>>,
    /// Bumped on every applied local mutation; hydrations started before the
    /// latest bump are stale.
    version: AtomicU64,
    store: StateStore,
}

impl Wishlist {
    /// Load the wishlist from the persisted snapshot (empty if absent or
    /// malformed).
    #[must_use]
    pub fn load(store: &StateStore) -> Self {
        let entries: Vec<WishlistEntry> = store.read_or_default(keys::WISHLIST);
        Self {
            inner: Arc::new(WishlistInner {
                entries: Mutex::new(entries),
                version: AtomicU64::new(0),
                store: store.clone(),
            }),
        }
    }

    /// Snapshot of the current entries.
    #[must_use]
    pub fn entries(&self) -> Vec<WishlistEntry> {
        self.lock().clone()
    }

    /// Whether `product_id` is currently favorited.
    #[must_use]
    pub fn contains(&self, product_id: ProductId) -> bool {
        self.lock().iter().any(|e| e.product_id == product_id)
    }

    /// Number of favorited products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no products are favorited.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // =========================================================================
    // Mutations (optimistic, two-phase)
    // =========================================================================

    /// Flip the presence of `product`, returning whether it is now present.
    ///
    /// The local flip happens immediately and is what the return value
    /// reflects. With an active session a remote toggle is then issued
    /// best-effort; if it fails, the flip is reverted and the failure logged,
    /// never surfaced.
    #[instrument(skip(self, session, product), fields(product_id = %product.id))]
    pub async fn toggle(&self, session: &SessionManager, product: &ProductSummary) -> bool {
        let entry = WishlistEntry::from(product);
        let now_present = self.apply_toggle(&entry);

        if session.is_authenticated() {
            match session
                .send::<_, ToggleResponse>(
                    Method::POST,
                    "/wishlist/toggle/",
                    Some(&ToggleRequest {
                        product_id: product.id,
                    }),
                )
                .await
            {
                Ok(ack) => {
                    if ack.in_wishlist != now_present {
                        debug!(
                            action = %ack.action,
                            "remote wishlist disagrees with local toggle"
                        );
                    }
                }
                Err(e) => {
                    warn!(error = %e, "wishlist toggle sync failed, reverting local flip");
                    self.apply_toggle(&entry);
                }
            }
        }

        now_present
    }

    /// Remove `product_id` from the wishlist.
    ///
    /// Removal is applied locally first; with an active session the remote
    /// counterpart is then resolved by product id against a fresh fetch and
    /// deleted. A missing remote counterpart is skipped silently; a remote
    /// failure reinstates the entry (same compensation policy as `toggle`).
    #[instrument(skip(self, session), fields(product_id = %product_id))]
    pub async fn remove(&self, session: &SessionManager, product_id: ProductId) {
        let Some(removed) = self.take_entry(product_id) else {
            return;
        };

        if !session.is_authenticated() {
            return;
        }

        if let Err(e) = self.delete_remote(session, product_id).await {
            warn!(error = %e, "wishlist remove sync failed, reinstating entry");
            self.reinstate(removed);
        }
    }

    /// Replace the local wishlist with the remote one.
    ///
    /// Entries whose embedded product payload is missing an id are discarded.
    /// The fetched set is applied only if no local mutation was sequenced
    /// while the fetch was in flight; otherwise it is discarded as stale.
    /// Failures are logged, never surfaced - the local set stays as is.
    #[instrument(skip(self, session))]
    pub async fn hydrate_from_remote(&self, session: &SessionManager) {
        if !session.is_authenticated() {
            return;
        }

        let started_at = self.inner.version.load(Ordering::Acquire);

        let page: Paged<RemoteWishlistEntry> =
            match session.send(Method::GET, "/wishlist/", None::<&()>).await {
                Ok(page) => page,
                Err(e) => {
                    warn!(error = %e, "wishlist hydration failed");
                    return;
                }
            };

        let remote = page.into_results();
        let total = remote.len();
        let entries: Vec<WishlistEntry> = remote.into_iter().filter_map(remote_to_local).collect();
        if entries.len() < total {
            debug!(
                discarded = total - entries.len(),
                "dropped remote wishlist entries without a product id"
            );
        }

        if !self.replace_if_current(started_at, entries) {
            debug!("discarding stale wishlist hydration");
        }
    }

    // =========================================================================
    // Local phase
    // =========================================================================

    /// Flip presence in the local set; returns whether the entry is now
    /// present. Persists and sequences the mutation.
    fn apply_toggle(&self, entry: &WishlistEntry) -> bool {
        let mut entries = self.lock();
        let now_present = if entries.iter().any(|e| e.product_id == entry.product_id) {
            entries.retain(|e| e.product_id != entry.product_id);
            false
        } else {
            entries.push(entry.clone());
            true
        };
        self.commit(&entries);
        now_present
    }

    /// Remove and return the entry for `product_id`, if present.
    fn take_entry(&self, product_id: ProductId) -> Option<WishlistEntry> {
        let mut entries = self.lock();
        let index = entries.iter().position(|e| e.product_id == product_id)?;
        let removed = entries.remove(index);
        self.commit(&entries);
        Some(removed)
    }

    /// Put a removed entry back (compensation for a failed remote delete).
    fn reinstate(&self, entry: WishlistEntry) {
        let mut entries = self.lock();
        if !entries.iter().any(|e| e.product_id == entry.product_id) {
            entries.push(entry);
        }
        self.commit(&entries);
    }

    /// Apply a hydration result unless a local mutation was sequenced after
    /// `started_at`. Returns whether the replace happened.
    fn replace_if_current(&self, started_at: u64, new_entries: Vec<WishlistEntry>) -> bool {
        let mut entries = self.lock();
        if self.inner.version.load(Ordering::Acquire) != started_at {
            return false;
        }
        *entries = new_entries;
        self.commit(&entries);
        true
    }

    /// Sequence and persist a mutation. The entries lock is held by the
    /// caller, keeping the write ordered after the in-memory update.
    fn commit(&self, entries: &[WishlistEntry]) {
        self.inner.version.fetch_add(1, Ordering::AcqRel);
        self.inner.store.write(keys::WISHLIST, entries);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<WishlistEntry>> {
        self.inner
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    // Remote phase
    // =========================================================================

    /// Resolve the remote entry id for `product_id` and delete it.
    ///
    /// The local shape does not carry remote ids, so a fresh fetch is always
    /// needed. No matching remote entry means there is nothing to delete.
    async fn delete_remote(
        &self,
        session: &SessionManager,
        product_id: ProductId,
    ) -> Result<(), ApiError> {
        let page: Paged<RemoteWishlistEntry> =
            session.send(Method::GET, "/wishlist/", None::<&()>).await?;

        let Some(entry) = page.into_results().into_iter().find(|e| {
            e.product
                .as_ref()
                .is_some_and(|p| p.id == Some(product_id))
        }) else {
            debug!("no remote wishlist entry for product, skipping delete");
            return Ok(());
        };

        session
            .send_unit(
                Method::DELETE,
                &format!("/wishlist/{}/", entry.id),
                None::<&()>,
            )
            .await
    }
}

/// Map a remote entry into the local shape; `None` if the product payload is
/// missing an id.
fn remote_to_local(entry: RemoteWishlistEntry) -> Option<WishlistEntry> {
    let product = entry.product?;
    let product_id = product.id?;
    Some(WishlistEntry {
        product_id,
        name: product.name,
        slug: product.slug,
        price: product.price,
        image: product.primary_image,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn entry(id: i64) -> WishlistEntry {
        WishlistEntry {
            product_id: ProductId::new(id),
            name: format!("Producto {id}"),
            slug: format!("producto-{id}"),
            price: "100.00".parse().unwrap(),
            image: None,
        }
    }

    #[test]
    fn test_apply_toggle_flips_both_ways() {
        let wishlist = Wishlist::load(&StateStore::in_memory());
        let e = entry(1);

        assert!(wishlist.apply_toggle(&e));
        assert!(wishlist.contains(e.product_id));

        assert!(!wishlist.apply_toggle(&e));
        assert!(wishlist.is_empty());
    }

    #[test]
    fn test_take_and_reinstate() {
        let wishlist = Wishlist::load(&StateStore::in_memory());
        let e = entry(1);
        wishlist.apply_toggle(&e);

        let taken = wishlist.take_entry(e.product_id).unwrap();
        assert!(wishlist.is_empty());

        wishlist.reinstate(taken);
        assert!(wishlist.contains(e.product_id));
    }

    #[test]
    fn test_take_absent_entry_is_none() {
        let wishlist = Wishlist::load(&StateStore::in_memory());
        assert!(wishlist.take_entry(ProductId::new(9)).is_none());
    }

    #[test]
    fn test_hydration_applies_when_no_mutation_interleaved() {
        let wishlist = Wishlist::load(&StateStore::in_memory());
        let started = wishlist.inner.version.load(Ordering::Acquire);

        assert!(wishlist.replace_if_current(started, vec![entry(1), entry(2)]));
        assert_eq!(wishlist.len(), 2);
    }

    #[test]
    fn test_stale_hydration_is_discarded() {
        let wishlist = Wishlist::load(&StateStore::in_memory());
        let started = wishlist.inner.version.load(Ordering::Acquire);

        // A toggle lands while the (simulated) fetch is in flight
        wishlist.apply_toggle(&entry(7));

        assert!(!wishlist.replace_if_current(started, vec![entry(1)]));
        // The interleaved toggle survives
        assert!(wishlist.contains(ProductId::new(7)));
        assert_eq!(wishlist.len(), 1);
    }

    #[test]
    fn test_remote_to_local_discards_missing_product_id() {
        let with_id: RemoteWishlistEntry = serde_json::from_value(serde_json::json!({
            "id": 10,
            "product": {"id": 3, "name": "Canasta", "slug": "canasta", "price": "200.00"}
        }))
        .unwrap();
        let without_id: RemoteWishlistEntry = serde_json::from_value(serde_json::json!({
            "id": 11,
            "product": {"name": "sin id", "slug": "", "price": "10.00"}
        }))
        .unwrap();
        let without_product: RemoteWishlistEntry =
            serde_json::from_value(serde_json::json!({"id": 12})).unwrap();

        assert_eq!(
            remote_to_local(with_id).unwrap().product_id,
            ProductId::new(3)
        );
        assert!(remote_to_local(without_id).is_none());
        assert!(remote_to_local(without_product).is_none());
    }

    #[test]
    fn test_persisted_snapshot_reloads() {
        let store = StateStore::in_memory();
        {
            let wishlist = Wishlist::load(&store);
            wishlist.apply_toggle(&entry(1));
            wishlist.apply_toggle(&entry(2));
        }

        let reloaded = Wishlist::load(&store);
        assert_eq!(reloaded.len(), 2);
        assert!(reloaded.contains(ProductId::new(1)));
    }
}
