//! Durable local state slots.
//!
//! The storefront persists its cart, wishlist, and session snapshots as JSON
//! under a handful of fixed keys, one file per key. The store is the direct
//! analogue of the browser's localStorage in the original shop: a passive slot
//! with no behavior beyond get/set/remove.
//!
//! Reads never fail the caller. A missing or malformed slot yields `None`
//! (or the type's default via [`StateStore::read_or_default`]); the malformed
//! content is logged and left in place until the next write replaces it.
//!
//! Exactly one application instance owns the slots at a time, but the handle
//! is `Clone + Send + Sync` and serializes file access through an internal
//! mutex so it tolerates being called from any thread.

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::warn;

/// Fixed keys for the durable slots.
///
/// The names carry the original brand prefix so an installation's data
/// directory is self-describing.
pub mod keys {
    /// Key for the cart snapshot (JSON array of line items).
    pub const CART: &str = "almaartesana_cart";

    /// Key for the wishlist snapshot (JSON array of wishlist entries).
    pub const WISHLIST: &str = "almaartesana_wishlist";

    /// Key for the user snapshot (JSON object, absent when anonymous).
    pub const USER: &str = "almaartesana_user";

    /// Key for the access token (opaque string).
    pub const ACCESS_TOKEN: &str = "almaartesana_access_token";

    /// Key for the refresh token (opaque string).
    pub const REFRESH_TOKEN: &str = "almaartesana_refresh_token";
}

/// Errors that can occur when opening a store.
///
/// Only creation can fail; reads and writes against an open store degrade to
/// defaults and log lines instead of surfacing errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The state directory could not be created.
    #[error("failed to create state directory {path}: {source}")]
    CreateDir {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
}

/// Durable key-value store for JSON snapshots.
///
/// Cheaply cloneable; clones share the same backing storage.
#[derive(Clone)]
pub struct StateStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    backend: Backend,
}

enum Backend {
    /// One `<key>.json` file per slot under a root directory.
    Dir {
        root: PathBuf,
        lock: Mutex<()>,
    },
    /// Process-local slots, used by tests and ephemeral runs.
    Memory(Mutex<HashMap<String, String>>),
}

impl StateStore {
    /// Open (creating if necessary) a file-backed store rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::CreateDir`] if the directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|source| StoreError::CreateDir {
            path: root.clone(),
            source,
        })?;

        Ok(Self {
            inner: Arc::new(StoreInner {
                backend: Backend::Dir {
                    root,
                    lock: Mutex::new(()),
                },
            }),
        })
    }

    /// Create a store that lives only in this process.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            inner: Arc::new(StoreInner {
                backend: Backend::Memory(Mutex::new(HashMap::new())),
            }),
        }
    }

    /// Read and decode the slot under `key`.
    ///
    /// Returns `None` when the slot is absent or holds content that does not
    /// decode as `T`; the latter is logged and treated as absent.
    #[must_use]
    pub fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.read_raw(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "discarding malformed state slot");
                None
            }
        }
    }

    /// Read the slot under `key`, falling back to `T::default()` when the
    /// slot is absent or malformed.
    #[must_use]
    pub fn read_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        self.read(key).unwrap_or_default()
    }

    /// Encode `value` and write it to the slot under `key`.
    ///
    /// Write failures are logged, not surfaced: losing a snapshot write must
    /// never fail the in-memory mutation that triggered it.
    pub fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        match serde_json::to_string(value) {
            Ok(raw) => self.write_raw(key, &raw),
            Err(e) => warn!(key, error = %e, "failed to encode state slot"),
        }
    }

    /// Remove the slot under `key`. Removing an absent slot is a no-op.
    pub fn remove(&self, key: &str) {
        match &self.inner.backend {
            Backend::Dir { root, lock } => {
                let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
                if let Err(e) = std::fs::remove_file(slot_path(root, key))
                    && e.kind() != io::ErrorKind::NotFound
                {
                    warn!(key, error = %e, "failed to remove state slot");
                }
            }
            Backend::Memory(slots) => {
                slots
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .remove(key);
            }
        }
    }

    fn read_raw(&self, key: &str) -> Option<String> {
        match &self.inner.backend {
            Backend::Dir { root, lock } => {
                let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
                match std::fs::read_to_string(slot_path(root, key)) {
                    Ok(raw) => Some(raw),
                    Err(e) if e.kind() == io::ErrorKind::NotFound => None,
                    Err(e) => {
                        warn!(key, error = %e, "failed to read state slot");
                        None
                    }
                }
            }
            Backend::Memory(slots) => slots
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .get(key)
                .cloned(),
        }
    }

    fn write_raw(&self, key: &str, raw: &str) {
        match &self.inner.backend {
            Backend::Dir { root, lock } => {
                let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
                if let Err(e) = std::fs::write(slot_path(root, key), raw) {
                    warn!(key, error = %e, "failed to write state slot");
                }
            }
            Backend::Memory(slots) => {
                slots
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(key.to_owned(), raw.to_owned());
            }
        }
    }
}

fn slot_path(root: &std::path::Path, key: &str) -> PathBuf {
    root.join(format!("{key}.json"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicU32, Ordering};

    /// Unique scratch directory per test, removed on drop.
    struct ScratchDir(PathBuf);

    impl ScratchDir {
        fn new() -> Self {
            static COUNTER: AtomicU32 = AtomicU32::new(0);
            let dir = std::env::temp_dir().join(format!(
                "almaartesana-store-test-{}-{}",
                std::process::id(),
                COUNTER.fetch_add(1, Ordering::Relaxed)
            ));
            Self(dir)
        }
    }

    impl Drop for ScratchDir {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.0);
        }
    }

    #[test]
    fn test_roundtrip_file_backend() {
        let scratch = ScratchDir::new();
        let store = StateStore::open(&scratch.0).unwrap();

        store.write(keys::CART, &vec!["a".to_string(), "b".to_string()]);
        let back: Vec<String> = store.read_or_default(keys::CART);
        assert_eq!(back, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_absent_slot_yields_default() {
        let store = StateStore::in_memory();
        let value: Vec<String> = store.read_or_default("missing");
        assert!(value.is_empty());
        assert!(store.read::<String>("missing").is_none());
    }

    #[test]
    fn test_malformed_slot_yields_default() {
        let scratch = ScratchDir::new();
        let store = StateStore::open(&scratch.0).unwrap();

        // Corrupt the slot on disk behind the store's back
        std::fs::write(scratch.0.join(format!("{}.json", keys::CART)), "{not json!").unwrap();

        let value: Vec<String> = store.read_or_default(keys::CART);
        assert!(value.is_empty());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let store = StateStore::in_memory();
        store.write("k", "v");
        store.remove("k");
        store.remove("k");
        assert!(store.read::<String>("k").is_none());
    }

    #[test]
    fn test_survives_reopen() {
        let scratch = ScratchDir::new();
        {
            let store = StateStore::open(&scratch.0).unwrap();
            store.write(keys::ACCESS_TOKEN, "tok-123");
        }
        let reopened = StateStore::open(&scratch.0).unwrap();
        assert_eq!(
            reopened.read::<String>(keys::ACCESS_TOKEN).as_deref(),
            Some("tok-123")
        );
    }
}
