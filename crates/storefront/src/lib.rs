//! Alma Artesana storefront client library.
//!
//! Everything the customer-facing surfaces need to run the shop against the
//! remote Alma Artesana API: catalog browsing, a purely local shopping cart,
//! an optimistically synchronized wishlist, token-based sessions with
//! transparent refresh, and durable local snapshots of all of it.
//!
//! # Architecture
//!
//! - The remote API is the source of truth for accounts, the wishlist, and
//!   orders; the cart is a pure client construct persisted locally.
//! - [`store::StateStore`] holds durable JSON snapshots under fixed keys and
//!   never fails a read - malformed data degrades to the empty default.
//! - [`session::SessionManager`] owns the token pair and retries a request
//!   exactly once after a 401 by rotating the access token.
//! - [`wishlist::Wishlist`] applies mutations optimistically and compensates
//!   when the best-effort remote sync fails.
//! - [`state::AppState`] wires it all together and is passed down explicitly
//!   instead of living in globals.
//!
//! # Example
//!
//! ```rust,ignore
//! use alma_artesana_storefront::{AppState, bootstrap, config::StorefrontConfig};
//!
//! let config = StorefrontConfig::from_env()?;
//! let state = AppState::new(config)?;
//!
//! // Validate any persisted session and pull the remote wishlist
//! bootstrap::run(&state).await;
//!
//! let product = state.catalog().get_product("colgante-de-macrame").await?;
//! state.cart().add(&product.summary(), 1);
//! state.wishlist().toggle(state.session(), &product.summary()).await;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod bootstrap;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod session;
pub mod state;
pub mod store;
pub mod wishlist;

pub use api::ApiError;
pub use state::AppState;
