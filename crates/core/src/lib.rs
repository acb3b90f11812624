//! Alma Artesana Core - Shared types library.
//!
//! This crate provides common types used across all Alma Artesana components:
//! - `storefront` - Client library for the remote shop API (cart, wishlist, session)
//! - `cli` - Command-line storefront for browsing, cart, and checkout
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no storage
//! access. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs and emails, plus the
//!   product, user, cart, and wishlist domain types

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
