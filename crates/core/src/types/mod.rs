//! Domain types shared across the storefront crates.

mod cart;
mod email;
mod id;
mod price;
mod product;
mod user;
mod wishlist;

pub use cart::LineItem;
pub use email::{Email, EmailError};
pub use id::{CategoryId, OrderId, ProductId, UserId, WishlistEntryId};
pub use price::format_quetzales;
pub use product::{Category, ProductDetail, ProductImage, ProductSummary};
pub use user::{User, UserProfile};
pub use wishlist::WishlistEntry;
