//! Wishlist commands.
//!
//! Mutations apply locally no matter what; when a session is active they are
//! synced to the account best-effort by the library (failures are logged and
//! compensated, never fatal here).

use clap::Subcommand;

use alma_artesana_core::{ProductId, format_quetzales};
use alma_artesana_storefront::AppState;

#[derive(Subcommand)]
pub enum WishlistAction {
    /// Show the favorited products
    Show,
    /// Flip a product in or out of the wishlist, by slug
    Toggle {
        /// Product slug
        slug: String,
    },
    /// Remove a product by id
    Remove {
        /// Product id
        product_id: i64,
    },
}

pub async fn dispatch(
    state: &AppState,
    action: WishlistAction,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        WishlistAction::Show => show(state),
        WishlistAction::Toggle { slug } => {
            let product = state.catalog().get_product(&slug).await?;
            let now_present = state
                .wishlist()
                .toggle(state.session(), &product.summary())
                .await;
            if now_present {
                println!("Agregado a favoritos: {}", product.name);
            } else {
                println!("Quitado de favoritos: {}", product.name);
            }
        }
        WishlistAction::Remove { product_id } => {
            state
                .wishlist()
                .remove(state.session(), ProductId::new(product_id))
                .await;
            show(state);
        }
    }
    Ok(())
}

fn show(state: &AppState) {
    let entries = state.wishlist().entries();
    if entries.is_empty() {
        println!("No tienes favoritos todavía.");
        return;
    }
    for entry in entries {
        println!(
            "#{:<6} {:<36} {}",
            entry.product_id,
            entry.name,
            format_quetzales(entry.price)
        );
    }
}
