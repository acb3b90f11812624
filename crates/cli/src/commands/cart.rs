//! Cart commands. The cart is purely local; no command here touches the
//! network except `add`, which looks the product up by slug first.

use clap::Subcommand;

use alma_artesana_core::{ProductId, format_quetzales};
use alma_artesana_storefront::AppState;
use alma_artesana_storefront::checkout;

#[derive(Subcommand)]
pub enum CartAction {
    /// Show the cart contents and totals
    Show,
    /// Add a product by slug
    Add {
        /// Product slug
        slug: String,

        /// Units to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Remove a product by id
    Remove {
        /// Product id
        product_id: i64,
    },
    /// Set the quantity of a product already in the cart
    Set {
        /// Product id
        product_id: i64,

        /// New quantity (0 removes the line)
        quantity: i64,
    },
    /// Empty the cart
    Clear,
}

pub async fn dispatch(
    state: &AppState,
    action: CartAction,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        CartAction::Show => show(state),
        CartAction::Add { slug, quantity } => {
            let product = state.catalog().get_product(&slug).await?;
            state.cart().add(&product.summary(), quantity);
            println!("Agregado: {} × {}", quantity, product.name);
            show(state);
        }
        CartAction::Remove { product_id } => {
            state.cart().remove(ProductId::new(product_id));
            show(state);
        }
        CartAction::Set {
            product_id,
            quantity,
        } => {
            state.cart().set_quantity(ProductId::new(product_id), quantity);
            show(state);
        }
        CartAction::Clear => {
            state.cart().clear();
            println!("Carrito vaciado.");
        }
    }
    Ok(())
}

fn show(state: &AppState) {
    let items = state.cart().items();
    if items.is_empty() {
        println!("Tu carrito está vacío.");
        return;
    }

    for item in &items {
        println!(
            "#{:<6} {:<36} {} × {}  =  {}",
            item.product_id,
            item.name,
            item.quantity,
            format_quetzales(item.price),
            format_quetzales(item.line_total())
        );
    }

    let subtotal = state.cart().total();
    let shipping = checkout::shipping_cost(subtotal);
    println!();
    println!("  Subtotal: {}", format_quetzales(subtotal));
    if shipping.is_zero() {
        println!("  Envío:    ¡Gratis!");
    } else {
        println!("  Envío:    {}", format_quetzales(shipping));
    }
    println!("  Total:    {}", format_quetzales(checkout::order_total(subtotal)));
}
