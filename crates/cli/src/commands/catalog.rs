//! Catalog browsing commands.

use clap::Subcommand;
use rust_decimal::Decimal;

use alma_artesana_core::{ProductSummary, format_quetzales};
use alma_artesana_storefront::AppState;
use alma_artesana_storefront::api::ProductFilter;

#[derive(Subcommand)]
pub enum ProductsAction {
    /// List products, optionally filtered
    List {
        /// Free-text search query
        #[arg(short, long)]
        search: Option<String>,

        /// Category slug
        #[arg(short, long)]
        category: Option<String>,

        /// Badge filter (e.g. `new`, `sale`)
        #[arg(long)]
        badge: Option<String>,

        /// Minimum price in quetzales
        #[arg(long)]
        min_price: Option<Decimal>,

        /// Maximum price in quetzales
        #[arg(long)]
        max_price: Option<Decimal>,

        /// Ordering key (`price`, `-price`, `name`, ...)
        #[arg(short, long)]
        ordering: Option<String>,
    },
    /// Show one product by slug
    Show {
        /// Product slug
        slug: String,
    },
    /// Curated featured products
    Featured,
    /// Newest products
    NewArrivals,
    /// Discounted products
    OnSale,
}

pub async fn products(
    state: &AppState,
    action: ProductsAction,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ProductsAction::List {
            search,
            category,
            badge,
            min_price,
            max_price,
            ordering,
        } => {
            let filter = ProductFilter {
                search,
                category,
                badge,
                min_price,
                max_price,
                ordering,
                ..ProductFilter::default()
            };
            let products = state.catalog().list_products(&filter).await?;
            print_product_list(&products);
        }
        ProductsAction::Show { slug } => {
            let product = state.catalog().get_product(&slug).await?;
            println!("{}  [{}]", product.name, product.slug);
            println!("  Precio: {}", format_quetzales(product.price));
            if let Some(original) = product.original_price {
                println!("  Antes:  {}", format_quetzales(original));
            }
            if let Some(artisan) = &product.artisan_name {
                println!("  Artesano: {artisan}");
            }
            if let Some(origin) = &product.origin {
                println!("  Origen: {origin}");
            }
            if let Some(materials) = &product.materials {
                println!("  Materiales: {materials}");
            }
            println!(
                "  Stock: {}",
                if product.in_stock {
                    product.stock.to_string()
                } else {
                    "agotado".to_owned()
                }
            );
            if !product.description.is_empty() {
                println!("\n{}", product.description);
            }
        }
        ProductsAction::Featured => {
            print_product_list(&state.catalog().featured().await?);
        }
        ProductsAction::NewArrivals => {
            print_product_list(&state.catalog().new_arrivals().await?);
        }
        ProductsAction::OnSale => {
            print_product_list(&state.catalog().on_sale().await?);
        }
    }
    Ok(())
}

pub async fn categories(state: &AppState) -> Result<(), Box<dyn std::error::Error>> {
    let categories = state.catalog().list_categories().await?;
    if categories.is_empty() {
        println!("No hay categorías.");
        return Ok(());
    }
    for category in categories {
        println!(
            "{:<24} [{}]  {} productos",
            category.name, category.slug, category.product_count
        );
    }
    Ok(())
}

fn print_product_list(products: &[ProductSummary]) {
    if products.is_empty() {
        println!("No se encontraron productos.");
        return;
    }
    for product in products {
        let badge = product
            .badge
            .as_deref()
            .map(|b| format!("  ({b})"))
            .unwrap_or_default();
        println!(
            "{:<36} [{}]  {}{badge}",
            product.name,
            product.slug,
            format_quetzales(product.price)
        );
    }
}
