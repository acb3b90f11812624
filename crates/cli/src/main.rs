//! Alma Artesana CLI - terminal storefront.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog
//! alma-cli products list --category macrame
//! alma-cli products show colgante-de-macrame
//!
//! # Cart and wishlist
//! alma-cli cart add colgante-de-macrame --quantity 2
//! alma-cli cart show
//! alma-cli wishlist toggle colgante-de-macrame
//!
//! # Account
//! alma-cli account login -e maria@example.com
//! alma-cli account orders
//!
//! # Checkout (guest allowed)
//! alma-cli checkout -e ana@example.com --phone "+502 5555-0000" \
//!     --first-name Ana --last-name García \
//!     --address "4a Calle 12-45" --city Guatemala --department Guatemala
//! ```
//!
//! # Commands
//!
//! - `products` - Browse and search the catalog
//! - `categories` - List categories
//! - `cart` - Manage the local shopping cart
//! - `wishlist` - Manage favorites (synced to the account when logged in)
//! - `account` - Login, registration, profile, and order history
//! - `checkout` - Submit the cart as an order

#![cfg_attr(not(test), forbid(unsafe_code))]
// The terminal output IS the UI of this binary
#![allow(clippy::print_stdout, clippy::print_stderr)]

use clap::{Parser, Subcommand};

use alma_artesana_storefront::config::StorefrontConfig;
use alma_artesana_storefront::{AppState, bootstrap};

mod commands;

#[derive(Parser)]
#[command(name = "alma-cli")]
#[command(author, version, about = "Alma Artesana terminal storefront")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse and search the catalog
    Products {
        #[command(subcommand)]
        action: commands::catalog::ProductsAction,
    },
    /// List categories
    Categories,
    /// Manage the local shopping cart
    Cart {
        #[command(subcommand)]
        action: commands::cart::CartAction,
    },
    /// Manage favorites
    Wishlist {
        #[command(subcommand)]
        action: commands::wishlist::WishlistAction,
    },
    /// Login, registration, profile, and order history
    Account {
        #[command(subcommand)]
        action: commands::account::AccountAction,
    },
    /// Submit the cart as an order
    Checkout(commands::checkout::CheckoutArgs),
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = StorefrontConfig::from_env()?;
    let state = AppState::new(config)?;

    // Validate any persisted session and pull the remote wishlist
    bootstrap::run(&state).await;

    match cli.command {
        Commands::Products { action } => commands::catalog::products(&state, action).await?,
        Commands::Categories => commands::catalog::categories(&state).await?,
        Commands::Cart { action } => commands::cart::dispatch(&state, action).await?,
        Commands::Wishlist { action } => commands::wishlist::dispatch(&state, action).await?,
        Commands::Account { action } => commands::account::dispatch(&state, action).await?,
        Commands::Checkout(args) => commands::checkout::submit(&state, args).await?,
    }
    Ok(())
}
