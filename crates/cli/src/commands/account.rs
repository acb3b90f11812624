//! Account commands: login, registration, profile, and order history.

use std::io::{BufRead, Write as _};

use clap::Subcommand;

use alma_artesana_core::format_quetzales;
use alma_artesana_storefront::AppState;
use alma_artesana_storefront::api::types::{ProfileUpdate, RegisterForm};

#[derive(Subcommand)]
pub enum AccountAction {
    /// Log in (prompts for the password)
    Login {
        /// Account email
        #[arg(short, long)]
        email: String,
    },
    /// Create an account (prompts for the password twice)
    Register {
        /// Account email
        #[arg(short, long)]
        email: String,

        /// First name
        #[arg(long)]
        first_name: String,

        /// Last name
        #[arg(long)]
        last_name: String,
    },
    /// Log out
    Logout,
    /// Show the logged-in customer
    Whoami,
    /// Order history
    Orders,
    /// Show one order
    Order {
        /// Order number
        order_number: String,
    },
    /// Update profile fields (only the given flags are sent)
    UpdateProfile {
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        address_line2: Option<String>,
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        department: Option<String>,
        #[arg(long)]
        postal_code: Option<String>,
    },
    /// Change the account password (prompts for both)
    ChangePassword,
}

pub async fn dispatch(
    state: &AppState,
    action: AccountAction,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        AccountAction::Login { email } => {
            let password = prompt("Contraseña: ")?;
            let session = state.login(&email, &password).await?;
            println!("Hola, {}.", session.user.display_name());
        }
        AccountAction::Register {
            email,
            first_name,
            last_name,
        } => {
            let password = prompt("Contraseña: ")?;
            let password_confirm = prompt("Confirmar contraseña: ")?;
            let form = RegisterForm {
                email,
                password,
                password_confirm,
                first_name,
                last_name,
            };
            let session = state.register(&form).await?;
            println!("Cuenta creada. Hola, {}.", session.user.display_name());
        }
        AccountAction::Logout => {
            state.session().logout();
            println!("Sesión cerrada.");
        }
        AccountAction::Whoami => match state.session().current_user() {
            Some(user) => {
                println!("{} <{}>", user.display_name(), user.email);
                if let Some(profile) = &user.profile
                    && !profile.city.is_empty()
                {
                    println!("{}, {}", profile.city, profile.department);
                }
            }
            None => println!("No has iniciado sesión."),
        },
        AccountAction::Orders => {
            let orders = state.orders().list_orders(state.session()).await?;
            if orders.is_empty() {
                println!("No tienes pedidos todavía.");
            }
            for order in orders {
                println!(
                    "{:<16} {:<12} {}",
                    order.order_number,
                    order.status_display.or(order.status).unwrap_or_default(),
                    format_quetzales(order.total)
                );
            }
        }
        AccountAction::Order { order_number } => {
            let order = state
                .orders()
                .get_order(state.session(), &order_number)
                .await?;
            println!("Orden #{}", order.order_number);
            for item in &order.items {
                println!(
                    "  {:<36} {} × {}",
                    item.product_name,
                    item.quantity,
                    format_quetzales(item.product_price)
                );
            }
            println!("  Subtotal: {}", format_quetzales(order.subtotal));
            println!("  Envío:    {}", format_quetzales(order.shipping_cost));
            println!("  Total:    {}", format_quetzales(order.total));
        }
        AccountAction::UpdateProfile {
            first_name,
            last_name,
            phone,
            address,
            address_line2,
            city,
            department,
            postal_code,
        } => {
            let update = ProfileUpdate {
                first_name,
                last_name,
                email: None,
                phone,
                address,
                address_line2,
                city,
                department,
                postal_code,
            };
            let user = state.session().update_profile(&update).await?;
            println!("Perfil actualizado para {}.", user.display_name());
        }
        AccountAction::ChangePassword => {
            let current = prompt("Contraseña actual: ")?;
            let new = prompt("Contraseña nueva: ")?;
            state.session().change_password(&current, &new).await?;
            println!("Contraseña actualizada.");
        }
    }
    Ok(())
}

/// Read one line from stdin after printing a prompt.
fn prompt(label: &str) -> std::io::Result<String> {
    eprint!("{label}");
    std::io::stderr().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_owned())
}
