//! Checkout command: submit the cart as an order.

use clap::Args;

use alma_artesana_core::format_quetzales;
use alma_artesana_storefront::AppState;
use alma_artesana_storefront::checkout::{CheckoutForm, PaymentMethod};

#[derive(Args)]
pub struct CheckoutArgs {
    /// Contact email
    #[arg(short, long)]
    pub email: String,

    /// Contact phone
    #[arg(long)]
    pub phone: String,

    /// First name
    #[arg(long)]
    pub first_name: String,

    /// Last name
    #[arg(long)]
    pub last_name: String,

    /// Street address
    #[arg(long)]
    pub address: String,

    /// Apartment, suite, etc.
    #[arg(long, default_value = "")]
    pub address_line2: String,

    /// City
    #[arg(long)]
    pub city: String,

    /// Department
    #[arg(long)]
    pub department: String,

    /// Postal code
    #[arg(long, default_value = "")]
    pub postal_code: String,

    /// Payment method: card, transfer, or cash (simulated, never charged)
    #[arg(long, value_enum, default_value = "card")]
    pub payment_method: PaymentMethodArg,

    /// Note to attach to the order
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Clone, Copy, clap::ValueEnum)]
pub enum PaymentMethodArg {
    Card,
    Transfer,
    Cash,
}

impl From<PaymentMethodArg> for PaymentMethod {
    fn from(arg: PaymentMethodArg) -> Self {
        match arg {
            PaymentMethodArg::Card => Self::Card,
            PaymentMethodArg::Transfer => Self::Transfer,
            PaymentMethodArg::Cash => Self::Cash,
        }
    }
}

pub async fn submit(
    state: &AppState,
    args: CheckoutArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    if state.cart().is_empty() {
        println!("Tu carrito está vacío. Agrega productos antes de continuar con el pago.");
        return Ok(());
    }

    let form = CheckoutForm {
        email: args.email,
        phone: args.phone,
        first_name: args.first_name,
        last_name: args.last_name,
        address: args.address,
        address_line2: args.address_line2,
        city: args.city,
        department: args.department,
        postal_code: args.postal_code,
        payment_method: args.payment_method.into(),
        notes: args.notes,
    };

    match state.place_order(&form).await {
        Ok(order) => {
            println!("¡Pedido confirmado!");
            println!("Orden #{}", order.order_number);
            println!("  Subtotal: {}", format_quetzales(order.subtotal));
            println!("  Envío:    {}", format_quetzales(order.shipping_cost));
            println!("  Total:    {}", format_quetzales(order.total));
            println!("Hemos enviado los detalles de tu pedido a {}.", form.email);
        }
        Err(e) => {
            // The cart is left intact so the customer can retry
            eprintln!("Error al procesar tu pedido: {e}");
            eprintln!("Por favor intenta de nuevo.");
            std::process::exit(1);
        }
    }

    Ok(())
}
