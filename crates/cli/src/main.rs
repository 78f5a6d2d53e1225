//! Printloom CLI - operator tools for the store backend.
//!
//! # Usage
//!
//! ```bash
//! # Check that the backend answers
//! pl-cli health
//!
//! # Show shipping, tax and currency
//! pl-cli settings show
//!
//! # Price a product without touching the backend
//! pl-cli quote --base 10 --tax-rate 0.2 --discount 10 --quantity 3
//!
//! # List orders (signs in with PRINTLOOM_ADMIN_EMAIL / PRINTLOOM_ADMIN_PASSWORD)
//! pl-cli orders list --status CANCELLED --search lovelace
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use url::Url;

mod commands;

#[derive(Parser)]
#[command(name = "pl-cli")]
#[command(author, version, about = "Printloom CLI tools")]
struct Cli {
    /// Backend base URL
    #[arg(
        long,
        global = true,
        env = "BACKEND_API_URL",
        default_value = "http://localhost:4000"
    )]
    backend_url: Url,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the backend is reachable
    Health,
    /// Store settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// Compute a unit price and line total locally
    Quote {
        /// Base price before tax
        #[arg(long)]
        base: Decimal,

        /// Tax rate as a fraction (0.2 is 20%)
        #[arg(long, default_value = "0")]
        tax_rate: Decimal,

        /// Discount in percent (10 is 10% off)
        #[arg(long)]
        discount: Option<Decimal>,

        /// Number of units
        #[arg(long, default_value_t = 1)]
        quantity: u32,

        /// Currency code (EUR, USD, GBP, CAD, AUD)
        #[arg(long, default_value = "EUR")]
        currency: String,
    },
    /// Orders (requires admin credentials)
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print the current settings
    Show,
}

#[derive(Subcommand)]
enum OrdersAction {
    /// List orders, newest first
    List {
        /// Only orders with this status (PENDING, PROCESSING, SHIPPED, DELIVERED, CANCELLED)
        #[arg(short, long)]
        status: Option<String>,

        /// Client name or email
        #[arg(short = 'q', long)]
        search: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Logs go to stderr; command output goes to stdout.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Health => commands::health::run(&cli.backend_url).await?,
        Commands::Settings { action } => match action {
            SettingsAction::Show => commands::settings::show(&cli.backend_url).await?,
        },
        Commands::Quote {
            base,
            tax_rate,
            discount,
            quantity,
            currency,
        } => {
            let quote = commands::quote::quote(base, tax_rate, discount, quantity, &currency)?;
            commands::quote::print(&quote);
        }
        Commands::Orders { action } => match action {
            OrdersAction::List { status, search } => {
                commands::orders::list(
                    &cli.backend_url,
                    status.as_deref(),
                    search.as_deref().unwrap_or_default(),
                )
                .await?;
            }
        },
    }
    Ok(())
}
