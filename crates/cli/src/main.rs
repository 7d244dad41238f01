//! KoosDoos CLI - shipping, catalog and address tools.
//!
//! # Usage
//!
//! ```bash
//! # Fallback shipping quotes for a destination
//! kd-cli quote --province Gauteng --size medium --quantity 2
//!
//! # Ask the courier API first (reads COURIER_API_URL / COURIER_API_KEY)
//! kd-cli quote --province "Western Cape" --remote
//!
//! # Check a catalog file before deploying it
//! kd-cli catalog validate crates/storefront/content/catalog.json
//!
//! # Validate a shipping address
//! kd-cli address --street "12 Long St" --suburb "Gardens" --city "Cape Town" \
//!     --province "Western Cape" --postal-code 8001
//! ```
//!
//! # Commands
//!
//! - `quote` - Shipping quotes (fallback table, optionally courier first)
//! - `catalog validate` - Parse and integrity-check a catalog file
//! - `address` - Validate a South African shipping address

#![cfg_attr(not(test), forbid(unsafe_code))]
// Command results are the program's output
#![allow(clippy::print_stdout)]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use koosdoos_core::Province;
use koosdoos_core::shipping::PackageSize;

mod commands;

#[derive(Parser)]
#[command(name = "kd-cli")]
#[command(author, version, about = "KoosDoos CLI tools")]
struct Cli {
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show shipping quotes for a destination
    Quote {
        /// Destination province, e.g. "Gauteng"
        #[arg(short, long)]
        province: Province,

        /// Package size (`small`, `medium`, `large`, `xl`)
        #[arg(short, long, default_value = "medium")]
        size: PackageSize,

        /// Number of boxes
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,

        /// Ask the courier API before falling back to the rate table
        #[arg(long)]
        remote: bool,
    },
    /// Catalog tools
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
    /// Validate a shipping address
    Address(commands::address::AddressArgs),
}

#[derive(Subcommand)]
enum CatalogAction {
    /// Parse and check a catalog file
    Validate {
        /// Catalog JSON file
        #[arg(default_value = "crates/storefront/content/catalog.json")]
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
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

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Quote {
            province,
            size,
            quantity,
            remote,
        } => commands::quote::run(province, size, quantity, remote, cli.json).await,
        Commands::Catalog { action } => match action {
            CatalogAction::Validate { path } => commands::catalog::validate(&path, cli.json),
        },
        Commands::Address(args) => commands::address::run(args, cli.json),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_quote_args() {
        let cli = Cli::try_parse_from([
            "kd-cli", "quote", "--province", "western cape", "--size", "xl", "-q", "3",
        ])
        .unwrap();
        match cli.command {
            Commands::Quote {
                province,
                size,
                quantity,
                remote,
            } => {
                assert_eq!(province, Province::WesternCape);
                assert_eq!(size, PackageSize::Xl);
                assert_eq!(quantity, 3);
                assert!(!remote);
            }
            _ => panic!("expected quote command"),
        }
    }

    #[test]
    fn test_rejects_unknown_province() {
        assert!(Cli::try_parse_from(["kd-cli", "quote", "--province", "Bavaria"]).is_err());
    }
}
