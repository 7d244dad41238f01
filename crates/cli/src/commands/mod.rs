//! CLI command implementations.

pub mod address;
pub mod catalog;
pub mod quote;

use koosdoos_storefront::config::ConfigError;
use koosdoos_storefront::content::ContentError;
use koosdoos_storefront::services::CourierError;

/// Errors returned by CLI commands.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("courier client error: {0}")]
    Courier(#[from] CourierError),

    #[error("{0}")]
    Content(#[from] ContentError),

    #[error("failed to encode output: {0}")]
    Output(#[from] serde_json::Error),

    #[error("address is invalid ({0} field(s))")]
    InvalidAddress(usize),
}

/// Print `value` as pretty JSON on stdout.
fn print_json(value: &impl serde::Serialize) -> Result<(), CommandError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
