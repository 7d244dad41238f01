//! Shipping quote command.
//!
//! Runs the same lookup the storefront uses: courier first when `--remote`
//! is given and configured, otherwise (or on any courier failure) the static
//! rate table.

use koosdoos_core::Province;
use koosdoos_core::shipping::{
    PackageSize, QuoteOrigin, QuoteRequest, QuoteSet, ServiceType, auto_select, lookup,
};
use koosdoos_storefront::config::CourierConfig;
use koosdoos_storefront::services::CourierClient;
use serde_json::json;
use tracing::{info, warn};

use super::{CommandError, print_json};

/// Look up and print quotes.
///
/// # Errors
///
/// Returns an error if `--remote` is given with invalid courier settings.
pub async fn run(
    province: Province,
    size: PackageSize,
    quantity: u32,
    remote: bool,
    json: bool,
) -> Result<(), CommandError> {
    let request = QuoteRequest::new(province, size, quantity);
    let courier = if remote { courier_from_env()? } else { None };

    let set = lookup(&courier, &request).await;
    let selected = auto_select(&set.quotes, None);

    if json {
        return print_json(&json!({
            "request": set.request,
            "origin": set.origin,
            "quotes": set.quotes,
            "selected_service": selected,
        }));
    }

    print_table(&set, selected);
    Ok(())
}

fn courier_from_env() -> Result<Option<CourierClient>, CommandError> {
    let _ = dotenvy::dotenv();
    match CourierConfig::from_env()? {
        Some(config) => {
            info!(url = %config.api_url, "Using courier API");
            Ok(Some(CourierClient::new(&config)?))
        }
        None => {
            warn!("COURIER_API_URL not set, using fallback rates");
            Ok(None)
        }
    }
}

fn print_table(set: &QuoteSet, selected: Option<ServiceType>) {
    let origin = match set.origin {
        QuoteOrigin::Remote => "courier",
        QuoteOrigin::Fallback => "fallback table",
    };
    println!(
        "Shipping to {} ({} x{}) from {origin}",
        set.request.province, set.request.package_size, set.request.quantity
    );
    for quote in &set.quotes {
        let marker = if Some(quote.service_type) == selected { '*' } else { ' ' };
        println!(
            "  {marker} {:<22} {:>8}  {}",
            quote.service_name,
            quote.display_price().display(),
            quote.delivery_estimate()
        );
    }
}
