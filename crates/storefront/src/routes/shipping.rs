//! Shipping quote route handlers.
//!
//! The calculator lives for one request: it is seeded from the body, the
//! cart and the previous selection, runs one lookup and the resulting
//! [`ShippingSelection`] is kept in the session for checkout.

use axum::{Json, extract::State};
use koosdoos_core::Province;
use koosdoos_core::shipping::{
    PackageSize, QuoteOrigin, ServiceType, ShippingCalculator, ShippingQuote, lookup,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::{instrument, warn};

use super::cart::load_cart;
use crate::error::{AppError, Result};
use crate::models::{ShippingSelection, session_keys};
use crate::state::AppState;

/// Quote request body. Missing package fields are derived from the cart.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct QuoteBody {
    pub province: Option<String>,
    pub package_size: Option<PackageSize>,
    pub quantity: Option<u32>,
    pub selected_service: Option<ServiceType>,
}

/// Selection request body.
#[derive(Debug, Deserialize)]
pub struct SelectBody {
    pub service_type: ServiceType,
}

/// One quote as displayed.
#[derive(Debug, Clone, Serialize)]
pub struct QuoteView {
    pub service_type: ServiceType,
    pub service_name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub display_price: String,
    pub estimated_days: u32,
    pub delivery_estimate: String,
}

impl From<&ShippingQuote> for QuoteView {
    fn from(quote: &ShippingQuote) -> Self {
        Self {
            service_type: quote.service_type,
            service_name: quote.service_name.clone(),
            price: quote.price,
            display_price: quote.display_price().display(),
            estimated_days: quote.estimated_days,
            delivery_estimate: quote.delivery_estimate(),
        }
    }
}

/// Quotes for a destination plus the current selection.
#[derive(Debug, Clone, Serialize)]
pub struct ShippingView {
    pub province: Province,
    pub origin: QuoteOrigin,
    pub quotes: Vec<QuoteView>,
    pub selected_service: Option<ServiceType>,
}

impl From<&ShippingSelection> for ShippingView {
    fn from(selection: &ShippingSelection) -> Self {
        Self {
            province: selection.quotes.request.province,
            origin: selection.quotes.origin,
            quotes: selection.quotes.quotes.iter().map(QuoteView::from).collect(),
            selected_service: selection.selected,
        }
    }
}

/// Look up quotes for a province.
///
/// An unknown province name is treated like no province.
#[instrument(skip(state, session))]
pub async fn quote(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<QuoteBody>,
) -> Result<Json<ShippingView>> {
    let cart = load_cart(&state, &session).await?;
    let cart_state = cart.state();

    let package_size = body
        .package_size
        .or_else(|| cart_state.package_size())
        .unwrap_or_default();
    let quantity = body.quantity.unwrap_or_else(|| {
        u32::try_from(cart_state.item_count()).unwrap_or(u32::MAX).max(1)
    });

    let previous = session
        .get::<ShippingSelection>(session_keys::SHIPPING)
        .await?
        .and_then(|s| s.selected);

    let province = body.province.as_deref().filter(|raw| !raw.trim().is_empty()).and_then(|raw| {
        raw.parse::<Province>()
            .inspect_err(|e| warn!(province = raw, error = %e, "Unknown province"))
            .ok()
    });

    let mut calculator = ShippingCalculator::new(package_size, quantity)
        .with_selection(body.selected_service.or(previous));
    calculator.set_province(province);

    let ticket = calculator.begin()?;
    let set = lookup(state.courier(), ticket.request()).await;
    calculator.apply(ticket, set.clone());

    let selection = ShippingSelection {
        quotes: set,
        selected: calculator.selected(),
    };
    session.insert(session_keys::SHIPPING, &selection).await?;

    Ok(Json(ShippingView::from(&selection)))
}

/// Select one of the quotes from the last lookup.
#[instrument(skip(session))]
pub async fn select(session: Session, Json(body): Json<SelectBody>) -> Result<Json<ShippingView>> {
    let mut selection = session
        .get::<ShippingSelection>(session_keys::SHIPPING)
        .await?
        .ok_or_else(|| AppError::BadRequest("Calculate shipping before selecting a service".to_string()))?;

    let request = selection.quotes.request;
    let mut calculator = ShippingCalculator::new(request.package_size, request.quantity);
    calculator.set_province(Some(request.province));
    let ticket = calculator.begin()?;
    calculator.apply(ticket, selection.quotes.clone());
    calculator.select(body.service_type)?;

    selection.selected = calculator.selected();
    session.insert(session_keys::SHIPPING, &selection).await?;

    Ok(Json(ShippingView::from(&selection)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use koosdoos_core::shipping::{FallbackRates, QuoteRequest, QuoteSet};

    use super::*;

    #[test]
    fn test_shipping_view_formats_quotes() {
        let request = QuoteRequest::new(Province::WesternCape, PackageSize::Small, 1);
        let selection = ShippingSelection {
            quotes: QuoteSet {
                request,
                quotes: FallbackRates.quotes(&request),
                origin: QuoteOrigin::Fallback,
            },
            selected: Some(ServiceType::Standard),
        };

        let view = ShippingView::from(&selection);
        assert_eq!(view.province, Province::WesternCape);
        assert_eq!(view.selected_service, Some(ServiceType::Standard));
        assert!(!view.quotes.is_empty());
        assert!(view.quotes.iter().all(|q| q.display_price.starts_with('R')));

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["origin"], "fallback");
        assert_eq!(json["province"], "Western Cape");
    }

    #[test]
    fn test_quote_body_defaults() {
        let body: QuoteBody = serde_json::from_str(r#"{"province": "Gauteng"}"#).unwrap();
        assert_eq!(body.province.as_deref(), Some("Gauteng"));
        assert!(body.package_size.is_none());
        assert!(body.quantity.is_none());
    }
}
