//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use koosdoos_core::cart::CartError;
use koosdoos_core::checkout::CheckoutError;
use koosdoos_core::shipping::ShippingError;
use serde_json::json;
use thiserror::Error;

use crate::services::GatewayError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Session store read or write failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Cart intent was rejected.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Shipping request could not be served.
    #[error("Shipping error: {0}")]
    Shipping(#[from] ShippingError),

    /// Checkout is not ready for hand-off.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Payment gateway call failed.
    #[error("Payment gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Gateway(_) => StatusCode::BAD_GATEWAY,
            Self::Cart(CartError::UnknownVariant { .. }) => StatusCode::NOT_FOUND,
            Self::Shipping(_) | Self::Checkout(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(self, Self::Session(_) | Self::Internal(_) | Self::Gateway(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();

        // Don't expose internal error details to clients
        let body = match &self {
            Self::Session(_) | Self::Internal(_) => json!({ "error": "Internal server error" }),
            Self::Gateway(_) => json!({ "error": "Payment service unavailable, please try again" }),
            Self::Cart(CartError::UnknownVariant { .. }) => json!({ "error": "Product not found" }),
            Self::Shipping(err) => json!({ "error": err.to_string() }),
            Self::Checkout(CheckoutError::InvalidAddress(errors)) => json!({
                "error": "Please complete your shipping address",
                "fields": errors,
            }),
            Self::Checkout(CheckoutError::Inventory(issues)) => json!({
                "error": "Some items are no longer available in the requested quantity",
                "issues": issues,
            }),
            Self::Checkout(err) => json!({ "error": err.to_string() }),
            Self::BadRequest(msg) => json!({ "error": msg }),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("variant_id", "v1")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
