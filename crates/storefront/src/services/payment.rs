//! Payment gateway client.
//!
//! Sends a prepared checkout to the gateway, which creates the order and
//! returns the hosted payment page URL plus the signed form fields to post
//! there. Signing happens on the gateway; the storefront never sees the
//! merchant passphrase.

use std::sync::Arc;

use koosdoos_core::checkout::{CheckoutRequest, HandoffResponse};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use thiserror::Error;
use tracing::{info, instrument};
use url::Url;

use crate::config::PaymentGatewayConfig;

/// Errors that can occur when calling the payment gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response, or the response is unusable.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Payment gateway API client.
#[derive(Clone)]
pub struct PaymentGatewayClient {
    inner: Arc<PaymentGatewayInner>,
}

struct PaymentGatewayInner {
    client: reqwest::Client,
    endpoint: String,
}

impl PaymentGatewayClient {
    /// Create a new gateway client.
    ///
    /// # Errors
    ///
    /// Returns error if the API key is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &PaymentGatewayConfig) -> Result<Self, GatewayError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = &config.api_key {
            let auth_value = format!("Bearer {}", key.expose_secret());
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&auth_value)
                    .map_err(|e| GatewayError::Parse(format!("Invalid API key format: {e}")))?,
            );
        }

        let client = reqwest::Client::builder().default_headers(headers).build()?;

        Ok(Self {
            inner: Arc::new(PaymentGatewayInner {
                client,
                endpoint: format!(
                    "{}/checkout/payfast",
                    config.url.as_str().trim_end_matches('/')
                ),
            }),
        })
    }

    /// Create an order and obtain its payment hand-off.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails, the gateway rejects it, or the
    /// response has no usable payment URL.
    #[instrument(skip(self, request), fields(lines = request.cart_lines.len()))]
    pub async fn create_checkout(&self, request: &CheckoutRequest) -> Result<HandoffResponse, GatewayError> {
        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .json(request)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message: message.chars().take(200).collect(),
            });
        }

        let body = response.text().await?;
        let handoff: HandoffResponse =
            serde_json::from_str(&body).map_err(|e| GatewayError::Parse(e.to_string()))?;
        check_payment_url(&handoff.payment_url)?;

        info!(order_id = %handoff.order_id, total = %handoff.total, "checkout created");
        Ok(handoff)
    }
}

/// The buyer's browser is sent to this URL, so only absolute http(s) URLs
/// are accepted.
fn check_payment_url(raw: &str) -> Result<(), GatewayError> {
    let url = Url::parse(raw).map_err(|e| GatewayError::Parse(format!("payment_url: {e}")))?;
    match url.scheme() {
        "https" | "http" => Ok(()),
        other => Err(GatewayError::Parse(format!(
            "payment_url has unsupported scheme '{other}'"
        ))),
    }
}
