//! Courier rate API client.
//!
//! Fetches live shipping quotes for a destination province and package
//! profile. Responses are cached for 5 minutes, keyed on the full quote
//! request. Every failure is reported as a [`QuoteSourceError`] so the quote
//! pipeline can fall back to the static rate table.

use std::sync::Arc;
use std::time::Duration;

use koosdoos_core::shipping::{QuoteRequest, QuoteSource, QuoteSourceError, ShippingQuote};
use moka::future::Cache;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::CourierConfig;

/// Quote cache lifetime.
const CACHE_TTL: Duration = Duration::from_secs(300);

/// Errors that can occur when calling the courier API.
#[derive(Debug, Error)]
pub enum CourierError {
    /// HTTP request failed (includes timeouts).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<CourierError> for QuoteSourceError {
    fn from(err: CourierError) -> Self {
        match err {
            CourierError::Http(e) if e.is_timeout() => Self::Timeout,
            CourierError::Http(e) => Self::Unavailable(e.to_string()),
            CourierError::Api { status, .. } => Self::Status(status),
            CourierError::Parse(msg) => Self::InvalidResponse(msg),
        }
    }
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    quotes: Vec<ShippingQuote>,
}

/// Client for the courier's simple quote endpoint.
#[derive(Clone)]
pub struct CourierClient {
    inner: Arc<CourierClientInner>,
}

struct CourierClientInner {
    client: reqwest::Client,
    endpoint: String,
    cache: Cache<QuoteRequest, Vec<ShippingQuote>>,
}

impl CourierClient {
    /// Create a new courier client.
    ///
    /// # Errors
    ///
    /// Returns error if the API key is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &CourierConfig) -> Result<Self, CourierError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = &config.api_key {
            let auth_value = format!("Bearer {}", key.expose_secret());
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&auth_value)
                    .map_err(|e| CourierError::Parse(format!("Invalid API key format: {e}")))?,
            );
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        let cache = Cache::builder()
            .max_capacity(500)
            .time_to_live(CACHE_TTL)
            .build();

        Ok(Self {
            inner: Arc::new(CourierClientInner {
                client,
                endpoint: format!(
                    "{}/shipping/quote/simple",
                    config.api_url.as_str().trim_end_matches('/')
                ),
                cache,
            }),
        })
    }

    /// Fetch quotes, serving repeated requests from the cache.
    ///
    /// Empty answers are not cached.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails, times out, returns a non-success
    /// status, or the body cannot be parsed.
    #[instrument(skip(self), fields(province = %request.province, size = %request.package_size))]
    pub async fn quotes(&self, request: &QuoteRequest) -> Result<Vec<ShippingQuote>, CourierError> {
        if let Some(cached) = self.inner.cache.get(request).await {
            debug!("courier quote cache hit");
            return Ok(cached);
        }

        let quotes = self.fetch(request).await?;
        if !quotes.is_empty() {
            self.inner.cache.insert(*request, quotes.clone()).await;
        }
        Ok(quotes)
    }

    async fn fetch(&self, request: &QuoteRequest) -> Result<Vec<ShippingQuote>, CourierError> {
        let url = format!(
            "{}?province={}&product_size={}&quantity={}",
            self.inner.endpoint,
            urlencoding::encode(request.province.as_str()),
            request.package_size.as_str(),
            request.quantity
        );

        let response = self.inner.client.post(&url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CourierError::Api {
                status: status.as_u16(),
                message: message.chars().take(200).collect(),
            });
        }

        let body = response.text().await?;
        let parsed: QuoteResponse =
            serde_json::from_str(&body).map_err(|e| CourierError::Parse(e.to_string()))?;

        debug!(count = parsed.quotes.len(), "courier quotes received");
        Ok(parsed.quotes)
    }
}

impl QuoteSource for CourierClient {
    async fn fetch_quotes(&self, request: &QuoteRequest) -> Result<Vec<ShippingQuote>, QuoteSourceError> {
        self.quotes(request).await.map_err(QuoteSourceError::from)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_mapping() {
        let api = CourierError::Api {
            status: 503,
            message: "down".into(),
        };
        assert_eq!(QuoteSourceError::from(api), QuoteSourceError::Status(503));

        let parse = CourierError::Parse("expected value".into());
        assert!(matches!(
            QuoteSourceError::from(parse),
            QuoteSourceError::InvalidResponse(_)
        ));
    }

    #[test]
    fn test_response_shape() {
        let body = r#"{"quotes":[{"service_type":"express","service_name":"Courier Express","price":175.5,"estimated_days":1}]}"#;
        let parsed: QuoteResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.quotes.len(), 1);
        assert_eq!(parsed.quotes[0].price, rust_decimal::Decimal::new(1755, 1));
    }
}
