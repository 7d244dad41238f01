//! Remote-then-fallback quote pipeline.

use std::future::Future;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{FallbackRates, QuoteRequest, ServiceType, ShippingQuote};

/// Failure of a remote quote producer.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum QuoteSourceError {
    /// No remote producer is configured.
    #[error("quote service not configured")]
    NotConfigured,
    /// The request did not complete in time.
    #[error("quote service timed out")]
    Timeout,
    /// Network-level failure.
    #[error("quote service unreachable: {0}")]
    Unavailable(String),
    /// Non-success HTTP status.
    #[error("quote service returned status {0}")]
    Status(u16),
    /// The response body could not be understood.
    #[error("invalid quote response: {0}")]
    InvalidResponse(String),
}

/// A producer of shipping quotes, typically a courier's rate API.
pub trait QuoteSource {
    /// Fetch quotes for `request`.
    ///
    /// Implementations should bound their own running time; the pipeline
    /// treats every error the same way.
    fn fetch_quotes(
        &self,
        request: &QuoteRequest,
    ) -> impl Future<Output = Result<Vec<ShippingQuote>, QuoteSourceError>> + Send;
}

/// An unset optional source behaves as an unconfigured remote.
impl<S: QuoteSource + Sync> QuoteSource for Option<S> {
    async fn fetch_quotes(
        &self,
        request: &QuoteRequest,
    ) -> Result<Vec<ShippingQuote>, QuoteSourceError> {
        match self {
            Some(source) => source.fetch_quotes(request).await,
            None => Err(QuoteSourceError::NotConfigured),
        }
    }
}

/// Which producer a [`QuoteSet`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteOrigin {
    Remote,
    Fallback,
}

/// Result of a lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteSet {
    pub request: QuoteRequest,
    pub quotes: Vec<ShippingQuote>,
    pub origin: QuoteOrigin,
}

impl QuoteSet {
    /// Find the quote for a service level.
    #[must_use]
    pub fn quote(&self, service: ServiceType) -> Option<&ShippingQuote> {
        self.quotes.iter().find(|q| q.service_type == service)
    }
}

/// Look up quotes: ask `remote` first and fall back to the static table on
/// any failure, including an empty remote answer.
///
/// Never fails and has no side effects beyond the remote call, so it is safe
/// to call repeatedly (e.g. a "recalculate" action).
pub async fn lookup<S: QuoteSource>(remote: &S, request: &QuoteRequest) -> QuoteSet {
    match remote.fetch_quotes(request).await {
        Ok(quotes) if !quotes.is_empty() => {
            debug!(province = %request.province, count = quotes.len(), "remote shipping quotes");
            QuoteSet {
                request: *request,
                quotes,
                origin: QuoteOrigin::Remote,
            }
        }
        Ok(_) => {
            warn!(province = %request.province, "remote quote service returned no quotes, using fallback rates");
            fallback(request)
        }
        Err(QuoteSourceError::NotConfigured) => {
            debug!(province = %request.province, "no quote service configured, using fallback rates");
            fallback(request)
        }
        Err(e) => {
            warn!(province = %request.province, error = %e, "quote service failed, using fallback rates");
            fallback(request)
        }
    }
}

fn fallback(request: &QuoteRequest) -> QuoteSet {
    QuoteSet {
        request: *request,
        quotes: FallbackRates.quotes(request),
        origin: QuoteOrigin::Fallback,
    }
}

/// Choose the selected service after new quotes arrive.
///
/// An existing selection is kept. Otherwise `standard` is pre-selected when it
/// is on offer.
#[must_use]
pub fn auto_select(quotes: &[ShippingQuote], current: Option<ServiceType>) -> Option<ServiceType> {
    current.or_else(|| {
        quotes
            .iter()
            .find(|q| q.service_type == ServiceType::Standard)
            .map(|q| q.service_type)
    })
}
