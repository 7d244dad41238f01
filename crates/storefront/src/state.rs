//! Application state shared across handlers.

use std::sync::Arc;

use koosdoos_core::catalog::Catalog;

use crate::config::StorefrontConfig;
use crate::middleware::SessionLocks;
use crate::services::{CourierClient, CourierError, GatewayError, PaymentGatewayClient};

/// Error creating the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("courier client: {0}")]
    Courier(#[from] CourierError),
    #[error("payment gateway client: {0}")]
    Gateway(#[from] GatewayError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// configuration, the catalog and the outbound API clients.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    catalog: Arc<Catalog>,
    courier: Option<CourierClient>,
    payment: PaymentGatewayClient,
    session_locks: SessionLocks,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `catalog` - Validated product catalog
    ///
    /// # Errors
    ///
    /// Returns an error if an API client cannot be built.
    pub fn new(config: StorefrontConfig, catalog: Catalog) -> Result<Self, StateError> {
        let courier = config.courier.as_ref().map(CourierClient::new).transpose()?;
        if courier.is_none() {
            tracing::info!("COURIER_API_URL not set, shipping quotes use fallback rates");
        }
        let payment = PaymentGatewayClient::new(&config.payment)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog: Arc::new(catalog),
                courier,
                payment,
                session_locks: SessionLocks::new(),
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Shared handle to the catalog, for building cart stores.
    #[must_use]
    pub fn catalog(&self) -> Arc<Catalog> {
        Arc::clone(&self.inner.catalog)
    }

    /// The courier client, if one is configured.
    ///
    /// `Option<CourierClient>` is itself a quote source that reports
    /// "not configured" when empty.
    #[must_use]
    #[allow(clippy::ref_option)] // the Option itself is the quote source
    pub fn courier(&self) -> &Option<CourierClient> {
        &self.inner.courier
    }

    /// Get a reference to the payment gateway client.
    #[must_use]
    pub fn payment(&self) -> &PaymentGatewayClient {
        &self.inner.payment
    }

    /// Per-session request locks.
    #[must_use]
    pub fn session_locks(&self) -> &SessionLocks {
        &self.inner.session_locks
    }
}
