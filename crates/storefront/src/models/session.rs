//! Session-related types.
//!
//! Per-visitor state stored in the session between requests.

use koosdoos_core::cart::CART_STORAGE_KEY;
use koosdoos_core::consent::CONSENT_STORAGE_KEY;
use koosdoos_core::shipping::{QuoteSet, ServiceType, ShippingQuote};
use koosdoos_core::storage::{KeyValueStore, MemoryStorage};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

/// Last shipping quotes shown to the visitor and the option they picked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingSelection {
    pub quotes: QuoteSet,
    pub selected: Option<ServiceType>,
}

impl ShippingSelection {
    /// The selected quote, if it is among the stored quotes.
    #[must_use]
    pub fn selected_quote(&self) -> Option<&ShippingQuote> {
        self.quotes.quote(self.selected?)
    }
}

/// Copy the session value under `key` into a [`MemoryStorage`].
///
/// # Errors
///
/// Returns the session store's error.
pub async fn load_storage(session: &Session, key: &str) -> Result<MemoryStorage, tower_sessions::session::Error> {
    Ok(session
        .get::<String>(key)
        .await?
        .map_or_else(MemoryStorage::new, |raw| MemoryStorage::with_entry(key, raw)))
}

/// Write `storage`'s value under `key` back to the session, removing the
/// session entry if the storage has none.
///
/// # Errors
///
/// Returns the session store's error.
pub async fn store_storage(
    session: &Session,
    storage: &MemoryStorage,
    key: &str,
) -> Result<(), tower_sessions::session::Error> {
    match storage.get(key) {
        Some(raw) => session.insert(key, raw).await,
        None => session.remove::<String>(key).await.map(|_| ()),
    }
}

/// Session keys.
pub mod keys {
    /// Cart snapshot (JSON array of product/variant/quantity).
    pub const CART: &str = super::CART_STORAGE_KEY;

    /// Whether the cart drawer is open.
    pub const CART_OPEN: &str = "cart_open";

    /// Cookie consent record.
    pub const CONSENT: &str = super::CONSENT_STORAGE_KEY;

    /// Last shipping quotes and selection.
    pub const SHIPPING: &str = "shipping";

    /// Payment hand-off waiting to be rendered.
    pub const PENDING_HANDOFF: &str = "pending_handoff";
}
