//! Cookie consent record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::storage::{KeyValueStore, StorageError};

/// Storage key of the consent record.
pub const CONSENT_STORAGE_KEY: &str = "koosdoos_cookie_consent";

/// The visitor's cookie choices.
///
/// Essential cookies cannot be declined, so `essential` is forced to `true`
/// whenever a record is built or loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookieConsent {
    pub essential: bool,
    pub functional: bool,
    pub analytics: bool,
    pub marketing: bool,
    /// Unix milliseconds when the choice was made.
    pub timestamp: i64,
}

impl CookieConsent {
    /// Record with every category chosen explicitly.
    #[must_use]
    pub fn custom(functional: bool, analytics: bool, marketing: bool, now: DateTime<Utc>) -> Self {
        Self {
            essential: true,
            functional,
            analytics,
            marketing,
            timestamp: now.timestamp_millis(),
        }
    }

    #[must_use]
    pub fn accept_all(now: DateTime<Utc>) -> Self {
        Self::custom(true, true, true, now)
    }

    #[must_use]
    pub fn essential_only(now: DateTime<Utc>) -> Self {
        Self::custom(false, false, false, now)
    }

    /// When the choice was made, if the timestamp is representable.
    #[must_use]
    pub fn decided_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }

    /// Read the stored record. Missing or unreadable records yield `None`,
    /// meaning the banner should be shown.
    pub fn load(storage: &impl KeyValueStore) -> Option<Self> {
        let raw = storage.get(CONSENT_STORAGE_KEY)?;
        match serde_json::from_str::<Self>(&raw) {
            Ok(consent) => Some(Self {
                essential: true,
                ..consent
            }),
            Err(e) => {
                warn!(error = %e, "ignoring unreadable cookie consent record");
                None
            }
        }
    }

    /// Store this record.
    ///
    /// # Errors
    ///
    /// Returns the storage backend's error.
    pub fn save(&self, storage: &mut impl KeyValueStore) -> Result<(), StorageError> {
        let record = Self {
            essential: true,
            ..*self
        };
        let json = serde_json::to_string(&record).map_err(|e| StorageError {
            key: CONSENT_STORAGE_KEY.to_string(),
            reason: e.to_string(),
        })?;
        debug!(
            functional = record.functional,
            analytics = record.analytics,
            marketing = record.marketing,
            "saving cookie consent"
        );
        storage.set(CONSENT_STORAGE_KEY, json)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::storage::MemoryStorage;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 11, 1, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_presets() {
        let all = CookieConsent::accept_all(now());
        assert!(all.essential && all.functional && all.analytics && all.marketing);
        let min = CookieConsent::essential_only(now());
        assert!(min.essential && !min.functional && !min.analytics && !min.marketing);
        assert_eq!(min.decided_at(), Some(now()));
    }

    #[test]
    fn test_save_then_load() {
        let mut storage = MemoryStorage::new();
        let consent = CookieConsent::custom(true, false, true, now());
        consent.save(&mut storage).unwrap();
        assert_eq!(CookieConsent::load(&storage), Some(consent));
    }

    #[test]
    fn test_load_forces_essential() {
        let storage = MemoryStorage::with_entry(
            CONSENT_STORAGE_KEY,
            r#"{"essential":false,"functional":false,"analytics":true,"marketing":false,"timestamp":1730453400000}"#,
        );
        let consent = CookieConsent::load(&storage).unwrap();
        assert!(consent.essential);
        assert!(consent.analytics);
    }

    #[test]
    fn test_missing_or_malformed_is_none() {
        assert_eq!(CookieConsent::load(&MemoryStorage::new()), None);
        let storage = MemoryStorage::with_entry(CONSENT_STORAGE_KEY, "{\"essential\":true");
        assert_eq!(CookieConsent::load(&storage), None);
    }
}
