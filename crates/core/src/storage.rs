//! Key-value persistence port.
//!
//! The cart and the cookie-consent record persist small JSON strings under
//! fixed keys. In a browser this is local storage; in the storefront service
//! it is the visitor's session; in tests it is a [`MemoryStorage`].

use std::collections::HashMap;

/// Error writing to a [`KeyValueStore`].
#[derive(Debug, thiserror::Error)]
#[error("storage write failed for key {key}: {reason}")]
pub struct StorageError {
    pub key: String,
    pub reason: String,
}

/// Minimal get/set/remove storage interface.
pub trait KeyValueStore {
    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the write (e.g. quota exceeded).
    fn set(&mut self, key: &str, value: String) -> Result<(), StorageError>;

    /// Remove the value stored under `key`. Removing a missing key is not an
    /// error.
    fn remove(&mut self, key: &str);
}

/// In-memory [`KeyValueStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with one entry.
    #[must_use]
    pub fn with_entry(key: &str, value: impl Into<String>) -> Self {
        let mut entries = HashMap::new();
        entries.insert(key.to_owned(), value.into());
        Self { entries }
    }
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StorageError> {
        self.entries.insert(key.to_owned(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}
