use std::collections::BTreeMap;

use thiserror::Error;

use crate::StoredValue;

/// An error resulting from operations on a preference store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The preference domain is not usable as a namespace.
    #[error("Invalid preference domain: {0:?}")]
    InvalidDomain(String),

    /// A stored value could not be serialized or deserialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backing database reported an error.
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    /// The backing file could not be prepared.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A per-application key-value preference database.
///
/// Every store is scoped to a single domain, the application's namespace. All methods operate on
/// that domain only; in particular [`remove_all`](PreferenceStore::remove_all) never touches the
/// entries of other domains sharing the same backing storage.
///
/// Implementations must be safe to share between threads. Callers do not coordinate access, so
/// any locking an implementation needs happens inside it.
pub trait PreferenceStore: Send + Sync {
    /// The domain this store reads from and writes to.
    fn domain(&self) -> &str;

    /// Retrieves the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<StoredValue>, StoreError>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: StoredValue) -> Result<(), StoreError>;

    /// Removes the value stored under `key`.
    ///
    /// Returns Ok even if the key doesn't exist.
    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Removes every value in this store's domain.
    fn remove_all(&self) -> Result<(), StoreError>;

    /// Returns every entry in this store's domain, ordered by key.
    fn entries(&self) -> Result<BTreeMap<String, StoredValue>, StoreError>;

    /// Returns every key in this store's domain, in ascending order.
    fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.entries()?.into_keys().collect())
    }

    /// Flushes pending writes to durable storage.
    ///
    /// Stores without a notion of pending writes can rely on the default no-op.
    fn synchronize(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Validate a domain name. Domains are used verbatim as a storage namespace, so they must not be
/// empty or contain control characters.
pub(crate) fn validate_domain(domain: &str) -> Result<(), StoreError> {
    if domain.trim().is_empty() || domain.chars().any(char::is_control) {
        return Err(StoreError::InvalidDomain(domain.to_string()));
    }
    Ok(())
}
