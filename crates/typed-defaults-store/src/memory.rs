use std::{
    collections::{BTreeMap, HashMap},
    sync::RwLock,
};

use crate::{
    store::{validate_domain, PreferenceStore, StoreError},
    StoredValue, DEFAULT_DOMAIN,
};

/// In-memory preference storage using a HashMap behind a RwLock.
///
/// Nothing is persisted. Suitable for tests and for processes that only need preferences for
/// their own lifetime.
#[derive(Debug)]
pub struct MemoryStore {
    domain: String,
    values: RwLock<HashMap<String, StoredValue>>,
}

impl MemoryStore {
    /// Creates a new empty store for `domain`.
    pub fn new(domain: impl Into<String>) -> Result<Self, StoreError> {
        let domain = domain.into();
        validate_domain(&domain)?;

        Ok(Self {
            domain,
            values: RwLock::new(HashMap::new()),
        })
    }

    /// Number of entries currently held.
    pub fn len(&self) -> usize {
        self.values
            .read()
            .expect("RwLock should not be poisoned")
            .len()
    }

    /// Returns `true` if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            domain: DEFAULT_DOMAIN.to_string(),
            values: RwLock::new(HashMap::new()),
        }
    }
}

impl PreferenceStore for MemoryStore {
    fn domain(&self) -> &str {
        &self.domain
    }

    fn get(&self, key: &str) -> Result<Option<StoredValue>, StoreError> {
        let values = self.values.read().expect("RwLock should not be poisoned");
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: StoredValue) -> Result<(), StoreError> {
        let mut values = self.values.write().expect("RwLock should not be poisoned");
        values.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut values = self.values.write().expect("RwLock should not be poisoned");
        values.remove(key);
        Ok(())
    }

    fn remove_all(&self) -> Result<(), StoreError> {
        let mut values = self.values.write().expect("RwLock should not be poisoned");
        values.clear();
        Ok(())
    }

    fn entries(&self) -> Result<BTreeMap<String, StoredValue>, StoreError> {
        let values = self.values.read().expect("RwLock should not be poisoned");
        Ok(values
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }
}
