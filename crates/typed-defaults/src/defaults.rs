//! The typed accessor over a preference store.

use std::{collections::BTreeMap, sync::Arc};

use tracing::{debug, error, warn};
use typed_defaults_store::{open_store, MemoryStore, PreferenceStore, StoreError, StoredValue};

use crate::{
    value::EncodeError, DefaultsSettings, DefaultsValue, Fallback, Key, Value, ValueShapeError,
};

/// Typed access to a preference store.
///
/// Values are read and written through [`Key`]s, which fix the value type for a name at compile
/// time. Every operation is a single synchronous call into the underlying [`PreferenceStore`].
///
/// The accessor never reports store failures to the caller. A failed write is logged and
/// dropped; a failed read is logged and treated as absence. Reads of primitive types (`bool`,
/// `i64`, `f32`, `f64`) return zero when nothing usable is stored, every other type returns
/// `None`. Use [`contains`](UserDefaults::contains) to tell a stored zero from absence.
///
/// # Example
/// ```rust
/// use typed_defaults::{Key, UserDefaults};
///
/// const COUNT: Key<i64> = Key::new("count");
/// const TAGS: Key<Vec<String>> = Key::new("tags");
///
/// let defaults = UserDefaults::in_memory();
///
/// defaults.set(COUNT, 42);
/// defaults.set(TAGS, vec!["a".to_string(), "b".to_string()]);
///
/// assert_eq!(defaults.get(COUNT), 42);
/// assert_eq!(defaults.get(TAGS), Some(vec!["a".to_string(), "b".to_string()]));
///
/// defaults.remove(TAGS);
/// assert_eq!(defaults.get(TAGS), None);
/// assert!(defaults.value(TAGS).is_empty());
/// ```
pub struct UserDefaults {
    store: Arc<dyn PreferenceStore>,
    synchronize_on_write: bool,
}

impl std::fmt::Debug for UserDefaults {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserDefaults")
            .field("domain", &self.store.domain())
            .field("synchronize_on_write", &self.synchronize_on_write)
            .finish()
    }
}

impl UserDefaults {
    /// Create an accessor over an existing store.
    pub fn new(store: Arc<dyn PreferenceStore>) -> Self {
        Self {
            store,
            synchronize_on_write: false,
        }
    }

    /// Open the store described by `settings` and create an accessor over it.
    pub fn open(settings: DefaultsSettings) -> Result<Self, StoreError> {
        let store = open_store(settings.store, &settings.domain)?;
        debug!(domain = %settings.domain, "Opened user defaults");

        Ok(Self {
            store,
            synchronize_on_write: settings.synchronize_on_write,
        })
    }

    /// Create an accessor over a fresh [`MemoryStore`] in the default domain.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::default()))
    }

    /// Flush the store after every mutation.
    pub fn with_synchronize_on_write(mut self, enabled: bool) -> Self {
        self.synchronize_on_write = enabled;
        self
    }

    /// The domain of the underlying store.
    pub fn domain(&self) -> &str {
        self.store.domain()
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<dyn PreferenceStore> {
        &self.store
    }

    /// Get the value stored under `key`.
    ///
    /// Returns zero for primitive types and `None` for every other type when the key is absent or
    /// the stored value cannot be read as `T`.
    pub fn get<T: DefaultsValue>(&self, key: Key<T>) -> T::Output {
        self.get_named::<T>(key.name())
    }

    /// Get the value stored under `key`, substituting an empty value when there is none.
    ///
    /// The empty values are `false`, zero, the empty string, an empty blob or collection, the Unix
    /// epoch, `about:blank` for URLs and `T::default()` for [`Json<T>`](crate::Json).
    pub fn value<T: Fallback>(&self, key: Key<T>) -> T {
        self.value_named::<T>(key.name())
    }

    /// Store `value` under `key`, replacing any previous value.
    pub fn set<T: DefaultsValue>(&self, key: Key<T>, value: T) {
        match value.to_stored() {
            Ok(stored) => self.write(key.name(), stored),
            Err(EncodeError::Shape(e)) => contract_violation(key.name(), e),
            Err(e) => error!(key = key.name(), "Failed to encode preference: {e}"),
        }
    }

    /// Store `value` under `key`, or remove the key when `value` is `None`.
    pub fn set_optional<T: DefaultsValue>(&self, key: Key<T>, value: Option<T>) {
        match value {
            Some(value) => self.set(key, value),
            None => self.remove(key),
        }
    }

    /// Remove the value stored under `key`. Removing an absent key does nothing.
    pub fn remove<T>(&self, key: Key<T>) {
        self.remove_object(key.name());
    }

    /// Returns `true` if any value is stored under `key`, whatever its shape.
    pub fn contains<T>(&self, key: Key<T>) -> bool {
        self.read(key.name()).is_some()
    }

    /// Like [`get`](UserDefaults::get), for a name that has no declared key.
    pub fn get_named<T: DefaultsValue>(&self, name: &str) -> T::Output {
        T::output(self.read_as(name))
    }

    /// Like [`value`](UserDefaults::value), for a name that has no declared key.
    pub fn value_named<T: Fallback>(&self, name: &str) -> T {
        self.read_as(name).unwrap_or_else(T::fallback)
    }

    /// Get whatever is stored under `name`.
    ///
    /// URLs are indistinguishable from strings once stored and come back as [`Value::String`].
    pub fn object(&self, name: &str) -> Option<Value> {
        self.read(name).map(Value::from)
    }

    /// Store a dynamically typed value under `name`.
    ///
    /// # Panics
    ///
    /// Storing a value rejected by [`Value::validate`] is a programming error. Debug builds panic;
    /// release builds log the error and leave the store untouched. Use
    /// [`try_set_object`](UserDefaults::try_set_object) to check instead.
    pub fn set_object(&self, name: &str, value: impl Into<Value>) {
        if let Err(e) = self.try_set_object(name, value) {
            contract_violation(name, e);
        }
    }

    /// Store a dynamically typed value under `name` if its shape can be stored.
    pub fn try_set_object(&self, name: &str, value: impl Into<Value>) -> Result<(), ValueShapeError> {
        let value = value.into();
        value.validate()?;
        self.write(name, value.into());
        Ok(())
    }

    /// Remove whatever is stored under `name`. Removing an absent name does nothing.
    pub fn remove_object(&self, name: &str) {
        if let Err(e) = self.store.remove(name) {
            error!(key = name, "Failed to remove preference: {e}");
            return;
        }
        self.after_write();
    }

    /// Remove every value in this accessor's domain.
    pub fn clear_all(&self) {
        if let Err(e) = self.store.remove_all() {
            error!(domain = self.domain(), "Failed to clear preferences: {e}");
            return;
        }
        debug!(domain = self.domain(), "Cleared preferences");
        self.after_write();
    }

    /// Flush pending writes to durable storage.
    pub fn synchronize(&self) {
        if let Err(e) = self.store.synchronize() {
            error!(domain = self.domain(), "Failed to synchronize preferences: {e}");
        }
    }

    /// Every name with a stored value, in ascending order.
    pub fn keys(&self) -> Vec<String> {
        self.store.keys().unwrap_or_else(|e| {
            warn!(domain = self.domain(), "Failed to list preferences: {e}");
            Vec::new()
        })
    }

    /// Every stored entry of this accessor's domain.
    pub fn dictionary_representation(&self) -> BTreeMap<String, Value> {
        match self.store.entries() {
            Ok(entries) => entries
                .into_iter()
                .map(|(name, value)| (name, value.into()))
                .collect(),
            Err(e) => {
                warn!(domain = self.domain(), "Failed to list preferences: {e}");
                BTreeMap::new()
            }
        }
    }

    fn read(&self, name: &str) -> Option<StoredValue> {
        self.store.get(name).unwrap_or_else(|e| {
            warn!(key = name, "Failed to read preference: {e}");
            None
        })
    }

    fn read_as<T: DefaultsValue>(&self, name: &str) -> Option<T> {
        let stored = self.read(name)?;
        let kind = stored.kind();
        let value = T::from_stored(stored);
        if value.is_none() {
            debug!(
                key = name,
                stored = kind,
                expected = std::any::type_name::<T>(),
                "Stored preference has a different shape"
            );
        }
        value
    }

    fn write(&self, name: &str, value: StoredValue) {
        if let Err(e) = self.store.set(name, value) {
            error!(key = name, "Failed to write preference: {e}");
            return;
        }
        self.after_write();
    }

    fn after_write(&self) {
        if self.synchronize_on_write {
            self.synchronize();
        }
    }
}

fn contract_violation(name: &str, error: ValueShapeError) {
    error!(key = name, %error, "Refusing to store a value of an unsupported shape");
    if cfg!(debug_assertions) {
        panic!("Invalid value type for key '{name}': {error}");
    }
}
