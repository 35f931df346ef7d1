//! Type-safe keys for preference storage.

use std::{
    fmt,
    hash::{Hash, Hasher},
    marker::PhantomData,
};

/// Register a type-safe preference key.
///
/// Associates a string key name with a value type at compile time, as a constant that can be
/// shared across the whole program.
///
/// # Example
/// ```rust
/// use typed_defaults::{register_defaults_key, UserDefaults};
///
/// register_defaults_key!(pub const LAUNCH_COUNT: i64 = "launch_count");
///
/// let defaults = UserDefaults::in_memory();
/// defaults.set(LAUNCH_COUNT, 1);
/// assert_eq!(defaults.get(LAUNCH_COUNT), 1);
/// ```
#[macro_export]
macro_rules! register_defaults_key {
    ($vis:vis const $name:ident: $ty:ty = $key:literal) => {
        $vis const $name: $crate::Key<$ty> = $crate::Key::new($key);
    };
}

/// Type-safe key for preference storage.
///
/// Associates a string key name with a value type at compile time, preventing type mismatches
/// while maintaining ergonomic usage. The type parameter has no runtime representation; it only
/// selects how [`UserDefaults`](crate::UserDefaults) encodes and decodes the stored value.
///
/// Two keys with the same name address the same slot in the store, whatever their types.
/// Keeping names unique is up to the caller.
///
/// # Example
/// ```rust
/// use typed_defaults::Key;
///
/// const USERNAME: Key<String> = Key::new("username");
/// assert_eq!(USERNAME.name(), "username");
/// ```
pub struct Key<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Key<T> {
    /// Create a new type-safe key with the given storage name.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    /// Get the string key name used for storage.
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

// Implemented by hand so that keys are `Copy` and comparable whatever `T` is.

impl<T> Clone for Key<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Key<T> {}

impl<T> PartialEq for Key<T> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl<T> Eq for Key<T> {}

impl<T> Hash for Key<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl<T> fmt::Debug for Key<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Key")
            .field("name", &self.name)
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}
