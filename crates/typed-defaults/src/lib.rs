#![doc = include_str!("../README.md")]

mod defaults;
mod key;
mod object;
mod settings;
mod value;

pub use defaults::UserDefaults;
pub use key::Key;
pub use object::{Shape, Value, ValueShapeError};
pub use settings::DefaultsSettings;
pub use value::{Data, DefaultsValue, Element, EncodeError, Fallback, Json, PLACEHOLDER_URL};

// The store boundary, so that most users only need this crate.
pub use typed_defaults_store::{
    MemoryStore, PreferenceStore, SqliteStore, StoreConfiguration, StoreError, StoredValue,
    DEFAULT_DOMAIN,
};
pub use url::Url;
