#![doc = include_str!("../README.md")]

mod configuration;
mod memory;
mod sqlite;
mod store;
mod value;

pub use configuration::{open_store, StoreConfiguration};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use store::{PreferenceStore, StoreError};
pub use value::StoredValue;

/// Domain used when the application does not name one.
pub const DEFAULT_DOMAIN: &str = "default";
