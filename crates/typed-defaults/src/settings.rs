use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use typed_defaults_store::{StoreConfiguration, DEFAULT_DOMAIN};

/// Settings used by [`UserDefaults::open`](crate::UserDefaults::open). They are fixed once the
/// accessor is opened.
///
/// Defaults to
///
/// ```
/// # use typed_defaults::{DefaultsSettings, StoreConfiguration};
/// let settings = DefaultsSettings {
///     domain: "default".to_string(),
///     store: StoreConfiguration::InMemory,
///     synchronize_on_write: false,
/// };
/// assert_eq!(settings, DefaultsSettings::default());
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct DefaultsSettings {
    /// The application's namespace in the store, typically a reverse-DNS identifier. Defaults to
    /// `default`.
    pub domain: String,
    /// Where the preferences are kept. Defaults to memory.
    pub store: StoreConfiguration,
    /// Flush the store after every mutation. Defaults to `false`.
    pub synchronize_on_write: bool,
}

impl Default for DefaultsSettings {
    fn default() -> Self {
        Self {
            domain: DEFAULT_DOMAIN.to_string(),
            store: StoreConfiguration::InMemory,
            synchronize_on_write: false,
        }
    }
}
