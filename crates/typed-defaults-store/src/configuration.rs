use std::{path::PathBuf, sync::Arc};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{MemoryStore, PreferenceStore, SqliteStore, StoreError};

/// Configuration for the storage backing a preference domain.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, JsonSchema, Default)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum StoreConfiguration {
    /// Keep preferences in memory for the lifetime of the process.
    #[default]
    InMemory,

    /// SQLite configuration, persisted to a file.
    Sqlite {
        /// The file path to the SQLite database. The file is created if it does not exist, and
        /// may be shared between domains.
        #[serde(rename = "filePath")]
        file_path: PathBuf,
    },
}

/// Open the store described by `configuration`, scoped to `domain`.
pub fn open_store(
    configuration: StoreConfiguration,
    domain: &str,
) -> Result<Arc<dyn PreferenceStore>, StoreError> {
    match configuration {
        StoreConfiguration::InMemory => Ok(Arc::new(MemoryStore::new(domain)?)),
        StoreConfiguration::Sqlite { file_path } => {
            Ok(Arc::new(SqliteStore::open(file_path, domain)?))
        }
    }
}
