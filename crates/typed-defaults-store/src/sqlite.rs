use std::{
    collections::BTreeMap,
    path::Path,
    sync::{Mutex, MutexGuard},
};

use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::{
    store::{validate_domain, PreferenceStore, StoreError},
    StoredValue,
};

/// Preference storage backed by a SQLite database.
///
/// All domains share a single `preferences` table keyed by `(domain, key)`, so several
/// applications (or several users of one application) can keep their preferences in one file.
/// Values are stored as the JSON encoding of [`StoredValue`].
pub struct SqliteStore {
    connection: Mutex<Connection>,
    domain: String,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("domain", &self.domain)
            .finish()
    }
}

impl SqliteStore {
    /// Opens (creating if needed) the database at `path` and scopes the store to `domain`.
    pub fn open(path: impl AsRef<Path>, domain: impl Into<String>) -> Result<Self, StoreError> {
        // Checked before anything is created on disk.
        let domain = domain.into();
        validate_domain(&domain)?;

        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let connection = Connection::open(path)?;

        // Set WAL mode for better concurrency
        let mode: String = connection.pragma_update_and_check(
            None,
            "journal_mode",
            "WAL",
            |row| row.get(0),
        )?;
        debug!(path = %path.display(), mode = %mode, "Opened preference database");

        Self::initialize(connection, domain)
    }

    /// Opens a private, non-persistent database scoped to `domain`.
    pub fn open_in_memory(domain: impl Into<String>) -> Result<Self, StoreError> {
        Self::initialize(Connection::open_in_memory()?, domain.into())
    }

    fn initialize(connection: Connection, domain: String) -> Result<Self, StoreError> {
        validate_domain(&domain)?;

        connection.execute(
            "CREATE TABLE IF NOT EXISTS preferences (
                domain TEXT NOT NULL,
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                PRIMARY KEY (domain, key)
            )",
            [],
        )?;

        Ok(SqliteStore {
            connection: Mutex::new(connection),
            domain,
        })
    }

    fn connection(&self) -> MutexGuard<'_, Connection> {
        self.connection
            .lock()
            .expect("Mutex should not be poisoned")
    }
}

impl PreferenceStore for SqliteStore {
    fn domain(&self) -> &str {
        &self.domain
    }

    fn get(&self, key: &str) -> Result<Option<StoredValue>, StoreError> {
        let conn = self.connection();
        let value: Option<String> = conn
            .query_row(
                "SELECT value FROM preferences WHERE domain = ?1 AND key = ?2",
                params![self.domain, key],
                |row| row.get(0),
            )
            .optional()?;

        match value {
            Some(value) => Ok(Some(serde_json::from_str(&value)?)),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: StoredValue) -> Result<(), StoreError> {
        let value = serde_json::to_string(&value)?;

        self.connection().execute(
            "INSERT OR REPLACE INTO preferences (domain, key, value) VALUES (?1, ?2, ?3)",
            params![self.domain, key, value],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.connection().execute(
            "DELETE FROM preferences WHERE domain = ?1 AND key = ?2",
            params![self.domain, key],
        )?;
        Ok(())
    }

    fn remove_all(&self) -> Result<(), StoreError> {
        let removed = self.connection().execute(
            "DELETE FROM preferences WHERE domain = ?1",
            params![self.domain],
        )?;
        debug!(domain = %self.domain, removed, "Removed preference domain");
        Ok(())
    }

    fn entries(&self) -> Result<BTreeMap<String, StoredValue>, StoreError> {
        let conn = self.connection();
        let mut stmt =
            conn.prepare("SELECT key, value FROM preferences WHERE domain = ?1 ORDER BY key")?;
        let rows = stmt.query_map(params![self.domain], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut entries = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            entries.insert(key, serde_json::from_str(&value)?);
        }

        Ok(entries)
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        let conn = self.connection();
        let mut stmt = conn.prepare("SELECT key FROM preferences WHERE domain = ?1 ORDER BY key")?;
        let keys = stmt
            .query_map(params![self.domain], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        Ok(keys)
    }

    fn synchronize(&self) -> Result<(), StoreError> {
        // The checkpoint reports (busy, log frames, checkpointed frames); none of them matter here.
        self.connection()
            .query_row("PRAGMA wal_checkpoint(FULL)", [], |_| Ok(()))?;
        Ok(())
    }
}
