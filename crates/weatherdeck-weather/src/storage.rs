//! Persisted saved-city list.
//!
//! The list lives in a single string-keyed slot as a JSON array of
//! `{id, name}` objects. Every mutation rewrites the whole array.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use weatherdeck_core::error::RusqliteErrorExt;
use weatherdeck_core::StorageError;

use crate::migrate::{migrate_legacy, MigrationOutcome};
use crate::types::SavedCityRef;

/// Slot holding the saved city list.
pub const SAVED_CITIES_KEY: &str = "weather-cities";

/// String key-value storage with a get/set contract.
pub trait KeyValueStore: Send + Sync {
    /// Read a slot. Returns `None` if it was never written.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Overwrite a slot.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// SQLite-backed key-value store.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a store at the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StorageError::ConnectionFailed(e.to_string()))?;
        }
        let conn = Connection::open(path).map_err(|e| e.into_storage_error())?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store.
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory().map_err(|e| e.into_storage_error())?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), StorageError> {
        self.conn
            .lock()
            .execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS kv (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );
                "#,
            )
            .map_err(|e| e.into_storage_error())
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.conn
            .lock()
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()
            .map_err(|e| e.into_storage_error())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn
            .lock()
            .execute(
                "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
                params![key, value],
            )
            .map_err(|e| e.into_storage_error())?;
        Ok(())
    }
}

/// Process-local store, for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryStore {
    slots: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.slots.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.slots.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Typed access to the saved city list.
#[derive(Clone)]
pub struct SavedCityStore {
    store: Arc<dyn KeyValueStore>,
}

impl SavedCityStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Read the list. Content that does not decode is logged and treated
    /// as an empty list.
    pub fn load(&self) -> Result<Vec<SavedCityRef>, StorageError> {
        let Some(raw) = self.store.get(SAVED_CITIES_KEY)? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str::<Vec<SavedCityRef>>(&raw) {
            Ok(cities) => Ok(cities),
            Err(e) => {
                tracing::error!("Saved city list is unreadable, ignoring it: {}", e);
                Ok(Vec::new())
            }
        }
    }

    /// Overwrite the whole list.
    pub fn replace(&self, cities: &[SavedCityRef]) -> Result<(), StorageError> {
        let json =
            serde_json::to_string(cities).map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.store.set(SAVED_CITIES_KEY, &json)
    }

    /// Append one city (read-modify-write).
    pub fn append(&self, city: SavedCityRef) -> Result<(), StorageError> {
        let mut cities = self.load()?;
        cities.push(city);
        self.replace(&cities)
    }

    /// Remove every entry with this id. Missing ids are not an error.
    pub fn remove_by_id(&self, id: i64) -> Result<(), StorageError> {
        let mut cities = self.load()?;
        cities.retain(|c| c.id != id);
        self.replace(&cities)
    }

    /// Rewrite legacy string-array content in place.
    pub fn migrate(&self) -> Result<MigrationOutcome, StorageError> {
        migrate_legacy(self.store.as_ref())
    }
}
