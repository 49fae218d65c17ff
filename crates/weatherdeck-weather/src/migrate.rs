//! One-time migration of the legacy saved-city format.
//!
//! Older versions persisted a plain array of city names
//! (`["Ankara","Izmir"]`). Current versions store `{id, name}` objects.

use serde_json::Value;
use weatherdeck_core::StorageError;

use crate::storage::{KeyValueStore, SAVED_CITIES_KEY};
use crate::types::SavedCityRef;

/// Result of a migration run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// Nothing stored yet.
    Empty,
    /// Already in the current format; nothing written.
    AlreadyCurrent,
    /// Legacy names rewritten as `{id: index, name}`.
    Migrated(usize),
    /// Content is neither format. Left untouched.
    Failed(String),
}

impl MigrationOutcome {
    pub fn changed(&self) -> bool {
        matches!(self, Self::Migrated(_))
    }
}

impl std::fmt::Display for MigrationOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "Migration skipped: no saved cities"),
            Self::AlreadyCurrent => write!(f, "Migration skipped: saved cities already current"),
            Self::Migrated(n) => write!(f, "Migration complete: {} cities migrated", n),
            Self::Failed(reason) => write!(f, "Migration failed: {}", reason),
        }
    }
}

/// Rewrite a legacy string array in place.
///
/// # Behavior
/// - Legacy names get `id = index` in their original order.
/// - Already-migrated content is not rewritten, so running twice is a no-op.
/// - Malformed content is logged and reported as `Failed`; the slot keeps
///   its bytes.
///
/// Only storage read/write failures are returned as errors.
pub fn migrate_legacy(store: &dyn KeyValueStore) -> Result<MigrationOutcome, StorageError> {
    let Some(raw) = store.get(SAVED_CITIES_KEY)? else {
        return Ok(MigrationOutcome::Empty);
    };

    let outcome = match classify(&raw) {
        Ok(Some(names)) => {
            let migrated: Vec<SavedCityRef> = names
                .into_iter()
                .enumerate()
                .map(|(index, name)| SavedCityRef::new(index as i64, name))
                .collect();
            let json = serde_json::to_string(&migrated)
                .map_err(|e| StorageError::Serialization(e.to_string()))?;
            store.set(SAVED_CITIES_KEY, &json)?;
            MigrationOutcome::Migrated(migrated.len())
        }
        Ok(None) => MigrationOutcome::AlreadyCurrent,
        Err(reason) => {
            tracing::error!("Migration error: {}", reason);
            MigrationOutcome::Failed(reason)
        }
    };

    if outcome.changed() {
        tracing::info!("{}", outcome);
    } else {
        tracing::debug!("{}", outcome);
    }
    Ok(outcome)
}

/// `Ok(Some(names))` for legacy content, `Ok(None)` for current content.
fn classify(raw: &str) -> Result<Option<Vec<String>>, String> {
    let value: Value = serde_json::from_str(raw).map_err(|e| format!("invalid JSON: {}", e))?;

    let Value::Array(items) = value else {
        return Err("saved cities are not an array".to_string());
    };

    if items.is_empty() {
        return Ok(None);
    }

    if items.iter().all(Value::is_string) {
        let names = items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(name) => Some(name),
                _ => None,
            })
            .collect();
        return Ok(Some(names));
    }

    serde_json::from_value::<Vec<SavedCityRef>>(Value::Array(items))
        .map(|_| None)
        .map_err(|e| format!("unrecognized saved city entry: {}", e))
}
