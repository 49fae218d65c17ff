//! Tracked cities and their current conditions.
//!
//! `CityWeatherAggregator` owns the in-memory conditions list and the
//! persisted saved-city list and keeps them in step. Reads are synchronous
//! snapshots; mutations are async. State is never locked across an
//! `.await`, so a duplicate check and the append that follows it are not
//! atomic against a concurrent add of the same name.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use weatherdeck_core::{Config, StorageError};

use crate::client::{OpenWeatherClient, WeatherSource};
use crate::error::WeatherError;
use crate::error_slot::ErrorSlot;
use crate::location::{geolocator_from_config, locate_with_timeout, Geolocator};
use crate::migrate::MigrationOutcome;
use crate::storage::{KeyValueStore, SavedCityStore, SqliteStore};
use crate::types::{CurrentConditions, LoadState, SavedCityRef};

const DEFAULT_LOCATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome of a bulk load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Cities whose conditions were fetched.
    pub loaded: usize,
    /// Entries skipped because their id is the sentinel.
    pub skipped: usize,
    /// Names of cities whose fetch failed, in input order.
    pub failed: Vec<String>,
}

impl LoadReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Default)]
struct AggregatorState {
    cities: Vec<CurrentConditions>,
    error: ErrorSlot,
    in_flight: usize,
    settled: bool,
}

/// Marks an operation as in flight until dropped.
struct LoadingGuard<'a> {
    state: &'a Mutex<AggregatorState>,
}

impl<'a> LoadingGuard<'a> {
    fn enter(state: &'a Mutex<AggregatorState>) -> Self {
        state.lock().in_flight += 1;
        Self { state }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        state.in_flight = state.in_flight.saturating_sub(1);
        state.settled = true;
    }
}

pub struct CityWeatherAggregator {
    source: Arc<dyn WeatherSource>,
    geolocator: Arc<dyn Geolocator>,
    saved: SavedCityStore,
    location_timeout: Duration,
    state: Mutex<AggregatorState>,
}

impl CityWeatherAggregator {
    pub fn new(
        source: Arc<dyn WeatherSource>,
        geolocator: Arc<dyn Geolocator>,
        saved: SavedCityStore,
    ) -> Self {
        Self {
            source,
            geolocator,
            saved,
            location_timeout: DEFAULT_LOCATION_TIMEOUT,
            state: Mutex::new(AggregatorState::default()),
        }
    }

    /// Wire up the upstream client, SQLite store and geolocator from
    /// configuration.
    pub fn from_config(config: &Config) -> Result<Self, WeatherError> {
        let source = Arc::new(OpenWeatherClient::new(&config.api)?);
        let store: Arc<dyn KeyValueStore> = Arc::new(SqliteStore::new(config.database_path())?);
        let geolocator = geolocator_from_config(&config.location);

        Ok(Self::new(source, geolocator, SavedCityStore::new(store))
            .with_location_timeout(Duration::from_secs(config.location.timeout_secs))
            .with_error_dismiss(Duration::from_secs(config.ui.error_dismiss_secs)))
    }

    pub fn with_location_timeout(mut self, timeout: Duration) -> Self {
        self.location_timeout = timeout;
        self
    }

    pub fn with_error_dismiss(self, dismiss_after: Duration) -> Self {
        self.state.lock().error = ErrorSlot::with_dismiss_after(dismiss_after);
        self
    }

    /// Snapshot of the tracked cities, in display order.
    pub fn cities(&self) -> Vec<CurrentConditions> {
        self.state.lock().cities.clone()
    }

    /// Current error message, if any.
    pub fn error(&self) -> Option<String> {
        self.state.lock().error.current().map(str::to_string)
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().in_flight > 0
    }

    pub fn load_state(&self) -> LoadState {
        let state = self.state.lock();
        if state.in_flight > 0 {
            LoadState::Loading
        } else if state.error.current().is_some() {
            LoadState::Error
        } else if state.settled {
            LoadState::Ready
        } else {
            LoadState::Idle
        }
    }

    pub fn saved_cities(&self) -> &SavedCityStore {
        &self.saved
    }

    pub fn clear_error(&self) {
        self.state.lock().error.clear();
    }

    /// Dismiss the error message if it has been shown long enough.
    pub fn expire_error(&self, now: Instant) -> bool {
        self.state.lock().error.expire(now)
    }

    fn report(&self, error: &WeatherError) {
        self.state.lock().error.set(error.to_string());
    }

    fn storage_failure(&self, error: StorageError) -> WeatherError {
        tracing::error!("Saved city update failed: {}", error);
        let error = WeatherError::from(error);
        self.report(&error);
        error
    }

    /// Migrate the persisted list if needed, then bulk-load it.
    pub async fn load_from_store(&self) -> Result<LoadReport, WeatherError> {
        let cities = match self.saved.migrate() {
            Ok(MigrationOutcome::Failed(reason)) => {
                // Unreadable saved data starts the session with an empty list.
                let error = WeatherError::Migration(reason);
                tracing::error!("{:?}", error);
                Vec::new()
            }
            Ok(_) => self.saved.load().map_err(|e| self.storage_failure(e))?,
            Err(e) => return Err(self.storage_failure(e)),
        };

        self.load_saved(&cities).await
    }

    /// Fetch current conditions for every resolved saved city.
    ///
    /// Requests run concurrently and every one is awaited; a failure never
    /// cancels the others. The in-memory list is replaced with the
    /// successes in input order. If any fetch failed, the error message
    /// names all failed cities. The persisted list is not touched.
    pub async fn load_saved(&self, cities: &[SavedCityRef]) -> Result<LoadReport, WeatherError> {
        if cities.is_empty() {
            return Ok(LoadReport::default());
        }

        let valid: Vec<&SavedCityRef> = cities.iter().filter(|c| c.is_resolved()).collect();
        let skipped = cities.len() - valid.len();
        if valid.is_empty() {
            tracing::debug!("No resolved saved cities to load ({} skipped)", skipped);
            return Ok(LoadReport {
                skipped,
                ..LoadReport::default()
            });
        }

        let _guard = LoadingGuard::enter(&self.state);
        tracing::info!("Loading {} saved cities", valid.len());

        let mut handles = Vec::with_capacity(valid.len());
        for city in &valid {
            let source = Arc::clone(&self.source);
            let name = city.name.clone();
            handles.push(tokio::spawn(async move {
                source.current_by_name(&name).await
            }));
        }

        let mut loaded = Vec::with_capacity(valid.len());
        let mut failed = Vec::new();
        let mut pending = handles.into_iter();

        for city in &valid {
            let Some(handle) = pending.next() else {
                break;
            };
            match handle.await {
                Ok(Ok(data)) => {
                    tracing::debug!("Loaded {} (id {})", data.name, data.id);
                    loaded.push(data);
                }
                Ok(Err(e)) => {
                    tracing::warn!("Failed to load {}: {:?}", city.name, e);
                    failed.push(city.name.clone());
                }
                Err(join_error) => {
                    for rest in pending.by_ref() {
                        rest.abort();
                    }
                    tracing::error!("Saved city load aborted: {}", join_error);
                    let error = WeatherError::LoadAborted(join_error.to_string());
                    self.report(&error);
                    return Err(error);
                }
            }
        }

        let report = LoadReport {
            loaded: loaded.len(),
            skipped,
            failed,
        };

        let mut state = self.state.lock();
        state.cities = loaded;
        if !report.is_complete() {
            let error = WeatherError::PartialLoad(report.failed.clone());
            tracing::warn!("{}", error);
            state.error.set(error.to_string());
        }

        Ok(report)
    }

    /// Add a city by name.
    ///
    /// Returns `Ok(false)` without any request if the name is already
    /// tracked (case-insensitive). Fetch failures are reported in the
    /// error message and returned to the caller.
    pub async fn add_city(&self, name: &str) -> Result<bool, WeatherError> {
        if self.is_tracked(name) {
            self.report(&WeatherError::Duplicate(name.to_string()));
            return Ok(false);
        }

        let _guard = LoadingGuard::enter(&self.state);
        let data = match self.source.current_by_name(name).await {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!("Adding {} failed: {:?}", name, e);
                self.report(&e);
                return Err(e);
            }
        };

        self.track(data)?;
        Ok(true)
    }

    /// Add the city at the device's current position.
    ///
    /// Resolves to the city name, or `None` if that city is already tracked
    /// (the duplicate message is still reported).
    pub async fn add_current_location(&self) -> Result<Option<String>, WeatherError> {
        let position = match locate_with_timeout(self.geolocator.as_ref(), self.location_timeout)
            .await
        {
            Ok(position) => position,
            Err(e) => {
                tracing::warn!("Geolocation failed with code {}", e.code());
                let error = WeatherError::from(e);
                self.report(&error);
                return Err(error);
            }
        };

        let _guard = LoadingGuard::enter(&self.state);
        let data = match self
            .source
            .current_by_coords(position.latitude, position.longitude)
            .await
        {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!("Weather for current position failed: {:?}", e);
                self.report(&e);
                return Err(e);
            }
        };

        if self.is_tracked(&data.name) {
            self.report(&WeatherError::Duplicate(data.name.clone()));
            return Ok(None);
        }

        let name = data.name.clone();
        self.track(data)?;
        Ok(Some(name))
    }

    /// Remove a city from both lists. Unknown ids are a no-op.
    pub fn remove_city(&self, id: i64) -> Result<(), WeatherError> {
        self.saved
            .remove_by_id(id)
            .map_err(|e| self.storage_failure(e))?;
        self.state.lock().cities.retain(|c| c.id != id);
        tracing::info!("Removed city {}", id);
        Ok(())
    }

    fn is_tracked(&self, name: &str) -> bool {
        self.state.lock().cities.iter().any(|c| c.has_name(name))
    }

    /// Persist, then append to the in-memory list. A failed write leaves
    /// both lists unchanged.
    fn track(&self, data: CurrentConditions) -> Result<(), WeatherError> {
        let saved_ref = data.saved_ref();
        self.saved
            .append(saved_ref.clone())
            .map_err(|e| self.storage_failure(e))?;
        self.state.lock().cities.push(data);
        tracing::info!("Added {} (id {})", saved_ref.name, saved_ref.id);
        Ok(())
    }
}
