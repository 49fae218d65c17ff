//! Weather tracking for WeatherDeck
//!
//! Fetches current conditions and five-day forecasts from OpenWeather,
//! keeps the user's saved city list in a local key-value store and
//! aggregates forecast samples into per-day summaries.

pub mod cities;
pub mod client;
pub mod display;
pub mod error;
pub mod error_slot;
pub mod forecast;
pub mod location;
pub mod migrate;
pub mod storage;
pub mod types;

pub use cities::{CityWeatherAggregator, LoadReport};
pub use client::{OpenWeatherClient, WeatherSource};
pub use error::{Endpoint, GeolocationError, WeatherError, WeatherErrorKind};
pub use error_slot::ErrorSlot;
pub use forecast::{
    ChartSeries, DayGroup, DaySummary, DayTab, ForecastDayAggregator, ForecastSession,
};
pub use location::{geolocator_from_config, FixedGeolocator, Geolocator, UnavailableGeolocator};
pub use migrate::{migrate_legacy, MigrationOutcome};
pub use storage::{KeyValueStore, MemoryStore, SavedCityStore, SqliteStore, SAVED_CITIES_KEY};
pub use types::*;
