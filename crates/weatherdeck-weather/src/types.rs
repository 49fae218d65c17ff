use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Id of a saved city whose upstream numeric id is not known yet.
pub const SENTINEL_CITY_ID: i64 = 0;

/// One weather condition as reported upstream (`weather[]` element).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub id: i64,
    /// Condition category, e.g. "Rain", "Clear", "Clouds"
    pub main: String,
    pub description: String,
    /// Icon code, e.g. "10d"
    pub icon: String,
}

/// Temperature/pressure/humidity block shared by current and forecast data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MainReadings {
    pub temp: f64,
    pub feels_like: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub pressure: f64,
    pub humidity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sea_level: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grnd_level: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    pub speed: f64,
    #[serde(default)]
    pub deg: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gust: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Clouds {
    #[serde(default)]
    pub all: f64,
}

/// `sys` block. Forecast entries usually carry only a day/night marker,
/// so every field is optional and zero means "absent".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SunTimes {
    #[serde(default)]
    pub country: String,
    /// Unix timestamp (seconds)
    #[serde(default)]
    pub sunrise: i64,
    /// Unix timestamp (seconds)
    #[serde(default)]
    pub sunset: i64,
}

impl SunTimes {
    /// True if at least one of sunrise/sunset is present.
    pub fn has_sun_data(&self) -> bool {
        self.sunrise != 0 || self.sunset != 0
    }
}

/// Current conditions for one city (`GET /weather`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub weather: Vec<Condition>,
    pub main: MainReadings,
    #[serde(default)]
    pub visibility: f64,
    pub wind: Wind,
    #[serde(default)]
    pub clouds: Clouds,
    /// Observation time (unix seconds)
    pub dt: i64,
    #[serde(default)]
    pub sys: SunTimes,
    /// Shift from UTC in seconds
    #[serde(default)]
    pub timezone: i64,
    pub id: i64,
    pub name: String,
}

impl CurrentConditions {
    /// Primary condition, if the upstream reported any.
    pub fn condition(&self) -> Option<&Condition> {
        self.weather.first()
    }

    /// Reference persisted for this city.
    pub fn saved_ref(&self) -> SavedCityRef {
        SavedCityRef {
            id: self.id,
            name: self.name.clone(),
        }
    }

    /// Case-insensitive name match used for duplicate detection.
    pub fn has_name(&self, name: &str) -> bool {
        same_city_name(&self.name, name)
    }
}

/// One 3-hour forecast sample (`list[]` element of `GET /forecast`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    /// Sample time (unix seconds)
    pub dt: i64,
    pub main: MainReadings,
    pub weather: Vec<Condition>,
    #[serde(default)]
    pub clouds: Clouds,
    pub wind: Wind,
    #[serde(default)]
    pub visibility: f64,
    #[serde(default)]
    pub dt_txt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sys: Option<SunTimes>,
}

impl ForecastEntry {
    pub fn condition(&self) -> Option<&Condition> {
        self.weather.first()
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.dt, 0).unwrap_or_default()
    }

    /// Embedded sunrise/sunset, if this entry carries any.
    pub fn sun_times(&self) -> Option<&SunTimes> {
        self.sys.as_ref().filter(|s| s.has_sun_data())
    }
}

/// City block of the forecast response; its sun times apply to "today".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastCity {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub timezone: i64,
    #[serde(default)]
    pub sunrise: i64,
    #[serde(default)]
    pub sunset: i64,
}

/// Five-day forecast (`GET /forecast`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResponse {
    pub list: Vec<ForecastEntry>,
    pub city: ForecastCity,
}

/// Persisted reference to a tracked city.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedCityRef {
    pub id: i64,
    pub name: String,
}

impl SavedCityRef {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// False for the sentinel id, which bulk loading skips.
    pub fn is_resolved(&self) -> bool {
        self.id != SENTINEL_CITY_ID
    }
}

/// Geographic position reported by a geolocator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Progress of a fetch: `idle -> loading -> (ready | error)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Ready,
    Error,
}

/// Duplicate rule: plain lower-casing on both sides, no locale folding.
pub fn same_city_name(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}
