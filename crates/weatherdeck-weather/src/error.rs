//! Weather-specific error types.
//!
//! `Display` of every variant is the localized message shown to the user;
//! technical detail is kept in fields for logging.

use thiserror::Error;
use weatherdeck_core::{AppError, StorageError};

/// Upstream endpoint a request was made against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    CurrentByName,
    CurrentByCoords,
    Forecast,
}

impl Endpoint {
    /// Generic failure message for this endpoint.
    pub fn failure_message(&self) -> &'static str {
        match self {
            Endpoint::CurrentByName => "Hava durumu verisi alınamadı",
            Endpoint::CurrentByCoords => "Konumun hava durumu alınamadı",
            Endpoint::Forecast => "Hava tahmini alınamadı",
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::CurrentByName | Endpoint::CurrentByCoords => "weather",
            Endpoint::Forecast => "forecast",
        }
    }
}

/// Geolocation failures, mirroring the platform error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GeolocationError {
    #[error("Konum erişimi reddedildi. Lütfen tarayıcı ayarlarından izin verin.")]
    PermissionDenied,
    #[error("Konum bilgisi alınamadı. Lütfen internet bağlantınızı kontrol edin.")]
    PositionUnavailable,
    #[error("Konum bilgisi almak zaman aşımına uğradı.")]
    Timeout,
    #[error("Konum bilgisi alınamadı.")]
    Unsupported,
}

impl GeolocationError {
    /// Map a platform code (1 denied, 2 unavailable, 3 timeout).
    pub fn from_code(code: u16) -> Self {
        match code {
            1 => Self::PermissionDenied,
            2 => Self::PositionUnavailable,
            3 => Self::Timeout,
            _ => Self::Unsupported,
        }
    }

    pub fn code(&self) -> u16 {
        match self {
            Self::PermissionDenied => 1,
            Self::PositionUnavailable => 2,
            Self::Timeout => 3,
            Self::Unsupported => 0,
        }
    }
}

/// Error category, for callers that branch on the kind of failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeatherErrorKind {
    NotFound,
    Unauthorized,
    NetworkOrUnknown,
    Duplicate,
    GeolocationDenied,
    GeolocationUnavailable,
    GeolocationTimeout,
    Storage,
    Migration,
}

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Şehir bulunamadı")]
    NotFound,

    #[error("API anahtarı geçersiz")]
    Unauthorized,

    #[error("{}", .endpoint.failure_message())]
    Upstream { endpoint: Endpoint, detail: String },

    #[error("{0} zaten listede mevcut")]
    Duplicate(String),

    #[error(transparent)]
    Geolocation(#[from] GeolocationError),

    #[error("{} şehirleri yüklenemedi", .0.join(", "))]
    PartialLoad(Vec<String>),

    #[error("Şehirler yüklenirken genel bir hata oluştu")]
    LoadAborted(String),

    #[error("Kayıtlı şehirler güncellenemedi")]
    Storage(#[from] StorageError),

    #[error("Kayıtlı şehir verisi okunamadı")]
    Migration(String),
}

impl WeatherError {
    pub fn upstream(endpoint: Endpoint, detail: impl Into<String>) -> Self {
        Self::Upstream {
            endpoint,
            detail: detail.into(),
        }
    }

    pub fn kind(&self) -> WeatherErrorKind {
        match self {
            Self::NotFound => WeatherErrorKind::NotFound,
            Self::Unauthorized => WeatherErrorKind::Unauthorized,
            Self::Upstream { .. } | Self::PartialLoad(_) | Self::LoadAborted(_) => {
                WeatherErrorKind::NetworkOrUnknown
            }
            Self::Duplicate(_) => WeatherErrorKind::Duplicate,
            Self::Geolocation(GeolocationError::PermissionDenied) => {
                WeatherErrorKind::GeolocationDenied
            }
            Self::Geolocation(GeolocationError::Timeout) => WeatherErrorKind::GeolocationTimeout,
            Self::Geolocation(_) => WeatherErrorKind::GeolocationUnavailable,
            Self::Storage(_) => WeatherErrorKind::Storage,
            Self::Migration(_) => WeatherErrorKind::Migration,
        }
    }

    /// Whether this error came from talking to the upstream API.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            Self::NotFound | Self::Unauthorized | Self::Upstream { .. } | Self::PartialLoad(_)
        )
    }
}

impl From<WeatherError> for AppError {
    fn from(e: WeatherError) -> Self {
        match e {
            WeatherError::Storage(inner) => AppError::Storage(inner),
            other => AppError::Weather(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_messages() {
        assert_eq!(WeatherError::NotFound.to_string(), "Şehir bulunamadı");
        assert_eq!(WeatherError::Unauthorized.to_string(), "API anahtarı geçersiz");
    }

    #[test]
    fn test_upstream_message_is_endpoint_specific() {
        let by_name = WeatherError::upstream(Endpoint::CurrentByName, "500");
        let by_coords = WeatherError::upstream(Endpoint::CurrentByCoords, "500");
        let forecast = WeatherError::upstream(Endpoint::Forecast, "500");
        assert_eq!(by_name.to_string(), "Hava durumu verisi alınamadı");
        assert_eq!(by_coords.to_string(), "Konumun hava durumu alınamadı");
        assert_eq!(forecast.to_string(), "Hava tahmini alınamadı");
    }

    #[test]
    fn test_duplicate_message() {
        let err = WeatherError::Duplicate("Ankara".into());
        assert_eq!(err.to_string(), "Ankara zaten listede mevcut");
        assert_eq!(err.kind(), WeatherErrorKind::Duplicate);
        assert!(!err.is_network());
    }

    #[test]
    fn test_partial_load_names_every_city() {
        let err = WeatherError::PartialLoad(vec!["Ankara".into(), "Izmir".into()]);
        assert_eq!(err.to_string(), "Ankara, Izmir şehirleri yüklenemedi");
    }

    #[test]
    fn test_geolocation_codes() {
        assert_eq!(GeolocationError::from_code(1), GeolocationError::PermissionDenied);
        assert_eq!(GeolocationError::from_code(2), GeolocationError::PositionUnavailable);
        assert_eq!(GeolocationError::from_code(3), GeolocationError::Timeout);
        assert_eq!(GeolocationError::from_code(42), GeolocationError::Unsupported);
        assert_eq!(
            GeolocationError::Timeout.to_string(),
            "Konum bilgisi almak zaman aşımına uğradı."
        );
    }

    #[test]
    fn test_geolocation_kinds() {
        let denied: WeatherError = GeolocationError::PermissionDenied.into();
        assert_eq!(denied.kind(), WeatherErrorKind::GeolocationDenied);
        let unavailable: WeatherError = GeolocationError::PositionUnavailable.into();
        assert_eq!(unavailable.kind(), WeatherErrorKind::GeolocationUnavailable);
        assert_eq!(
            unavailable.to_string(),
            "Konum bilgisi alınamadı. Lütfen internet bağlantınızı kontrol edin."
        );
    }

    #[test]
    fn test_app_error_conversion() {
        let app: AppError = WeatherError::NotFound.into();
        assert_eq!(app.user_message(), "Şehir bulunamadı");

        let app: AppError = WeatherError::Storage(StorageError::QueryFailed("x".into())).into();
        assert!(matches!(app, AppError::Storage(_)));
    }
}
