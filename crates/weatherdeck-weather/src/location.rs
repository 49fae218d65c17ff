//! Device position lookup.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use weatherdeck_core::LocationConfig;

use crate::error::GeolocationError;
use crate::types::Coordinates;

/// Single-shot position provider.
#[async_trait]
pub trait Geolocator: Send + Sync {
    async fn current_position(&self) -> Result<Coordinates, GeolocationError>;
}

/// Always reports the configured position.
#[derive(Debug, Clone, Copy)]
pub struct FixedGeolocator {
    position: Coordinates,
}

impl FixedGeolocator {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            position: Coordinates {
                latitude,
                longitude,
            },
        }
    }
}

#[async_trait]
impl Geolocator for FixedGeolocator {
    async fn current_position(&self) -> Result<Coordinates, GeolocationError> {
        Ok(self.position)
    }
}

/// Used when the host has no positioning support.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableGeolocator;

#[async_trait]
impl Geolocator for UnavailableGeolocator {
    async fn current_position(&self) -> Result<Coordinates, GeolocationError> {
        Err(GeolocationError::Unsupported)
    }
}

/// Pick a geolocator for the `[location]` section.
pub fn geolocator_from_config(config: &LocationConfig) -> Arc<dyn Geolocator> {
    match config.fixed_position() {
        Some((lat, lon)) => {
            tracing::debug!("Using configured position {}, {}", lat, lon);
            Arc::new(FixedGeolocator::new(lat, lon))
        }
        None => Arc::new(UnavailableGeolocator),
    }
}

/// Ask for a position, giving up after `limit`.
pub async fn locate_with_timeout(
    geolocator: &dyn Geolocator,
    limit: Duration,
) -> Result<Coordinates, GeolocationError> {
    match tokio::time::timeout(limit, geolocator.current_position()).await {
        Ok(result) => result,
        Err(_) => Err(GeolocationError::Timeout),
    }
}
