//! OpenWeather API client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::instrument;
use weatherdeck_core::ApiConfig;

use crate::error::{Endpoint, WeatherError};
use crate::types::{CurrentConditions, ForecastResponse};

/// Source of current conditions and forecasts.
///
/// The aggregators only see this trait, so tests can swap in a fake.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// Current conditions for a city name (`GET /weather?q=`).
    async fn current_by_name(&self, city: &str) -> Result<CurrentConditions, WeatherError>;

    /// Current conditions for coordinates (`GET /weather?lat=&lon=`).
    async fn current_by_coords(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<CurrentConditions, WeatherError>;

    /// Five-day, 3-hour forecast for a city name (`GET /forecast?q=`).
    async fn forecast_by_name(&self, city: &str) -> Result<ForecastResponse, WeatherError>;
}

pub struct OpenWeatherClient {
    client: Client,
    base_url: String,
    api_key: String,
    units: &'static str,
}

impl OpenWeatherClient {
    /// Build a client from the `[api]` configuration section.
    pub fn new(config: &ApiConfig) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| WeatherError::upstream(Endpoint::CurrentByName, e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            units: config.units.as_str(),
        })
    }

    /// Client against an explicit base URL, metric units.
    pub fn with_base_url(base_url: &str, api_key: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            units: "metric",
        }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        params: &[(&str, String)],
    ) -> Result<T, WeatherError> {
        let url = format!("{}/{}", self.base_url, endpoint.path());
        tracing::debug!("GET {} {:?}", url, params);

        let response = self
            .client
            .get(&url)
            .query(params)
            .query(&[("appid", self.api_key.as_str()), ("units", self.units)])
            .send()
            .await
            .map_err(|e| WeatherError::upstream(endpoint, e.without_url().to_string()))?;

        Self::handle_response(endpoint, response).await
    }

    async fn handle_response<T: DeserializeOwned>(
        endpoint: Endpoint,
        response: reqwest::Response,
    ) -> Result<T, WeatherError> {
        let status = response.status();

        if status.is_success() {
            response.json().await.map_err(|e| {
                let detail = format!("JSON parse error: {}", e.without_url());
                WeatherError::upstream(endpoint, detail)
            })
        } else if status == StatusCode::NOT_FOUND {
            Err(WeatherError::NotFound)
        } else if status == StatusCode::UNAUTHORIZED {
            Err(WeatherError::Unauthorized)
        } else {
            let text = response.text().await.unwrap_or_default();
            tracing::warn!("{} request failed with {}: {}", endpoint.path(), status, text);
            Err(WeatherError::upstream(endpoint, format!("{}: {}", status, text)))
        }
    }
}

#[async_trait]
impl WeatherSource for OpenWeatherClient {
    #[instrument(skip(self), level = "debug")]
    async fn current_by_name(&self, city: &str) -> Result<CurrentConditions, WeatherError> {
        self.get(Endpoint::CurrentByName, &[("q", city.to_string())])
            .await
    }

    #[instrument(skip(self), level = "debug")]
    async fn current_by_coords(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<CurrentConditions, WeatherError> {
        self.get(
            Endpoint::CurrentByCoords,
            &[("lat", latitude.to_string()), ("lon", longitude.to_string())],
        )
        .await
    }

    #[instrument(skip(self), level = "debug")]
    async fn forecast_by_name(&self, city: &str) -> Result<ForecastResponse, WeatherError> {
        self.get(Endpoint::Forecast, &[("q", city.to_string())]).await
    }
}
