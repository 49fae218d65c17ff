//! Integration tests for OpenWeatherClient using wiremock.
//!
//! These tests run the client and the city aggregator against a mock
//! OpenWeather server.

use std::sync::Arc;

use weatherdeck_core::Config;
use weatherdeck_weather::{
    CityWeatherAggregator, ForecastSession, LoadState, MemoryStore, OpenWeatherClient,
    SavedCityRef, SavedCityStore, UnavailableGeolocator, WeatherError, WeatherSource,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper to create a current-conditions JSON body
fn current_json(id: i64, name: &str, temp: f64) -> serde_json::Value {
    serde_json::json!({
        "coord": {"lon": 32.85, "lat": 39.92},
        "weather": [{"id": 800, "main": "Clear", "description": "clear sky", "icon": "01d"}],
        "main": {
            "temp": temp, "feels_like": temp - 1.0, "temp_min": temp - 2.0,
            "temp_max": temp + 2.0, "pressure": 1016, "humidity": 45
        },
        "visibility": 10000,
        "wind": {"speed": 3.6, "deg": 220},
        "clouds": {"all": 0},
        "dt": 1_773_115_500,
        "sys": {"country": "TR", "sunrise": 1_773_114_000, "sunset": 1_773_156_600},
        "timezone": 10800,
        "id": id,
        "name": name,
        "cod": 200
    })
}

/// Helper to create a forecast JSON body with `count` 3-hour samples
fn forecast_json(count: i64) -> serde_json::Value {
    let list: Vec<serde_json::Value> = (0..count)
        .map(|i| {
            serde_json::json!({
                "dt": 1_773_090_000 + i * 10_800,
                "main": {
                    "temp": 8.0 + i as f64 * 0.5, "feels_like": 7.0, "temp_min": 6.0,
                    "temp_max": 12.0, "pressure": 1012, "humidity": 70
                },
                "weather": [{"id": 500, "main": "Rain", "description": "light rain", "icon": "10d"}],
                "clouds": {"all": 75},
                "wind": {"speed": 5.1, "deg": 200},
                "visibility": 9000,
                "sys": {"pod": "d"},
                "dt_txt": ""
            })
        })
        .collect();

    serde_json::json!({
        "cod": "200",
        "cnt": count,
        "list": list,
        "city": {
            "id": 745044, "name": "Istanbul", "country": "TR",
            "timezone": 10800, "sunrise": 1_773_114_000, "sunset": 1_773_156_600
        }
    })
}

#[tokio::test]
async fn test_current_by_name_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("q", "Ankara"))
        .and(query_param("appid", "test-key"))
        .and(query_param("units", "metric"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_json(323786, "Ankara", 14.2)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = OpenWeatherClient::with_base_url(&mock_server.uri(), "test-key");
    let data = client.current_by_name("Ankara").await.unwrap();

    assert_eq!(data.id, 323786);
    assert_eq!(data.name, "Ankara");
    assert_eq!(data.main.temp, 14.2);
    assert_eq!(data.sys.country, "TR");
    assert_eq!(data.condition().map(|c| c.icon.as_str()), Some("01d"));
}

#[tokio::test]
async fn test_current_by_coords_sends_lat_lon() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("lat", "38.42"))
        .and(query_param("lon", "27.14"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_json(311044, "Izmir", 19.0)))
        .mount(&mock_server)
        .await;

    let client = OpenWeatherClient::with_base_url(&mock_server.uri(), "test-key");
    let data = client.current_by_coords(38.42, 27.14).await.unwrap();

    assert_eq!(data.name, "Izmir");
}

#[tokio::test]
async fn test_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "cod": "404",
            "message": "city not found"
        })))
        .mount(&mock_server)
        .await;

    let client = OpenWeatherClient::with_base_url(&mock_server.uri(), "test-key");
    let err = client.current_by_name("Atlantis").await.unwrap_err();

    assert!(matches!(err, WeatherError::NotFound));
    assert_eq!(err.to_string(), "Şehir bulunamadı");
}

#[tokio::test]
async fn test_unauthorized() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "cod": 401,
            "message": "Invalid API key"
        })))
        .mount(&mock_server)
        .await;

    let client = OpenWeatherClient::with_base_url(&mock_server.uri(), "wrong");
    let err = client.forecast_by_name("Ankara").await.unwrap_err();

    assert!(matches!(err, WeatherError::Unauthorized));
    assert_eq!(err.to_string(), "API anahtarı geçersiz");
}

#[tokio::test]
async fn test_server_error_uses_endpoint_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&mock_server)
        .await;

    let client = OpenWeatherClient::with_base_url(&mock_server.uri(), "test-key");

    let by_name = client.current_by_name("Ankara").await.unwrap_err();
    let by_coords = client.current_by_coords(1.0, 2.0).await.unwrap_err();
    let forecast = client.forecast_by_name("Ankara").await.unwrap_err();

    assert_eq!(by_name.to_string(), "Hava durumu verisi alınamadı");
    assert_eq!(by_coords.to_string(), "Konumun hava durumu alınamadı");
    assert_eq!(forecast.to_string(), "Hava tahmini alınamadı");
    assert!(by_name.is_network());
}

#[tokio::test]
async fn test_malformed_body_is_upstream_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let client = OpenWeatherClient::with_base_url(&mock_server.uri(), "secret-key-42");
    let err = client.current_by_name("Ankara").await.unwrap_err();

    assert!(matches!(err, WeatherError::Upstream { .. }));
    assert!(!format!("{:?}", err).contains("secret-key-42"));
}

#[tokio::test]
async fn test_forecast_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/forecast"))
        .and(query_param("q", "Istanbul"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_json(40)))
        .mount(&mock_server)
        .await;

    let client = OpenWeatherClient::with_base_url(&mock_server.uri(), "test-key");
    let forecast = client.forecast_by_name("Istanbul").await.unwrap();

    assert_eq!(forecast.list.len(), 40);
    assert_eq!(forecast.city.id, 745044);
    assert_eq!(forecast.city.sunrise, 1_773_114_000);
    assert!(forecast.list[0].sun_times().is_none());
}

#[tokio::test]
async fn test_forecast_session_against_server() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_json(40)))
        .mount(&mock_server)
        .await;

    let client = OpenWeatherClient::with_base_url(&mock_server.uri(), "test-key");
    let mut session = ForecastSession::new();

    assert_eq!(session.load(&client, "Istanbul").await, LoadState::Ready);

    // Five or six calendar days depending on the host time zone.
    let days = session.days();
    assert!(days.len() >= 5 && days.len() <= 6);
    let summary = session.selected_summary().unwrap();
    assert_eq!(summary.weather.map(|c| c.main), Some("Rain".to_string()));
    assert_eq!(summary.visibility, 9000.0);
}

fn aggregator(mock_server: &MockServer) -> (CityWeatherAggregator, SavedCityStore) {
    let client = Arc::new(OpenWeatherClient::with_base_url(&mock_server.uri(), "test-key"));
    let saved = SavedCityStore::new(Arc::new(MemoryStore::new()));
    let agg = CityWeatherAggregator::new(client, Arc::new(UnavailableGeolocator), saved.clone());
    (agg, saved)
}

#[tokio::test]
async fn test_bulk_load_with_partial_failure() {
    let mock_server = MockServer::start().await;

    for (id, name) in [(323786, "Ankara"), (311044, "Izmir")] {
        Mock::given(method("GET"))
            .and(path("/weather"))
            .and(query_param("q", name))
            .respond_with(ResponseTemplate::new(200).set_body_json(current_json(id, name, 15.0)))
            .mount(&mock_server)
            .await;
    }
    // Anything else falls through to wiremock's default 404.

    let (agg, _) = aggregator(&mock_server);
    let report = agg
        .load_saved(&[
            SavedCityRef::new(323786, "Ankara"),
            SavedCityRef::new(99, "Atlantis"),
            SavedCityRef::new(311044, "Izmir"),
        ])
        .await
        .unwrap();

    assert_eq!(report.loaded, 2);
    assert_eq!(report.failed, vec!["Atlantis".to_string()]);
    let names: Vec<String> = agg.cities().into_iter().map(|c| c.name).collect();
    assert_eq!(names, vec!["Ankara", "Izmir"]);
    assert_eq!(agg.error().as_deref(), Some("Atlantis şehirleri yüklenemedi"));
    assert!(!agg.is_loading());
}

#[tokio::test]
async fn test_add_city_persists_and_rejects_duplicate() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("q", "Ankara"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_json(323786, "Ankara", 15.0)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (agg, saved) = aggregator(&mock_server);

    assert!(agg.add_city("Ankara").await.unwrap());
    assert!(!agg.add_city("ANKARA").await.unwrap());

    assert_eq!(saved.load().unwrap(), vec![SavedCityRef::new(323786, "Ankara")]);
    assert_eq!(agg.error().as_deref(), Some("ANKARA zaten listede mevcut"));
}

#[tokio::test]
async fn test_from_config_uses_sqlite_store() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("appid", "configured-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_json(323786, "Ankara", 15.0)))
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.config_dir = dir.path().to_path_buf();
    config.api.api_key = "configured-key".to_string();
    config.api.base_url = mock_server.uri();
    config.storage.database_path = Some(dir.path().join("cities.db"));

    {
        let agg = CityWeatherAggregator::from_config(&config).unwrap();
        assert!(agg.add_city("Ankara").await.unwrap());
    }

    // A fresh aggregator over the same database sees the saved city.
    let agg = CityWeatherAggregator::from_config(&config).unwrap();
    let report = agg.load_from_store().await.unwrap();
    assert_eq!(report.loaded, 1);
    assert_eq!(agg.cities()[0].id, 323786);
}
