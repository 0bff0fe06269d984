// Weather Client Integration Tests
//
// Purpose: Run the OpenWeatherMap client against a local mock server
// Run with: cargo test --features weather --test weather_integration_tests

#![cfg(feature = "weather")]

use crop_recommender_rust::config::WeatherConfig;
use crop_recommender_rust::weather::{weather_from_config, OpenWeatherClient, WeatherLookup};
use crop_recommender_rust::{EnvironmentReading, WeatherError};
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> OpenWeatherClient {
    OpenWeatherClient::new(Some("test-key".into()), server.uri(), Duration::from_secs(2)).unwrap()
}

#[tokio::test]
async fn test_lookup_sends_expected_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("q", "São Paulo"))
        .and(query_param("appid", "test-key"))
        .and(query_param("units", "metric"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "main": { "temp": 24.3, "humidity": 81 },
            "rain": { "1h": 1.2 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let reading = client(&server).lookup(" São Paulo ").await.unwrap();
    assert_eq!(reading, EnvironmentReading::new(24.3, 81.0, 1.2));
}

#[tokio::test]
async fn test_city_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "cod": "404",
            "message": "city not found"
        })))
        .mount(&server)
        .await;

    let err = client(&server).lookup("Atlantis").await.unwrap_err();
    assert_eq!(err, WeatherError::Status { status: 404 });
}

#[tokio::test]
async fn test_malformed_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client(&server).lookup("Pune").await.unwrap_err();
    assert!(matches!(err, WeatherError::Decode(_)));
}

#[tokio::test]
async fn test_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "main": { "temp": 20.0, "humidity": 50 } }))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let slow = OpenWeatherClient::new(Some("k".into()), server.uri(), Duration::from_millis(50)).unwrap();
    let err = slow.lookup("Pune").await.unwrap_err();
    assert!(matches!(err, WeatherError::Http(_)));
}

#[tokio::test]
async fn test_configured_client_caches() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "main": { "temp": 30.0, "humidity": 40 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = WeatherConfig {
        api_key: Some("k".into()),
        base_url: server.uri(),
        ..WeatherConfig::default()
    };
    let weather = weather_from_config(&config).unwrap();

    let first = weather.lookup("Jaipur").await.unwrap();
    let second = weather.lookup("JAIPUR").await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.rainfall, 0.0);
}
