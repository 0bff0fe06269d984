//! Weather lookup by city name
//!
//! Client for the OpenWeatherMap current-weather endpoint, plus a TTL cache
//! in front of any [`WeatherLookup`]. The recommendation engine never calls
//! this; front-ends translate a lookup result (or failure) into an
//! [`EnvironmentReading`] before invoking it.

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use reqwest::Client;
use serde::Deserialize;

use crate::config::WeatherConfig;
use crate::error::WeatherError;
use crate::types::EnvironmentReading;

/// Weather collaborator contract.
#[async_trait]
pub trait WeatherLookup: Send + Sync {
    /// Current temperature (°C), humidity (%) and rainfall (mm) for a city.
    async fn lookup(&self, city: &str) -> Result<EnvironmentReading, WeatherError>;
}

// ============================================================================
// OpenWeatherMap client
// ============================================================================

/// Client for the OpenWeatherMap current-weather API (metric units).
#[derive(Clone)]
pub struct OpenWeatherClient {
    api_key: Option<String>,
    http: Client,
    base_url: String,
}

impl OpenWeatherClient {
    /// Build a client with the given request timeout.
    pub fn new(
        api_key: Option<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, WeatherError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WeatherError::Http(e.to_string()))?;

        Ok(Self {
            api_key,
            http,
            base_url: base_url.into(),
        })
    }

    pub fn from_config(config: &WeatherConfig) -> Result<Self, WeatherError> {
        Self::new(config.api_key.clone(), config.base_url.clone(), config.timeout)
    }
}

#[async_trait]
impl WeatherLookup for OpenWeatherClient {
    async fn lookup(&self, city: &str) -> Result<EnvironmentReading, WeatherError> {
        let api_key = self.api_key.as_deref().ok_or(WeatherError::MissingApiKey)?;

        let url = format!(
            "{}/data/2.5/weather?q={}&appid={}&units=metric",
            self.base_url,
            urlencoding::encode(city.trim()),
            urlencoding::encode(api_key)
        );

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| WeatherError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WeatherError::Status {
                status: status.as_u16(),
            });
        }

        let body: CurrentWeather = response
            .json()
            .await
            .map_err(|e| WeatherError::Decode(e.to_string()))?;

        body.into_reading()
    }
}

/// Subset of the current-weather response we read.
#[derive(Debug, Deserialize)]
struct CurrentWeather {
    #[serde(default)]
    main: Option<MainBlock>,
    #[serde(default)]
    rain: Option<RainBlock>,
}

#[derive(Debug, Deserialize)]
struct MainBlock {
    temp: Option<f64>,
    humidity: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RainBlock {
    #[serde(rename = "1h")]
    one_hour: Option<f64>,
    #[serde(rename = "3h")]
    three_hours: Option<f64>,
}

impl CurrentWeather {
    /// Rainfall prefers the 1h total, then 3h, then 0 (no rain block).
    fn into_reading(self) -> Result<EnvironmentReading, WeatherError> {
        let main = self.main.ok_or(WeatherError::Incomplete("main block"))?;
        let temperature = main.temp.ok_or(WeatherError::Incomplete("temperature"))?;
        let humidity = main.humidity.ok_or(WeatherError::Incomplete("humidity"))?;
        let rainfall = self
            .rain
            .and_then(|r| r.one_hour.or(r.three_hours))
            .unwrap_or(0.0);

        Ok(EnvironmentReading::new(temperature, humidity, rainfall))
    }
}

// ============================================================================
// Cached lookup
// ============================================================================

/// TTL cache in front of another lookup. Only successes are cached.
pub struct CachedWeather<L> {
    inner: L,
    cache: Cache<String, EnvironmentReading>,
}

impl<L: WeatherLookup> CachedWeather<L> {
    pub fn new(inner: L, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(1_000)
            .time_to_live(ttl)
            .build();
        Self { inner, cache }
    }

    fn cache_key(city: &str) -> String {
        city.trim().to_lowercase()
    }
}

#[async_trait]
impl<L: WeatherLookup> WeatherLookup for CachedWeather<L> {
    async fn lookup(&self, city: &str) -> Result<EnvironmentReading, WeatherError> {
        let key = Self::cache_key(city);

        if let Some(cached) = self.cache.get(&key).await {
            tracing::debug!("Weather cache hit for '{}'", key);
            return Ok(cached);
        }

        let reading = self.inner.lookup(city).await?;
        self.cache.insert(key, reading).await;
        Ok(reading)
    }
}

/// Build the configured client wrapped in a cache.
pub fn weather_from_config(config: &WeatherConfig) -> Result<CachedWeather<OpenWeatherClient>, WeatherError> {
    let client = OpenWeatherClient::from_config(config)?;
    if config.api_key.is_none() {
        tracing::warn!("OPENWEATHER_API_KEY not set: city lookups will fall back to manual values");
    }
    Ok(CachedWeather::new(client, config.cache_ttl))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn parse(json: &str) -> Result<EnvironmentReading, WeatherError> {
        serde_json::from_str::<CurrentWeather>(json).unwrap().into_reading()
    }

    #[test]
    fn test_rain_one_hour() {
        let reading = parse(r#"{"main":{"temp":27.4,"humidity":78},"rain":{"1h":2.5,"3h":6.0}}"#).unwrap();
        assert_eq!(reading, EnvironmentReading::new(27.4, 78.0, 2.5));
    }

    #[test]
    fn test_rain_three_hours_fallback() {
        let reading = parse(r#"{"main":{"temp":18.0,"humidity":60},"rain":{"3h":4.2}}"#).unwrap();
        assert_eq!(reading.rainfall, 4.2);
    }

    #[test]
    fn test_no_rain_block() {
        let reading = parse(r#"{"main":{"temp":31.0,"humidity":20},"wind":{"speed":3.1}}"#).unwrap();
        assert_eq!(reading.rainfall, 0.0);
    }

    #[test]
    fn test_missing_temperature() {
        let err = parse(r#"{"main":{"humidity":50}}"#).unwrap_err();
        assert_eq!(err, WeatherError::Incomplete("temperature"));

        let err = parse(r#"{"cod":"404","message":"city not found"}"#).unwrap_err();
        assert_eq!(err, WeatherError::Incomplete("main block"));
    }

    struct Counting {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait]
    impl WeatherLookup for Counting {
        async fn lookup(&self, _city: &str) -> Result<EnvironmentReading, WeatherError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(WeatherError::Status { status: 404 })
            } else {
                Ok(EnvironmentReading::new(25.0, 70.0, 1.0))
            }
        }
    }

    #[tokio::test]
    async fn test_cache_hits_ignore_case() {
        let calls = Arc::new(AtomicUsize::new(0));
        let weather = CachedWeather::new(
            Counting { calls: calls.clone(), fail: false },
            Duration::from_secs(60),
        );

        weather.lookup("Pune").await.unwrap();
        weather.lookup("  pune ").await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failures_not_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let weather = CachedWeather::new(
            Counting { calls: calls.clone(), fail: true },
            Duration::from_secs(60),
        );

        assert!(weather.lookup("Atlantis").await.is_err());
        assert!(weather.lookup("Atlantis").await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_missing_api_key() {
        let client = OpenWeatherClient::new(None, "http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        assert_eq!(client.lookup("Delhi").await.unwrap_err(), WeatherError::MissingApiKey);
    }
}
