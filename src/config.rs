//! Process configuration
//!
//! Read once at startup from environment variables and passed down
//! explicitly. Unparsable numeric values (and zero durations) fall back to
//! their defaults.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_MODEL_PATH: &str = "crop_model.json";
pub const DEFAULT_DATA_PATH: &str = "crop_recommendation.csv";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_WEATHER_BASE_URL: &str = "https://api.openweathermap.org";
pub const DEFAULT_WEATHER_TIMEOUT_SECS: u64 = 8;
pub const DEFAULT_WEATHER_CACHE_TTL_SECS: u64 = 600;

/// Weather collaborator settings.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherConfig {
    /// OpenWeatherMap API key; lookups fail with `MissingApiKey` when unset
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout: Duration,
    pub cache_ttl: Duration,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_WEATHER_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_WEATHER_TIMEOUT_SECS),
            cache_ttl: Duration::from_secs(DEFAULT_WEATHER_CACHE_TTL_SECS),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Serialized classifier (`MODEL_PATH`)
    pub model_path: PathBuf,
    /// Training dataset CSV (`DATA_PATH`)
    pub data_path: PathBuf,
    /// HTTP port (`PORT`)
    pub port: u16,
    pub weather: WeatherConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            port: DEFAULT_PORT,
            weather: WeatherConfig::default(),
        }
    }
}

impl AppConfig {
    /// Configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let secs = |key: &str, default: u64| {
            non_empty(key)
                .and_then(|v| v.trim().parse().ok())
                .filter(|&secs: &u64| secs > 0)
                .map_or(Duration::from_secs(default), Duration::from_secs)
        };

        Self {
            model_path: non_empty("MODEL_PATH")
                .map_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH), PathBuf::from),
            data_path: non_empty("DATA_PATH")
                .map_or_else(|| PathBuf::from(DEFAULT_DATA_PATH), PathBuf::from),
            port: non_empty("PORT")
                .and_then(|p| p.trim().parse().ok())
                .unwrap_or(DEFAULT_PORT),
            weather: WeatherConfig {
                api_key: non_empty("OPENWEATHER_API_KEY").map(|k| k.trim().to_string()),
                base_url: non_empty("WEATHER_BASE_URL")
                    .map(|u| u.trim().trim_end_matches('/').to_string())
                    .unwrap_or_else(|| DEFAULT_WEATHER_BASE_URL.to_string()),
                timeout: secs("WEATHER_TIMEOUT_SECS", DEFAULT_WEATHER_TIMEOUT_SECS),
                cache_ttl: secs("WEATHER_CACHE_TTL_SECS", DEFAULT_WEATHER_CACHE_TTL_SECS),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[]));
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.weather.timeout, Duration::from_secs(8));
        assert!(config.weather.api_key.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("MODEL_PATH", "/opt/crops/model.json"),
            ("PORT", "8080"),
            ("OPENWEATHER_API_KEY", " abc123 "),
            ("WEATHER_BASE_URL", "http://localhost:9000/"),
            ("WEATHER_TIMEOUT_SECS", "3"),
        ]));

        assert_eq!(config.model_path, PathBuf::from("/opt/crops/model.json"));
        assert_eq!(config.port, 8080);
        assert_eq!(config.weather.api_key.as_deref(), Some("abc123"));
        assert_eq!(config.weather.base_url, "http://localhost:9000");
        assert_eq!(config.weather.timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_bad_numbers_fall_back() {
        let config = AppConfig::from_lookup(lookup(&[
            ("PORT", "eighty"),
            ("WEATHER_CACHE_TTL_SECS", "-1"),
            ("OPENWEATHER_API_KEY", "   "),
        ]));

        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.weather.cache_ttl, Duration::from_secs(600));
        assert!(config.weather.api_key.is_none());
    }

    #[test]
    fn test_zero_durations_fall_back() {
        let config = AppConfig::from_lookup(lookup(&[
            ("WEATHER_TIMEOUT_SECS", "0"),
            ("WEATHER_CACHE_TTL_SECS", " 0 "),
        ]));

        assert_eq!(config.weather.timeout, Duration::from_secs(DEFAULT_WEATHER_TIMEOUT_SECS));
        assert_eq!(config.weather.cache_ttl, Duration::from_secs(DEFAULT_WEATHER_CACHE_TTL_SECS));
    }
}
