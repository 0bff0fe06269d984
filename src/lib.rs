//! Crop Recommender
//!
//! Recommends crops for a soil sample and local weather, and flags simple
//! fertilizer/amendment needs.
//!
//! Layout:
//! - `types`, `error`: domain values and error types
//! - `engine/`: top-k crop ranking + fertilizer threshold rules (pure, sync)
//! - `classifier/`: classifier trait and the random forest behind it
//! - `data`: crop dataset loading with Polars
//! - `soil_presets`, `advisor`: front-end input assembly (presets, defaults, weather fallback)
//! - `weather` (feature `weather`): OpenWeatherMap client with a Moka TTL cache
//! - `api_server`, `web/` (feature `api`): Axum JSON API + Askama HTML form
//!
//! Binaries: `train_model`, `api_server` (feature `api`), `advise` (feature `cli`).

pub mod types;
pub mod error;
pub mod config;
pub mod engine;
pub mod classifier;
pub mod data;
pub mod soil_presets;
pub mod advisor;

#[cfg(feature = "weather")]
pub mod weather;

#[cfg(feature = "api")]
pub mod api_server;

#[cfg(feature = "api")]
pub mod web;

// Re-export commonly used types
pub use types::{
    Advisory, ClassProbability, CropRanking, EnvironmentReading, FeatureVector,
    FertilizerAdvisory, RankedCrop, Recommendation, SoilSample,
};
pub use error::{ClassifierError, MissingInputError, PredictionError, WeatherError};
pub use config::AppConfig;
pub use engine::{predict_top_crops, recommend, recommend_fertilizer, FertilizerRules};
pub use classifier::{CropClassifier, RandomForestModel, TrainingConfig};
pub use data::CropDataset;

#[cfg(feature = "api")]
pub use api_server::{create_router, AppState};
