// Axum web server
//
// Purpose: HTML form + JSON API in front of the recommendation engine
// Classifier is loaded once at startup and shared read-only across requests

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::advisor::{advise, fetch_environment, resolve_inputs, Advice, AdviceForm};
use crate::classifier::{CropClassifier, RandomForestModel};
use crate::config::AppConfig;
use crate::engine::FertilizerRules;
use crate::error::{MissingInputError, PredictionError};
use crate::weather::{weather_from_config, WeatherLookup};
use crate::web::handlers::pages::{home_page, predict_page};

// ============================================================================
// Application State
// ============================================================================

#[derive(Clone)]
pub struct AppState {
    pub classifier: Arc<dyn CropClassifier>,
    pub weather: Arc<dyn WeatherLookup>,
    pub rules: Arc<FertilizerRules>,
}

impl AppState {
    /// Load the model and build the weather client from configuration.
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        tracing::info!("Loading classifier from {:?}...", config.model_path);
        let model = RandomForestModel::load(&config.model_path)?;
        tracing::info!(
            "Classifier ready: {} trees, {} classes",
            model.n_trees(),
            model.classes().len()
        );

        tracing::info!("Initializing weather client (cache TTL {:?})...", config.weather.cache_ttl);
        let weather = weather_from_config(&config.weather)?;

        Ok(Self::from_parts(
            Arc::new(model),
            Arc::new(weather),
            FertilizerRules::default(),
        ))
    }

    /// Assemble state from already-built collaborators.
    pub fn from_parts(
        classifier: Arc<dyn CropClassifier>,
        weather: Arc<dyn WeatherLookup>,
        rules: FertilizerRules,
    ) -> Self {
        Self {
            classifier,
            weather,
            rules: Arc::new(rules),
        }
    }

    /// Weather lookup, input resolution and prediction for one form.
    ///
    /// Prediction runs on the blocking pool.
    pub async fn run_advice(&self, form: AdviceForm) -> Result<Advice, AppError> {
        let weather = fetch_environment(self.weather.as_ref(), &form).await;
        let inputs = resolve_inputs(&form, weather)?;

        let classifier = self.classifier.clone();
        let rules = self.rules.clone();
        let advice = tokio::task::spawn_blocking(move || advise(classifier.as_ref(), &rules, inputs))
            .await
            .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))??;

        tracing::info!(
            "Recommended {:?} (advisories: {})",
            advice.recommendation.top_crops.top().map(|c| c.label.as_str()),
            advice.recommendation.fertilizer.len()
        );
        Ok(advice)
    }
}

// ============================================================================
// Router
// ============================================================================

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // HTML pages
        .route("/", get(home_page))
        .route("/predict", post(predict_page))

        // JSON API
        .route("/api/recommend", post(recommend))
        .route("/api/crops", get(list_crops))

        // Health check
        .route("/health", get(health_check))

        // Middleware (applied in reverse order)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================================
// Endpoint Handlers
// ============================================================================

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn list_crops(State(state): State<AppState>) -> Json<serde_json::Value> {
    let crops = state.classifier.class_labels();
    Json(serde_json::json!({
        "count": crops.len(),
        "crops": crops,
    }))
}

/// JSON request body. Numeric fields may be omitted.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RecommendRequest {
    pub city: Option<String>,
    pub soil_preset: Option<String>,
    #[serde(rename = "N")]
    pub n: Option<f64>,
    #[serde(rename = "P")]
    pub p: Option<f64>,
    #[serde(rename = "K")]
    pub k: Option<f64>,
    pub ph: Option<f64>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub rainfall: Option<f64>,
}

impl From<RecommendRequest> for AdviceForm {
    fn from(req: RecommendRequest) -> Self {
        let text = |v: Option<f64>| v.map(|x| x.to_string());
        AdviceForm {
            city: req.city,
            soil_preset: req.soil_preset,
            n: text(req.n),
            p: text(req.p),
            k: text(req.k),
            ph: text(req.ph),
            temperature: text(req.temperature),
            humidity: text(req.humidity),
            rainfall: text(req.rainfall),
        }
    }
}

async fn recommend(
    State(state): State<AppState>,
    Json(payload): Json<RecommendRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let start = std::time::Instant::now();
    let advice = state.run_advice(payload.into()).await?;
    let fertilizer = &advice.recommendation.fertilizer;

    Ok(Json(serde_json::json!({
        "inputs": {
            "soil": advice.inputs.sample,
            "environment": advice.inputs.environment,
            "from_weather": advice.inputs.from_weather,
        },
        "top_crops": advice.recommendation.top_crops,
        "fertilizer": fertilizer.messages(),
        "advisories": fertilizer.advisories(),
        "warning": advice.inputs.warning,
        "elapsed_ms": u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
    })))
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Internal(String),
}

impl From<MissingInputError> for AppError {
    fn from(e: MissingInputError) -> Self {
        AppError::BadRequest(e.to_string())
    }
}

impl From<PredictionError> for AppError {
    fn from(e: PredictionError) -> Self {
        tracing::error!("{}", e);
        AppError::Internal(e.to_string())
    }
}

impl AppError {
    pub fn message(&self) -> &str {
        match self {
            AppError::BadRequest(msg) | AppError::Internal(msg) => msg,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
