// API Server Binary Entry Point
//
// Purpose: Load the crop model and serve the HTML form + JSON API
// Usage: cargo run --features api --bin api_server

use crop_recommender_rust::{create_router, AppConfig, AppState};
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing (structured logging)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    // Default log level: info for our crate, warn for others
                    "crop_recommender_rust=info,tower_http=debug,axum=debug,warn".into()
                }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting API server...");

    // Configuration from environment variables
    let config = AppConfig::from_env();

    tracing::info!("Configuration:");
    tracing::info!("  MODEL_PATH: {:?}", config.model_path);
    tracing::info!("  PORT: {}", config.port);
    tracing::info!("  WEATHER_BASE_URL: {}", config.weather.base_url);
    tracing::info!(
        "  OPENWEATHER_API_KEY: {}",
        if config.weather.api_key.is_some() { "set" } else { "not set" }
    );

    // Load model, build weather client
    tracing::info!("Initializing application state...");
    let state = AppState::new(&config)?;
    tracing::info!("Application state initialized successfully");

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .await?;

    Ok(())
}
