//! Autobook Server
//!
//! Main entry point for the invoice pipeline service.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use autobook_api::{AppState, create_router};
use autobook_clients::{DocumentAiClient, GeminiClient};
use autobook_core::pipeline::{Pipeline, PipelineSettings};
use autobook_core::storage::{StorageConfig, StorageService};
use autobook_db::{PipelineRepository, connect};
use autobook_shared::{AppConfig, AppError};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "autobook=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load and check configuration; missing credentials are fatal here
    let config = AppConfig::load().context("Failed to load configuration")?;
    if let Err(e) = config.validate() {
        error!(code = e.error_code(), error = %e, "Refusing to start");
        return Err(e.into());
    }

    // Connect to database
    let db = connect(&config.database)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    info!("Connected to database");

    // Document storage
    let storage = StorageService::from_config(StorageConfig::from(config.storage.clone()))
        .map_err(|e| AppError::Storage(e.to_string()))?;
    info!(
        provider = storage.provider_name(),
        bucket = storage.bucket(),
        "Document storage configured"
    );

    // External services
    let generator = GeminiClient::from_config(&config.generation)
        .map_err(|e| AppError::ExternalService(e.to_string()))?;
    info!(model = %config.generation.model, "Text generation configured");
    let extractor = DocumentAiClient::from_config(&config.extraction)
        .map_err(|e| AppError::ExternalService(e.to_string()))?;
    info!(processor = %config.extraction.processor_id, "Document extraction configured");

    let settings = PipelineSettings::from(&config.pipeline);
    let pipeline = Pipeline::new(
        Arc::new(PipelineRepository::new(db)),
        Arc::new(storage),
        Arc::new(extractor),
        Arc::new(generator),
        &settings,
    );

    // Create router
    let app = create_router(AppState::new(Arc::new(pipeline)));

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
