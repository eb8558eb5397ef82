//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{capture::HttpImageCapture, db::PgArchiveAdapter, story_llm::OpenAiStoryAdapter},
    config::Config,
    error::ApiError,
    web::{
        delete_story_handler, export_story_handler, generate_story_handler, health_handler,
        hide_stories_handler, next_story_handler, previous_story_handler,
        rest::ApiDoc, save_story_handler, show_stories_handler, state::AppState,
    },
};
use async_openai::{
    config::OpenAIConfig,
    types::images::{ImageModel, ImageSize},
    Client,
};
use axum::{
    routing::{delete, get, post},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use storytime_core::session::StorySession;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let archive = Arc::new(PgArchiveAdapter::new(db_pool.clone()));
    info!("Running database migrations...");
    archive.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Initialize Service Adapters ---
    let openai_config = OpenAIConfig::new().with_api_key(
        config
            .openai_api_key
            .as_ref()
            .ok_or_else(|| ApiError::Internal("OPENAI_API_KEY is required".to_string()))?,
    );
    let openai_client = Client::with_config(openai_config);

    let image_model = match config.image_model.as_str() {
        "dall-e-2" => ImageModel::DallE2,
        "dall-e-3" => ImageModel::DallE3,
        other => ImageModel::Other(other.to_string()),
    };
    let image_size = match config.image_size.as_str() {
        "256x256" => ImageSize::S256x256,
        "512x512" => ImageSize::S512x512,
        "1024x1024" => ImageSize::S1024x1024,
        "1792x1024" => ImageSize::S1792x1024,
        "1024x1792" => ImageSize::S1024x1792,
        _ => {
            return Err(ApiError::Internal(format!(
                "Invalid image size specified in config: '{}'",
                config.image_size
            )))
        }
    };
    let generator = Arc::new(OpenAiStoryAdapter::new(
        openai_client,
        config.story_model.clone(),
        image_model,
        image_size,
    ));

    let capture = Arc::new(
        HttpImageCapture::new(config.capture_timeout)
            .map_err(|e| ApiError::Internal(format!("Failed to build the capture client: {e}")))?,
    );

    // --- 4. Build the Shared AppState ---
    let session = StorySession::new(archive);
    let app_state = Arc::new(AppState {
        config: config.clone(),
        generator,
        capture,
        session: Mutex::new(session),
    });

    // The original frontend is served from another origin, so the API stays
    // wide open like the source it replaces.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // --- 5. Create the Web Router ---
    let api_router = Router::new()
        .route("/", get(health_handler))
        .route("/generate-story", post(generate_story_handler))
        .route("/save-story", post(save_story_handler))
        .route("/stories", get(show_stories_handler))
        .route("/stories/hide", post(hide_stories_handler))
        .route("/stories/next", post(next_story_handler))
        .route("/stories/previous", post(previous_story_handler))
        .route("/delete-story/{id}", delete(delete_story_handler))
        .route("/export-story", get(export_story_handler))
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
