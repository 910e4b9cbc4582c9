//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{GeminiChatAdapter, GeminiImageAdapter, GeminiPlanAdapter, JsonFileStorage},
    config::Config,
    error::ApiError,
    planner::{ChatSession, GenerationOrchestrator, HistoryStore, OrchestratorSettings},
    web::{self, state::AppState, ApiDoc},
};
use async_openai::{config::OpenAIConfig, Client};
use axum::http::{header::CONTENT_TYPE, HeaderValue, Method};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Open Durable Storage ---
    let storage = Arc::new(JsonFileStorage::open(&config.data_dir).await?);
    info!("Storing history and chat under {}", storage.dir().display());

    // --- 3. Initialize Generator Adapters ---
    let openai_config = OpenAIConfig::new()
        .with_api_base(&config.gemini_api_base)
        .with_api_key(&config.gemini_api_key);
    let client = Client::with_config(openai_config);

    let plan_adapter = Arc::new(GeminiPlanAdapter::new(client.clone(), config.plan_model.clone()));
    let image_adapter = Arc::new(GeminiImageAdapter::new(client.clone(), config.image_model.clone()));
    let chat_adapter = Arc::new(GeminiChatAdapter::new(client, config.chat_model.clone()));

    // --- 4. Build the Planner & Shared AppState ---
    let history = Arc::new(HistoryStore::load(storage.clone()).await);
    let orchestrator = Arc::new(GenerationOrchestrator::new(
        plan_adapter,
        image_adapter,
        history,
        OrchestratorSettings::default(),
    ));
    let chat = Arc::new(ChatSession::load(chat_adapter, storage).await);

    let app_state = Arc::new(AppState {
        orchestrator,
        chat,
    });

    // --- 5. Create the Web Router ---
    let origin = config.cors_origin.parse::<HeaderValue>().map_err(|e| {
        ApiError::Internal(format!("Invalid CORS origin '{}': {}", config.cors_origin, e))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);

    let app = Router::new()
        .merge(web::router(app_state).layer(cors))
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
