use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use hospital_assistant::config::AppConfig;
use hospital_assistant::handlers;
use hospital_assistant::services::api::http::HttpApiClient;
use hospital_assistant::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let token = Some(config.api_token.clone()).filter(|t| !t.is_empty());
    if token.is_none() {
        tracing::warn!("API_TOKEN not set, backend requests will be unauthenticated");
    }
    let api = HttpApiClient::new(
        config.api_base_url.clone(),
        token,
        Duration::from_secs(config.request_timeout_secs),
    )?;
    tracing::info!("using hospital API at {}", config.api_base_url);

    let state = Arc::new(AppState::new(config.clone(), Arc::new(api)));

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/chat/message", post(handlers::chat::send_message))
        .route("/api/chat/reset", post(handlers::chat::reset_session))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
