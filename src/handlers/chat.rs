use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::{FlowStep, Response, User};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub session_id: Option<String>,
    pub message: String,
    pub user: User,
}

#[derive(Serialize)]
pub struct ChatReply {
    pub session_id: String,
    pub step: FlowStep,
    pub reply: Response,
}

#[derive(Deserialize)]
pub struct ResetRequest {
    pub session_id: String,
}

// POST /api/chat/message
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ChatMessage>,
) -> Result<Json<ChatReply>, AppError> {
    let message = payload.message.trim();
    if message.is_empty() {
        return Err(AppError::BadRequest("message cannot be empty".to_string()));
    }

    let session_id = payload
        .session_id
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    // Presentation pacing only
    if state.config.reply_delay_ms > 0 {
        tokio::time::sleep(Duration::from_millis(state.config.reply_delay_ms)).await;
    }

    let engine = state.sessions.checkout(&session_id, || state.new_engine());
    let mut engine = engine.lock().await;
    let reply = engine.process(message, &payload.user).await;

    Ok(Json(ChatReply {
        session_id,
        step: engine.step(),
        reply,
    }))
}

// POST /api/chat/reset
pub async fn reset_session(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ResetRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let engine = state
        .sessions
        .get(&payload.session_id)
        .ok_or_else(|| AppError::NotFound(format!("session {}", payload.session_id)))?;

    let mut engine = engine.lock().await;
    engine.reset();

    Ok(Json(serde_json::json!({
        "session_id": payload.session_id,
        "step": engine.step(),
    })))
}
