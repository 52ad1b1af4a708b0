use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Failure of a call made through an [`ApiClient`](crate::services::api::ApiClient).
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("backend returned {status}: {body}")]
    Http {
        status: u16,
        body: serde_json::Value,
    },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected response shape: {0}")]
    Decode(String),
}

impl ApiError {
    /// The `message` field of an HTTP error body, when the backend sent one.
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            ApiError::Http { body, .. } => body
                .get("message")
                .and_then(|m| m.as_str())
                .filter(|m| !m.trim().is_empty()),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
        };

        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}
