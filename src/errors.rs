use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::gateway::SchemaError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("gateway error: {0:#}")]
    Gateway(anyhow::Error),

    #[error("invalid request: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("request already in progress: {0}")]
    InProgress(String),
}

impl From<anyhow::Error> for AppError {
    /// Schema rejections raised at the gateway boundary are the caller's
    /// fault, not the store's.
    fn from(e: anyhow::Error) -> Self {
        match e.downcast_ref::<SchemaError>() {
            Some(schema) => AppError::Validation(schema.to_string()),
            None => AppError::Gateway(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Gateway(_) => StatusCode::BAD_GATEWAY,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::InProgress(_) => StatusCode::CONFLICT,
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}
