use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::content::ExtractError;
use crate::llm_client::BackendError;
use crate::quiz::extract::MalformedResponse;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Configuration(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::BackendUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::QuotaExceeded(_) => StatusCode::PAYMENT_REQUIRED,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::ModelNotFound(_) | AppError::MalformedResponse(_) | AppError::Backend(_) => {
                StatusCode::BAD_GATEWAY
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::BackendUnavailable(_) => "BACKEND_UNAVAILABLE",
            AppError::QuotaExceeded(_) => "QUOTA_EXCEEDED",
            AppError::Timeout(_) => "TIMEOUT",
            AppError::ModelNotFound(_) => "MODEL_NOT_FOUND",
            AppError::MalformedResponse(_) => "MALFORMED_RESPONSE",
            AppError::Backend(_) => "BACKEND_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<BackendError> for AppError {
    fn from(err: BackendError) -> Self {
        let message = err.to_string();
        match err {
            BackendError::Unsupported { .. } => AppError::Validation(message),
            BackendError::Configuration(_) => AppError::Configuration(message),
            BackendError::Unavailable { .. } => AppError::BackendUnavailable(message),
            BackendError::QuotaExceeded => AppError::QuotaExceeded(message),
            BackendError::Timeout { .. } => AppError::Timeout(message),
            BackendError::ModelNotFound { .. } => AppError::ModelNotFound(message),
            BackendError::Api { .. }
            | BackendError::Http(_)
            | BackendError::EmptyContent
            | BackendError::NoQuestions => AppError::Backend(message),
        }
    }
}

impl From<MalformedResponse> for AppError {
    fn from(err: MalformedResponse) -> Self {
        AppError::MalformedResponse(err.to_string())
    }
}

impl From<ExtractError> for AppError {
    fn from(err: ExtractError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Validation(msg)
            | AppError::BackendUnavailable(msg)
            | AppError::QuotaExceeded(msg)
            | AppError::Timeout(msg)
            | AppError::ModelNotFound(msg) => msg.clone(),
            AppError::Configuration(msg) => {
                tracing::error!("Configuration error: {msg}");
                msg.clone()
            }
            AppError::MalformedResponse(msg) => {
                tracing::error!("Malformed model response: {msg}");
                format!("Could not parse the model response as a quiz: {msg}")
            }
            AppError::Backend(msg) => {
                tracing::error!("Backend error: {msg}");
                format!("Quiz generation failed: {msg}")
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                "An internal server error occurred".to_string()
            }
        };

        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
