use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

/// Failure inside the retrieval/generation pipeline.
///
/// `transient` marks conditions worth retrying (network hiccups, timeouts,
/// rate limits). Configuration and auth failures are never transient.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("retrieval failed: {message}")]
    Retrieval { message: String, transient: bool },
    #[error("generation failed: {message}")]
    Generation { message: String, transient: bool },
    #[error("malformed record: {0}")]
    Data(String),
}

impl PipelineError {
    pub fn retrieval<M: std::fmt::Display>(message: M, transient: bool) -> Self {
        PipelineError::Retrieval {
            message: message.to_string(),
            transient,
        }
    }

    pub fn generation<M: std::fmt::Display>(message: M, transient: bool) -> Self {
        PipelineError::Generation {
            message: message.to_string(),
            transient,
        }
    }

    pub fn data<M: std::fmt::Display>(message: M) -> Self {
        PipelineError::Data(message.to_string())
    }

    pub fn is_transient(&self) -> bool {
        match self {
            PipelineError::Retrieval { transient, .. }
            | PipelineError::Generation { transient, .. } => *transient,
            PipelineError::Data(_) => false,
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("service unavailable")]
    ServiceUnavailable,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match &err {
            PipelineError::Retrieval { transient, .. } if *transient => {
                ApiError::ServiceUnavailable
            }
            _ => ApiError::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            ApiError::ServiceUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Service unavailable".to_string(),
            ),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}
