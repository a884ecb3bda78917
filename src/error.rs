use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use thiserror::Error;

/// Error taxonomy (spec.md §7). Each variant carries its own HTTP disposition;
/// stage-failure variants additionally carry the stage label that produced them
/// so the orchestrator can record it on the job without re-deriving it.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("not found")]
    NotFound,

    #[error("unreachable: {0}")]
    Unreachable(String),

    #[error("no seeds produced")]
    NoSeeds,

    #[error("no metrics returned")]
    NoMetrics,

    #[error("clustering produced zero clusters")]
    ClusterEmpty,

    #[error("AI service unavailable: {0}")]
    AiUnavailable(String),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Stage label associated with a stage-fatal error, per spec.md §7's table.
    pub fn stage_label(&self) -> &'static str {
        match self {
            AppError::Unreachable(_) => crate::core::types::STEP_SCANNING,
            AppError::NoSeeds => crate::core::types::STEP_EXTRACTING,
            AppError::NoMetrics => crate::core::types::STEP_ENRICHING,
            AppError::ClusterEmpty => crate::core::types::STEP_CLUSTERING,
            _ => crate::core::types::STEP_FINALIZING,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    retry_after: Option<u64>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, retry_after) = match &self {
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            AppError::RateLimited { retry_after_secs } => (
                StatusCode::TOO_MANY_REQUESTS,
                "rate limit exceeded".to_string(),
                Some(*retry_after_secs),
            ),
            AppError::NotFound => (StatusCode::NOT_FOUND, "not found".to_string(), None),
            AppError::Unreachable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone(), None),
            AppError::NoSeeds => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "no seed keywords could be generated for this site".to_string(),
                None,
            ),
            AppError::NoMetrics => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "the metrics provider returned no usable data".to_string(),
                None,
            ),
            AppError::ClusterEmpty => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "clustering produced no clusters".to_string(),
                None,
            ),
            AppError::AiUnavailable(msg) => (StatusCode::BAD_GATEWAY, msg.clone(), None),
            AppError::Internal(err) => {
                tracing::error!("internal error: {:#}", err);
                let message = if crate::core::config::is_development() {
                    format!("{:#}", err)
                } else {
                    "internal error".to_string()
                };
                (StatusCode::INTERNAL_SERVER_ERROR, message, None)
            }
        };

        (status, Json(ErrorBody { error: message, retry_after })).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
