use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::llm_client::OracleError;
use crate::session::SessionStatus;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Cannot {action} a session in state '{from}'")]
    InvalidTransition {
        from: SessionStatus,
        action: &'static str,
    },

    #[error("A tailoring run is already in progress for this session")]
    TailoringInProgress,

    #[error("Session changed while this request was running")]
    StaleResult,

    #[error("Content oracle unavailable: {0}")]
    OracleUnavailable(String),

    #[error("Generated content used omitted keywords: {keywords:?}")]
    TruthfulnessViolation { keywords: Vec<String> },

    #[error("No résumé content")]
    NoResumeContent,

    #[error("Malformed content: {0}")]
    MalformedContent(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Stable machine-readable code used in the JSON body.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Conflict(_) => "CONFLICT",
            AppError::InvalidTransition { .. } => "INVALID_TRANSITION",
            AppError::TailoringInProgress => "TAILORING_IN_PROGRESS",
            AppError::StaleResult => "STALE_RESULT",
            AppError::OracleUnavailable(_) => "ORACLE_UNAVAILABLE",
            AppError::TruthfulnessViolation { .. } => "TRUTHFULNESS_VIOLATION",
            AppError::NoResumeContent => "NO_RESUME_CONTENT",
            AppError::MalformedContent(_) => "MALFORMED_CONTENT",
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_)
            | AppError::InvalidTransition { .. }
            | AppError::TailoringInProgress
            | AppError::StaleResult => StatusCode::CONFLICT,
            AppError::OracleUnavailable(_) => StatusCode::BAD_GATEWAY,
            AppError::TruthfulnessViolation { .. }
            | AppError::NoResumeContent
            | AppError::MalformedContent(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// User-facing message. Raw upstream errors are logged, never returned.
    fn public_message(&self) -> String {
        match self {
            AppError::NotFound(msg)
            | AppError::Validation(msg)
            | AppError::Conflict(msg)
            | AppError::MalformedContent(msg) => msg.clone(),
            AppError::InvalidTransition { .. } => self.to_string(),
            AppError::TailoringInProgress => {
                "A tailoring run is already in progress for this session. \
                Wait for it to finish before starting another."
                    .to_string()
            }
            AppError::StaleResult => {
                "The session was changed by a newer request while this one was running. \
                Reload the session and retry."
                    .to_string()
            }
            AppError::OracleUnavailable(detail) => {
                tracing::error!("Oracle error: {detail}");
                "The content generator is unavailable. Try again shortly.".to_string()
            }
            AppError::TruthfulnessViolation { keywords } => format!(
                "Generated content claimed experience not supported by the résumé ({}). \
                Add evidence for these keywords to the résumé or retry.",
                keywords.join(", ")
            ),
            AppError::NoResumeContent => {
                "No résumé text is available. Upload a résumé before tailoring.".to_string()
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                "A database error occurred".to_string()
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                "An internal server error occurred".to_string()
            }
        }
    }
}

impl From<OracleError> for AppError {
    fn from(err: OracleError) -> Self {
        match err {
            OracleError::Malformed(detail) => AppError::MalformedContent(format!(
                "The content generator returned an unexpected shape: {detail}"
            )),
            OracleError::Parse(e) => AppError::MalformedContent(format!(
                "The content generator returned invalid JSON: {e}"
            )),
            OracleError::PreSerializedPayload => {
                AppError::Internal(anyhow::Error::new(OracleError::PreSerializedPayload))
            }
            other => AppError::OracleUnavailable(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": self.public_message()
            }
        }));

        (status, body).into_response()
    }
}
