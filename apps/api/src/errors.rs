use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::adventure::normalizer::NormalizeError;
use crate::llm_client::CompletionError;

/// A single rejected input field, reported back to the caller verbatim.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {}", field_list(.0))]
    Validation(Vec<FieldViolation>),

    #[error("Completion error: {0}")]
    Completion(#[from] CompletionError),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Schema error: {}", .0.join(", "))]
    Schema(Vec<String>),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

fn field_list(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| v.field.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<NormalizeError> for AppError {
    fn from(err: NormalizeError) -> Self {
        match err {
            NormalizeError::Parse(e) => AppError::Parse(e.to_string()),
            NormalizeError::Schema(fields) => AppError::Schema(fields),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details): (_, _, _, Option<Value>) = match &self {
            AppError::Validation(violations) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                "Invalid input data".to_string(),
                Some(json!(violations)),
            ),
            AppError::Completion(e) => {
                tracing::error!("Completion error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "COMPLETION_ERROR",
                    "Failed to generate adventure".to_string(),
                    None,
                )
            }
            AppError::Parse(msg) => {
                tracing::error!("Could not parse completion output: {msg}");
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "PARSE_ERROR",
                    "Invalid response format".to_string(),
                    None,
                )
            }
            AppError::Schema(fields) => {
                tracing::error!("Repaired adventure still invalid: {}", fields.join(", "));
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "SCHEMA_ERROR",
                    "Invalid response format".to_string(),
                    Some(json!(fields)),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Failed to generate adventure".to_string(),
                    None,
                )
            }
        };

        let mut error = json!({
            "code": code,
            "message": message
        });
        if let Some(details) = details {
            error["details"] = details;
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}
