// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// Global Application Error Enum.
/// Centralizes the exam-engine error taxonomy and its mapping to HTTP responses.
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    /// 422 - configuration rejected (sum mismatch, non-positive quotas, bad percentages).
    InvalidConfiguration(Vec<String>),

    /// 422 - a chapter's question pool cannot satisfy its quota.
    InsufficientQuestions {
        chapter_id: i64,
        requested: u32,
        available: u32,
    },

    /// 410 - save attempted after the session's time limit elapsed.
    ExamTimeExpired,

    // 500 Internal Server Error
    InternalServerError(String),

    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized (missing/invalid identity)
    AuthError(String),

    // 403 Forbidden (session owned by a different user)
    Forbidden(String),

    // 404 Not Found
    NotFound(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::InvalidConfiguration(errors) => {
                write!(f, "Invalid configuration: {}", errors.join("; "))
            }
            AppError::InsufficientQuestions {
                chapter_id,
                requested,
                available,
            } => write!(
                f,
                "Chapter {} has only {} eligible questions, {} requested (short by {})",
                chapter_id,
                available,
                requested,
                requested - available
            ),
            AppError::ExamTimeExpired => write!(f, "Exam time has expired"),
            AppError::InternalServerError(msg) => write!(f, "Internal error: {}", msg),
            AppError::BadRequest(msg) => write!(f, "{}", msg),
            AppError::AuthError(msg) => write!(f, "{}", msg),
            AppError::Forbidden(msg) => write!(f, "{}", msg),
            AppError::NotFound(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for AppError {}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::InvalidConfiguration(ref errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({
                    "error": "Invalid configuration",
                    "details": errors,
                }),
            ),
            AppError::InsufficientQuestions {
                chapter_id,
                requested,
                available,
            } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({
                    "error": self.to_string(),
                    "chapter_id": chapter_id,
                    "requested": requested,
                    "available": available,
                }),
            ),
            AppError::ExamTimeExpired => (
                StatusCode::GONE,
                json!({ "error": "Exam time has expired" }),
            ),
            AppError::InternalServerError(ref msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal Server Error" }),
                )
            }
            AppError::BadRequest(ref msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::AuthError(ref msg) => (StatusCode::UNAUTHORIZED, json!({ "error": msg })),
            AppError::Forbidden(ref msg) => (StatusCode::FORBIDDEN, json!({ "error": msg })),
            AppError::NotFound(ref msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
        };

        (status, Json(body)).into_response()
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(err.to_string())
    }
}
