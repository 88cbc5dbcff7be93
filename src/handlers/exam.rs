// src/handlers/exam.rs

use std::sync::Arc;

use axum::{Json, extract::Path, extract::State, response::IntoResponse};
use serde::Serialize;

use crate::{
    engine::service::SessionService,
    error::AppError,
    models::question::PublicQuestion,
};

/// DTO for the configuration preview endpoint.
#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

/// DTO for a generated (session-less) exam. Carries no answer key.
#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub questions: Vec<PublicQuestion>,
    /// Minutes.
    pub time_limit: u32,
    pub total_questions: u32,
    pub passing_score: u32,
}

/// Checks whether a certification's quiz configuration can generate an
/// exam against the current question bank. Reports every problem found.
pub async fn validate_configuration(
    State(service): State<Arc<SessionService>>,
    Path(certification_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let errors = service.validate_configuration(certification_id)?;
    Ok(Json(ValidateResponse {
        valid: errors.is_empty(),
        errors,
    }))
}

/// Generates a one-off exam payload for preview, without opening a session.
/// The answer key never leaves the engine through this endpoint.
pub async fn generate_exam(
    State(service): State<Arc<SessionService>>,
    Path(certification_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let data = service.preview_exam(certification_id)?;
    Ok(Json(GenerateResponse {
        questions: data.questions,
        time_limit: data.time_limit,
        total_questions: data.total_questions,
        passing_score: data.passing_score,
    }))
}
