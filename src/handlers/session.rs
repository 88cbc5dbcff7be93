// src/handlers/session.rs

use std::sync::Arc;

use axum::{Extension, Json, extract::Path, extract::State, response::IntoResponse};
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    engine::service::{SessionService, SubmitOutcome},
    error::AppError,
    models::session::{
        QuizResult, SaveAnswerRequest, SaveAnswerResponse, SessionStatus, SessionStatusResponse,
    },
    utils::identity::UserId,
};

/// DTO wrapping a terminal result.
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub status: SessionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub quiz_result: QuizResult,
}

impl From<SubmitOutcome> for SubmitResponse {
    fn from(outcome: SubmitOutcome) -> Self {
        let message = match outcome.session.status {
            SessionStatus::Expired => {
                Some("Exam time expired; the exam was scored from the saved answers".to_string())
            }
            _ => None,
        };
        SubmitResponse {
            status: outcome.session.status,
            message,
            quiz_result: outcome.result,
        }
    }
}

/// Starts an exam session for the authenticated user. Idempotent: while a
/// session is active for this certification, the same session is returned.
pub async fn start_session(
    State(service): State<Arc<SessionService>>,
    Extension(UserId(user_id)): Extension<UserId>,
    Path(certification_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let session = service.start(user_id, certification_id)?;
    Ok(Json(SessionStatusResponse::from_session(
        &session,
        Utc::now(),
    )))
}

/// Current session state. Reading an overdue session closes it first, so
/// `active` is never reported past `expires_at`.
pub async fn get_session(
    State(service): State<Arc<SessionService>>,
    Extension(UserId(user_id)): Extension<UserId>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let session = service.status(user_id, session_id)?;
    Ok(Json(SessionStatusResponse::from_session(
        &session,
        Utc::now(),
    )))
}

/// Saves the answer set for one question, replacing any previous set.
/// Returns 410 once the time limit has elapsed.
pub async fn save_answer(
    State(service): State<Arc<SessionService>>,
    Extension(UserId(user_id)): Extension<UserId>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<SaveAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let session = service.save_answer(user_id, session_id, req.question_id, req.option_ids)?;
    Ok(Json(SaveAnswerResponse {
        answered_questions: session.answered_questions(),
        total_questions: session.exam.data.total_questions,
        remaining_time: session.remaining_seconds(Utc::now()),
    }))
}

/// Submits the session and returns the scored result. Idempotent: a
/// terminal session returns its stored result unchanged. A submit past the
/// deadline closes the session as expired and says so.
pub async fn submit_session(
    State(service): State<Arc<SessionService>>,
    Extension(UserId(user_id)): Extension<UserId>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = service.submit(user_id, session_id)?;
    Ok(Json(SubmitResponse::from(outcome)))
}

/// Detailed per-question breakdown with correctness revealed.
/// Only available once the session is terminal.
pub async fn get_result(
    State(service): State<Arc<SessionService>>,
    Extension(UserId(user_id)): Extension<UserId>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = service.result(user_id, session_id)?;
    Ok(Json(SubmitResponse::from(outcome)))
}
