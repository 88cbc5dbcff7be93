// src/models/session.rs

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::exam::{ExamData, GeneratedExam};
use crate::models::question::AnswerOption;

/// Session state machine. `Submitted` and `Expired` are terminal:
/// no transition ever leaves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Submitted,
    Expired,
}

impl SessionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Submitted | SessionStatus::Expired)
    }
}

/// A durable, time-boxed exam session binding one user to one generated exam.
/// Exactly one non-terminal session may exist per (user, certification) pair.
/// Never deleted - terminal sessions are retained as audit records.
#[derive(Debug, Clone)]
pub struct ExamSession {
    pub id: Uuid,
    pub user_id: i64,
    pub certification_id: i64,
    pub exam: GeneratedExam,

    /// Latest saved answer set per question id. A save replaces the set
    /// for that question; it never merges.
    pub answers: HashMap<i64, BTreeSet<i64>>,

    pub started_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,

    /// Final score percentage, set exactly once on the terminal transition.
    pub score: Option<f64>,
    pub passed: Option<bool>,

    pub status: SessionStatus,
}

impl ExamSession {
    pub fn new(
        user_id: i64,
        certification_id: i64,
        exam: GeneratedExam,
        started_at: DateTime<Utc>,
        time_limit: chrono::Duration,
    ) -> Self {
        ExamSession {
            id: Uuid::new_v4(),
            user_id,
            certification_id,
            exam,
            answers: HashMap::new(),
            started_at,
            expires_at: started_at + time_limit,
            submitted_at: None,
            score: None,
            passed: None,
            status: SessionStatus::Active,
        }
    }

    /// Whether the wall clock has passed the time limit. Independent of
    /// `status`: the caller decides whether a transition is due.
    pub fn is_past_deadline(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Seconds left on the clock. 0 once terminal or past the deadline.
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> i64 {
        if self.status.is_terminal() || self.is_past_deadline(now) {
            return 0;
        }
        (self.expires_at - now).num_seconds().max(0)
    }

    /// Number of questions with a saved answer set (an explicitly saved
    /// empty set counts as answered for progress purposes).
    pub fn answered_questions(&self) -> usize {
        self.answers.len()
    }
}

/// Per-question breakdown in a terminal result. Reveals the options with
/// their correctness flags - only ever built after a terminal transition.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct QuestionResult {
    pub question_id: i64,
    pub question: String,
    pub options: Vec<AnswerOption>,
    pub correct_answer_ids: BTreeSet<i64>,
    pub submitted_answer_ids: BTreeSet<i64>,
    pub is_correct: bool,
}

/// Final scoring outcome for a terminal session.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct QuizResult {
    pub score: f64,
    pub passed: bool,
    pub submitted_at: Option<DateTime<Utc>>,
    pub per_question: Vec<QuestionResult>,
}

/// DTO returned by start and status endpoints.
#[derive(Debug, Serialize)]
pub struct SessionStatusResponse {
    pub session_id: Uuid,
    pub status: SessionStatus,
    pub exam_data: ExamData,
    pub started_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Seconds.
    pub remaining_time: i64,
    pub answered_questions: usize,
    pub total_questions: u32,
}

impl SessionStatusResponse {
    pub fn from_session(session: &ExamSession, now: DateTime<Utc>) -> Self {
        SessionStatusResponse {
            session_id: session.id,
            status: session.status,
            exam_data: session.exam.data.clone(),
            started_at: session.started_at,
            expires_at: session.expires_at,
            remaining_time: session.remaining_seconds(now),
            answered_questions: session.answered_questions(),
            total_questions: session.exam.data.total_questions,
        }
    }
}

/// DTO for saving an answer. The option set replaces any previous set
/// for the question.
#[derive(Debug, Deserialize)]
pub struct SaveAnswerRequest {
    pub question_id: i64,
    pub option_ids: BTreeSet<i64>,
}

/// DTO returned by a successful save.
#[derive(Debug, Serialize)]
pub struct SaveAnswerResponse {
    pub answered_questions: usize,
    pub total_questions: u32,
    /// Seconds.
    pub remaining_time: i64,
}
