// src/engine/service.rs

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rand::Rng;
use uuid::Uuid;

use crate::engine::bank::QuestionBank;
use crate::engine::{generator, planner, scorer};
use crate::error::AppError;
use crate::models::exam::ExamData;
use crate::models::quiz_config::QuizConfiguration;
use crate::models::session::{ExamSession, QuizResult, SessionStatus};

/// Result of a submit call: the terminal session plus its scored breakdown.
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub session: ExamSession,
    pub result: QuizResult,
}

/// Orchestrates session lifecycle: creation (one active session per
/// user+certification), answer capture, lazy expiry, and submission.
/// The only component that mutates session state; the single mutex
/// serializes concurrent saves against the same answer map.
pub struct SessionService {
    bank: Arc<QuestionBank>,
    configs: HashMap<i64, QuizConfiguration>,
    table: Mutex<SessionTable>,
}

#[derive(Default)]
struct SessionTable {
    by_id: HashMap<Uuid, ExamSession>,
    /// (user_id, certification_id) -> possibly-active session. Entries are
    /// dropped on the next start once the session turns terminal; sessions
    /// themselves are never deleted.
    active: HashMap<(i64, i64), Uuid>,
}

impl SessionService {
    pub fn new(bank: Arc<QuestionBank>, configs: HashMap<i64, QuizConfiguration>) -> Self {
        SessionService {
            bank,
            configs,
            table: Mutex::new(SessionTable::default()),
        }
    }

    fn config_for(&self, certification_id: i64) -> Result<&QuizConfiguration, AppError> {
        self.configs.get(&certification_id).ok_or_else(|| {
            AppError::NotFound(format!(
                "No quiz configuration for certification {}",
                certification_id
            ))
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, SessionTable>, AppError> {
        self.table
            .lock()
            .map_err(|_| AppError::InternalServerError("session table lock poisoned".to_string()))
    }

    /// Validation report for a certification's configuration against the
    /// live bank. Empty means the configuration can generate.
    pub fn validate_configuration(&self, certification_id: i64) -> Result<Vec<String>, AppError> {
        let config = self.config_for(certification_id)?;
        Ok(planner::validate(config, &self.bank))
    }

    /// Generates a one-off exam payload without opening a session
    /// (configuration preview). Returns only the public half.
    pub fn preview_exam(&self, certification_id: i64) -> Result<ExamData, AppError> {
        self.preview_exam_with(certification_id, &mut rand::rng())
    }

    pub fn preview_exam_with(
        &self,
        certification_id: i64,
        rng: &mut impl Rng,
    ) -> Result<ExamData, AppError> {
        let config = self.config_for(certification_id)?;
        let plan = planner::build_plan(config, &self.bank)?;
        let exam = generator::generate_exam(certification_id, config, &plan, &self.bank, rng)?;
        Ok(exam.data)
    }

    /// Starts (or resumes) a session. Idempotent: while a non-terminal
    /// session exists for this user+certification it is returned unchanged.
    /// A wall-expired session is closed first, then a fresh one is created.
    pub fn start(&self, user_id: i64, certification_id: i64) -> Result<ExamSession, AppError> {
        self.start_at(user_id, certification_id, Utc::now(), &mut rand::rng())
    }

    pub fn start_at(
        &self,
        user_id: i64,
        certification_id: i64,
        now: DateTime<Utc>,
        rng: &mut impl Rng,
    ) -> Result<ExamSession, AppError> {
        let config = self.config_for(certification_id)?;
        let mut table = self.lock()?;

        if let Some(&session_id) = table.active.get(&(user_id, certification_id)) {
            let session = table.by_id.get_mut(&session_id).ok_or_else(|| {
                AppError::InternalServerError("active index points at missing session".to_string())
            })?;
            Self::expire_if_due(session, now);
            if session.status == SessionStatus::Active {
                return Ok(session.clone());
            }
            table.active.remove(&(user_id, certification_id));
        }

        let plan = planner::build_plan(config, &self.bank)?;
        let exam = generator::generate_exam(certification_id, config, &plan, &self.bank, rng)?;
        let session = ExamSession::new(
            user_id,
            certification_id,
            exam,
            now,
            config.time_limit_duration(),
        );

        tracing::info!(
            session_id = %session.id,
            user_id,
            certification_id,
            expires_at = %session.expires_at,
            "exam session started"
        );

        table.active.insert((user_id, certification_id), session.id);
        table.by_id.insert(session.id, session.clone());
        Ok(session)
    }

    /// Saves the answer set for one question, replacing any previous set.
    /// Expiry is checked on every save: a stale client keeps getting
    /// `ExamTimeExpired` while the session is auto-closed underneath it.
    pub fn save_answer(
        &self,
        user_id: i64,
        session_id: Uuid,
        question_id: i64,
        option_ids: BTreeSet<i64>,
    ) -> Result<ExamSession, AppError> {
        self.save_answer_at(user_id, session_id, question_id, option_ids, Utc::now())
    }

    pub fn save_answer_at(
        &self,
        user_id: i64,
        session_id: Uuid,
        question_id: i64,
        option_ids: BTreeSet<i64>,
        now: DateTime<Utc>,
    ) -> Result<ExamSession, AppError> {
        let mut table = self.lock()?;
        let session = Self::owned_session_mut(&mut table, user_id, session_id)?;

        if Self::expire_if_due(session, now) {
            return Err(AppError::ExamTimeExpired);
        }
        match session.status {
            SessionStatus::Active => {}
            SessionStatus::Expired => return Err(AppError::ExamTimeExpired),
            SessionStatus::Submitted => {
                return Err(AppError::BadRequest(
                    "Session has already been submitted".to_string(),
                ));
            }
        }

        let question = session.exam.key.get(&question_id).ok_or_else(|| {
            AppError::BadRequest(format!("Question {} is not part of this exam", question_id))
        })?;
        if !option_ids.is_subset(&question.option_ids()) {
            return Err(AppError::BadRequest(format!(
                "Unknown option id for question {}",
                question_id
            )));
        }

        session.answers.insert(question_id, option_ids);
        Ok(session.clone())
    }

    /// Submits a session. Idempotent on terminal sessions: the stored
    /// terminal state is returned unchanged, with no re-scoring. A submit
    /// that discovers the deadline has passed closes the session as
    /// `Expired` - scored from whatever was saved.
    pub fn submit(&self, user_id: i64, session_id: Uuid) -> Result<SubmitOutcome, AppError> {
        self.submit_at(user_id, session_id, Utc::now())
    }

    pub fn submit_at(
        &self,
        user_id: i64,
        session_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<SubmitOutcome, AppError> {
        let mut table = self.lock()?;
        let session = Self::owned_session_mut(&mut table, user_id, session_id)?;

        if session.status == SessionStatus::Active {
            if session.is_past_deadline(now) {
                Self::finalize(session, SessionStatus::Expired, now);
            } else {
                Self::finalize(session, SessionStatus::Submitted, now);
            }
        }

        let result = Self::terminal_result(session);
        Ok(SubmitOutcome {
            session: session.clone(),
            result,
        })
    }

    /// Read-only view of a session. Passive expiry runs first, so a caller
    /// never observes `active` past `expires_at`.
    pub fn status(&self, user_id: i64, session_id: Uuid) -> Result<ExamSession, AppError> {
        self.status_at(user_id, session_id, Utc::now())
    }

    pub fn status_at(
        &self,
        user_id: i64,
        session_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<ExamSession, AppError> {
        let mut table = self.lock()?;
        let session = Self::owned_session_mut(&mut table, user_id, session_id)?;
        Self::expire_if_due(session, now);
        Ok(session.clone())
    }

    /// Detailed per-question breakdown. Only available once terminal; the
    /// answer key is never revealed while a session is active.
    pub fn result(&self, user_id: i64, session_id: Uuid) -> Result<SubmitOutcome, AppError> {
        self.result_at(user_id, session_id, Utc::now())
    }

    pub fn result_at(
        &self,
        user_id: i64,
        session_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<SubmitOutcome, AppError> {
        let mut table = self.lock()?;
        let session = Self::owned_session_mut(&mut table, user_id, session_id)?;
        Self::expire_if_due(session, now);
        if !session.status.is_terminal() {
            return Err(AppError::BadRequest(
                "Exam is still in progress; results are revealed after submission".to_string(),
            ));
        }
        let result = Self::terminal_result(session);
        Ok(SubmitOutcome {
            session: session.clone(),
            result,
        })
    }

    fn owned_session_mut<'a>(
        table: &'a mut SessionTable,
        user_id: i64,
        session_id: Uuid,
    ) -> Result<&'a mut ExamSession, AppError> {
        let session = table
            .by_id
            .get_mut(&session_id)
            .ok_or_else(|| AppError::NotFound("Session not found".to_string()))?;
        if session.user_id != user_id {
            return Err(AppError::Forbidden(
                "Session belongs to another user".to_string(),
            ));
        }
        Ok(session)
    }

    /// Lazy expiry: an active session past its deadline transitions to
    /// `Expired` (scored from saved answers) before the caller sees it.
    fn expire_if_due(session: &mut ExamSession, now: DateTime<Utc>) -> bool {
        if session.status == SessionStatus::Active && session.is_past_deadline(now) {
            Self::finalize(session, SessionStatus::Expired, now);
            true
        } else {
            false
        }
    }

    /// The single terminal transition. Score, pass/fail and submitted_at
    /// are stored exactly once.
    fn finalize(session: &mut ExamSession, status: SessionStatus, now: DateTime<Utc>) {
        let result = scorer::score_exam(
            &session.exam,
            &session.answers,
            session.exam.data.passing_score,
        );
        session.score = Some(result.score);
        session.passed = Some(result.passed);
        session.submitted_at = Some(now);
        session.status = status;

        tracing::info!(
            session_id = %session.id,
            user_id = session.user_id,
            certification_id = session.certification_id,
            status = ?status,
            score = result.score,
            passed = result.passed,
            "exam session closed"
        );
    }

    /// Rebuilds the detailed breakdown for a terminal session from the
    /// stored key and answers, keeping the stored score - repeated submits
    /// return the identical result.
    fn terminal_result(session: &ExamSession) -> QuizResult {
        let mut result = scorer::score_exam(
            &session.exam,
            &session.answers,
            session.exam.data.passing_score,
        );
        if let Some(score) = session.score {
            result.score = score;
        }
        if let Some(passed) = session.passed {
            result.passed = passed;
        }
        result.submitted_at = session.submitted_at;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::{AnswerOption, Difficulty, Question};
    use chrono::TimeZone;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn question(id: i64, chapter_id: i64) -> Question {
        Question {
            id,
            chapter_id,
            content: format!("Question {}", id),
            difficulty: Difficulty::Medium,
            points: 1,
            answers: vec![
                AnswerOption {
                    id: id * 10 + 1,
                    text: "Right".to_string(),
                    correct: true,
                },
                AnswerOption {
                    id: id * 10 + 2,
                    text: "Wrong".to_string(),
                    correct: false,
                },
            ],
        }
    }

    /// Certification 1: 5 questions over chapters 1+2, 30 minutes.
    /// Certification 2: 2 questions from chapter 1, 1 minute.
    fn service() -> SessionService {
        let mut questions = Vec::new();
        for id in 1..=10 {
            questions.push(question(id, 1));
        }
        for id in 11..=20 {
            questions.push(question(id, 2));
        }
        let bank = Arc::new(QuestionBank::new(questions));

        let mut configs = HashMap::new();
        configs.insert(
            1,
            QuizConfiguration {
                total_questions: 5,
                chapter_distribution: [(1, 3), (2, 2)].into_iter().collect(),
                difficulty_distribution: None,
                time_limit: 30,
                passing_score: 60,
            },
        );
        configs.insert(
            2,
            QuizConfiguration {
                total_questions: 2,
                chapter_distribution: [(1, 2)].into_iter().collect(),
                difficulty_distribution: None,
                time_limit: 1,
                passing_score: 60,
            },
        );
        SessionService::new(bank, configs)
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
    }

    fn correct_set(session: &ExamSession, question_id: i64) -> BTreeSet<i64> {
        session.exam.key[&question_id].correct_option_ids()
    }

    #[test]
    fn start_is_idempotent_while_active() {
        let service = service();
        let mut rng = StdRng::seed_from_u64(1);
        let first = service.start_at(7, 1, t0(), &mut rng).unwrap();
        let second = service
            .start_at(7, 1, t0() + chrono::Duration::minutes(5), &mut rng)
            .unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.started_at, second.started_at);
    }

    #[test]
    fn different_users_get_independent_sessions() {
        let service = service();
        let mut rng = StdRng::seed_from_u64(1);
        let a = service.start_at(7, 1, t0(), &mut rng).unwrap();
        let b = service.start_at(8, 1, t0(), &mut rng).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn start_after_expiry_closes_old_session_and_opens_new() {
        let service = service();
        let mut rng = StdRng::seed_from_u64(1);
        let first = service.start_at(7, 2, t0(), &mut rng).unwrap();

        let later = t0() + chrono::Duration::seconds(61);
        let second = service.start_at(7, 2, later, &mut rng).unwrap();
        assert_ne!(first.id, second.id);

        // Old session is retained as an audit record, closed and scored.
        let old = service.status_at(7, first.id, later).unwrap();
        assert_eq!(old.status, SessionStatus::Expired);
        assert_eq!(old.score, Some(0.0));
    }

    #[test]
    fn save_replaces_rather_than_merges() {
        let service = service();
        let mut rng = StdRng::seed_from_u64(1);
        let session = service.start_at(7, 1, t0(), &mut rng).unwrap();
        let qid = session.exam.data.questions[0].id;
        let options = session.exam.key[&qid].option_ids();
        let first: BTreeSet<i64> = options.iter().take(1).copied().collect();
        let second: BTreeSet<i64> = options.iter().skip(1).take(1).copied().collect();

        service
            .save_answer_at(7, session.id, qid, first, t0())
            .unwrap();
        let updated = service
            .save_answer_at(7, session.id, qid, second.clone(), t0())
            .unwrap();

        assert_eq!(updated.answers[&qid], second);
        assert_eq!(updated.answered_questions(), 1);
    }

    #[test]
    fn save_rejects_unknown_question_and_option() {
        let service = service();
        let mut rng = StdRng::seed_from_u64(1);
        let session = service.start_at(7, 1, t0(), &mut rng).unwrap();

        let err = service
            .save_answer_at(7, session.id, 9999, BTreeSet::new(), t0())
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let qid = session.exam.data.questions[0].id;
        let err = service
            .save_answer_at(7, session.id, qid, [987654].into_iter().collect(), t0())
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn save_after_deadline_expires_session() {
        let service = service();
        let mut rng = StdRng::seed_from_u64(1);
        let session = service.start_at(7, 2, t0(), &mut rng).unwrap();
        let qid = session.exam.data.questions[0].id;

        let late = t0() + chrono::Duration::seconds(61);
        let err = service
            .save_answer_at(7, session.id, qid, BTreeSet::new(), late)
            .unwrap_err();
        assert_eq!(err, AppError::ExamTimeExpired);

        // Expiry happened as a side effect of the rejected save.
        let closed = service.status_at(7, session.id, late).unwrap();
        assert_eq!(closed.status, SessionStatus::Expired);
        assert_eq!(closed.score, Some(0.0));
        assert_eq!(closed.remaining_seconds(late), 0);

        // And stays rejected on retry.
        let err = service
            .save_answer_at(7, session.id, qid, BTreeSet::new(), late)
            .unwrap_err();
        assert_eq!(err, AppError::ExamTimeExpired);
    }

    #[test]
    fn submit_scores_saved_answers() {
        let service = service();
        let mut rng = StdRng::seed_from_u64(1);
        let session = service.start_at(7, 1, t0(), &mut rng).unwrap();

        // Answer everything correctly.
        for q in &session.exam.data.questions {
            service
                .save_answer_at(7, session.id, q.id, correct_set(&session, q.id), t0())
                .unwrap();
        }

        let outcome = service
            .submit_at(7, session.id, t0() + chrono::Duration::minutes(10))
            .unwrap();
        assert_eq!(outcome.session.status, SessionStatus::Submitted);
        assert_eq!(outcome.result.score, 100.0);
        assert!(outcome.result.passed);
        assert!(outcome.result.per_question.iter().all(|q| q.is_correct));
        assert_eq!(outcome.result.submitted_at, outcome.session.submitted_at);
    }

    #[test]
    fn submit_past_deadline_expires_and_scores_zero() {
        let service = service();
        let mut rng = StdRng::seed_from_u64(1);
        let session = service.start_at(7, 2, t0(), &mut rng).unwrap();

        let outcome = service
            .submit_at(7, session.id, t0() + chrono::Duration::seconds(61))
            .unwrap();
        assert_eq!(outcome.session.status, SessionStatus::Expired);
        assert_eq!(outcome.result.score, 0.0);
        assert!(!outcome.result.passed);
    }

    #[test]
    fn double_submit_returns_identical_result() {
        let service = service();
        let mut rng = StdRng::seed_from_u64(1);
        let session = service.start_at(7, 1, t0(), &mut rng).unwrap();
        let qid = session.exam.data.questions[0].id;
        service
            .save_answer_at(7, session.id, qid, correct_set(&session, qid), t0())
            .unwrap();

        let first = service
            .submit_at(7, session.id, t0() + chrono::Duration::minutes(1))
            .unwrap();
        let second = service
            .submit_at(7, session.id, t0() + chrono::Duration::minutes(20))
            .unwrap();

        assert_eq!(first.session.status, second.session.status);
        assert_eq!(first.session.submitted_at, second.session.submitted_at);
        assert_eq!(first.result, second.result);
    }

    #[test]
    fn empty_set_and_absent_answer_score_the_same() {
        let service = service();
        let mut rng = StdRng::seed_from_u64(1);
        let session = service.start_at(7, 1, t0(), &mut rng).unwrap();
        let qid = session.exam.data.questions[0].id;

        // Explicitly saved empty set: answered for progress, wrong for score.
        let updated = service
            .save_answer_at(7, session.id, qid, BTreeSet::new(), t0())
            .unwrap();
        assert_eq!(updated.answered_questions(), 1);

        let outcome = service.submit_at(7, session.id, t0()).unwrap();
        assert_eq!(outcome.result.score, 0.0);
        let entry = outcome
            .result
            .per_question
            .iter()
            .find(|q| q.question_id == qid)
            .unwrap();
        assert!(!entry.is_correct);
        assert!(entry.submitted_answer_ids.is_empty());
    }

    #[test]
    fn status_never_reports_active_past_deadline() {
        let service = service();
        let mut rng = StdRng::seed_from_u64(1);
        let session = service.start_at(7, 2, t0(), &mut rng).unwrap();

        let late = t0() + chrono::Duration::seconds(60);
        let observed = service.status_at(7, session.id, late).unwrap();
        assert_eq!(observed.status, SessionStatus::Expired);
        assert_eq!(observed.remaining_seconds(late), 0);
    }

    #[test]
    fn foreign_user_is_rejected_without_data() {
        let service = service();
        let mut rng = StdRng::seed_from_u64(1);
        let session = service.start_at(7, 1, t0(), &mut rng).unwrap();

        let err = service.status_at(8, session.id, t0()).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        let err = service
            .save_answer_at(8, session.id, 1, BTreeSet::new(), t0())
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn unknown_session_is_not_found() {
        let service = service();
        let err = service.status_at(7, Uuid::new_v4(), t0()).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn result_is_gated_on_terminal_state() {
        let service = service();
        let mut rng = StdRng::seed_from_u64(1);
        let session = service.start_at(7, 1, t0(), &mut rng).unwrap();

        let err = service.result_at(7, session.id, t0()).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        service.submit_at(7, session.id, t0()).unwrap();
        let outcome = service.result_at(7, session.id, t0()).unwrap();
        assert_eq!(outcome.result.per_question.len(), 5);
        assert!(
            outcome
                .result
                .per_question
                .iter()
                .all(|q| !q.correct_answer_ids.is_empty())
        );
    }
}
