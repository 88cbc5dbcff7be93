// src/models/exam.rs

use std::collections::HashMap;

use serde::Serialize;

use crate::models::question::{PublicQuestion, Question};

/// The client-visible half of a generated exam. Safe to serialize:
/// carries no correctness flags.
#[derive(Debug, Clone, Serialize)]
pub struct ExamData {
    pub questions: Vec<PublicQuestion>,
    pub total_questions: u32,
    pub total_points: u32,
    /// Minutes.
    pub time_limit: u32,
    pub passing_score: u32,
}

/// A generated exam: the public payload plus the private answer key.
/// Deliberately not `Serialize` - responses are built from `ExamData`
/// or from a terminal-session result, never from this struct.
#[derive(Debug, Clone)]
pub struct GeneratedExam {
    pub certification_id: i64,
    pub data: ExamData,

    /// Answer key: the full stored question per id, so a terminal result
    /// can reveal options, correctness and point values.
    pub key: HashMap<i64, Question>,
}
