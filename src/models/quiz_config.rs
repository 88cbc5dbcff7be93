// src/models/quiz_config.rs

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::question::Difficulty;

/// Exam configuration owned by a certification. At most one active
/// configuration per certification; the planner enforces the cross-field
/// invariant `sum(chapter_distribution) == total_questions`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct QuizConfiguration {
    #[validate(range(min = 1))]
    pub total_questions: u32,

    /// How many questions to draw from each chapter.
    pub chapter_distribution: HashMap<i64, u32>,

    /// Optional percentage split across difficulty tiers.
    /// When present, values must be in [0, 100] and sum to 100.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty_distribution: Option<HashMap<Difficulty, u32>>,

    /// Session time limit, in minutes.
    #[validate(range(min = 1))]
    pub time_limit: u32,

    /// Passing threshold, as a percentage of total points.
    #[validate(range(min = 0, max = 100))]
    pub passing_score: u32,
}

impl QuizConfiguration {
    pub fn time_limit_duration(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.time_limit as i64)
    }
}
