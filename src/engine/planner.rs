// src/engine/planner.rs

use crate::engine::bank::QuestionBank;
use crate::error::AppError;
use crate::models::quiz_config::QuizConfiguration;

/// Concrete sampling plan: how many questions to draw from each chapter.
/// Ordered by chapter id so planning is deterministic; the generator owns
/// all randomness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamPlan {
    pub quotas: Vec<(i64, u32)>,
}

impl ExamPlan {
    pub fn total_questions(&self) -> u32 {
        self.quotas.iter().map(|(_, count)| count).sum()
    }
}

/// Validates a configuration against the live bank and produces a plan.
/// Pure and side-effect-free: safe to call repeatedly to preview
/// configuration changes without generating anything.
pub fn build_plan(
    config: &QuizConfiguration,
    bank: &QuestionBank,
) -> Result<ExamPlan, AppError> {
    if let Some(err) = collect_errors(config, bank).into_iter().next() {
        return Err(err);
    }

    let mut quotas: Vec<(i64, u32)> = config
        .chapter_distribution
        .iter()
        .map(|(&chapter_id, &count)| (chapter_id, count))
        .collect();
    quotas.sort_by_key(|&(chapter_id, _)| chapter_id);

    Ok(ExamPlan { quotas })
}

/// Full validation report for the preview endpoint: every problem found,
/// as human-readable messages, instead of failing on the first.
pub fn validate(config: &QuizConfiguration, bank: &QuestionBank) -> Vec<String> {
    collect_errors(config, bank)
        .iter()
        .map(|e| e.to_string())
        .collect()
}

fn collect_errors(config: &QuizConfiguration, bank: &QuestionBank) -> Vec<AppError> {
    let mut errors = Vec::new();
    let mut config_problems = Vec::new();

    if config.total_questions == 0 {
        config_problems.push("total_questions must be at least 1".to_string());
    }
    if config.time_limit == 0 {
        config_problems.push("time_limit must be at least 1 minute".to_string());
    }
    if config.passing_score > 100 {
        config_problems.push(format!(
            "passing_score must be in [0, 100], got {}",
            config.passing_score
        ));
    }

    if config.chapter_distribution.is_empty() {
        config_problems.push("no chapters configured".to_string());
    } else {
        for (&chapter_id, &count) in &config.chapter_distribution {
            if count == 0 {
                config_problems.push(format!("chapter {} has a non-positive quota", chapter_id));
            }
        }
        let sum: u32 = config.chapter_distribution.values().sum();
        if sum != config.total_questions {
            config_problems.push(format!(
                "chapter quotas sum to {} but total_questions is {}",
                sum, config.total_questions
            ));
        }
    }

    if let Some(dist) = &config.difficulty_distribution {
        for (difficulty, &percent) in dist {
            if percent > 100 {
                config_problems.push(format!(
                    "difficulty {:?} percentage {} is out of [0, 100]",
                    difficulty, percent
                ));
            }
        }
        let sum: u32 = dist.values().sum();
        if sum != 100 {
            config_problems.push(format!("difficulty percentages sum to {}, expected 100", sum));
        }
    }

    if !config_problems.is_empty() {
        errors.push(AppError::InvalidConfiguration(config_problems));
    }

    // Feasibility against the live bank, one error per short chapter.
    let mut chapter_ids: Vec<i64> = config.chapter_distribution.keys().copied().collect();
    chapter_ids.sort();
    for chapter_id in chapter_ids {
        let requested = config.chapter_distribution[&chapter_id];
        let available = bank.available(chapter_id);
        if requested > available {
            errors.push(AppError::InsufficientQuestions {
                chapter_id,
                requested,
                available,
            });
        }
    }

    errors
}
