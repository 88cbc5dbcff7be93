// src/engine/generator.rs

use std::collections::HashMap;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::engine::bank::QuestionBank;
use crate::engine::planner::ExamPlan;
use crate::error::AppError;
use crate::models::exam::{ExamData, GeneratedExam};
use crate::models::question::{Difficulty, PublicQuestion, Question};
use crate::models::quiz_config::QuizConfiguration;

/// Turns a validated plan into an exam payload.
///
/// Samples each chapter quota without replacement, shuffles the combined
/// order so chapter grouping does not leak through, and splits the result
/// into the public payload (no correctness flags) and the private answer
/// key. Pool counts are re-validated at sampling time; a pool that shrank
/// since planning fails hard rather than producing a short exam.
pub fn generate_exam(
    certification_id: i64,
    config: &QuizConfiguration,
    plan: &ExamPlan,
    bank: &QuestionBank,
    rng: &mut impl Rng,
) -> Result<GeneratedExam, AppError> {
    let mut selected: Vec<Question> = Vec::with_capacity(plan.total_questions() as usize);

    for &(chapter_id, count) in &plan.quotas {
        let sampled = match &config.difficulty_distribution {
            Some(dist) => {
                let targets = difficulty_targets(count, dist);
                bank.sample_with_difficulty(chapter_id, count, &targets, rng)?
            }
            None => bank.sample(chapter_id, count, rng)?,
        };
        selected.extend(sampled);
    }

    selected.shuffle(rng);

    let total_points: u32 = selected.iter().map(|q| q.points).sum();
    let questions: Vec<PublicQuestion> = selected.iter().map(PublicQuestion::from).collect();
    let key: HashMap<i64, Question> = selected.into_iter().map(|q| (q.id, q)).collect();

    tracing::debug!(
        certification_id,
        total_questions = questions.len(),
        total_points,
        "generated exam"
    );

    Ok(GeneratedExam {
        certification_id,
        data: ExamData {
            questions,
            total_questions: plan.total_questions(),
            total_points,
            time_limit: config.time_limit,
            passing_score: config.passing_score,
        },
        key,
    })
}

/// Splits a chapter quota across difficulty tiers by percentage, using
/// largest-remainder rounding so the targets always sum to `count`.
pub fn difficulty_targets(count: u32, dist: &HashMap<Difficulty, u32>) -> HashMap<Difficulty, u32> {
    let mut shares: Vec<(Difficulty, u32, u32)> = dist
        .iter()
        .map(|(&difficulty, &percent)| {
            let exact = count * percent;
            (difficulty, exact / 100, exact % 100)
        })
        .collect();
    // Deterministic tie-breaking: larger remainder first, then tier order.
    shares.sort_by(|a, b| b.2.cmp(&a.2).then_with(|| (a.0 as u8).cmp(&(b.0 as u8))));

    let assigned: u32 = shares.iter().map(|(_, floor, _)| floor).sum();
    let mut leftover = count - assigned;

    let mut targets = HashMap::new();
    for (difficulty, floor, _) in shares {
        let extra = if leftover > 0 { 1 } else { 0 };
        leftover -= extra;
        targets.insert(difficulty, floor + extra);
    }
    targets
}
