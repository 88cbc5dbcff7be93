// src/engine/scorer.rs

use std::collections::{BTreeSet, HashMap};

use crate::models::exam::GeneratedExam;
use crate::models::session::{QuestionResult, QuizResult};

/// Scores a finished exam. Pure: same key + same answers always yields the
/// same result.
///
/// A question is correct iff the submitted option set exactly equals the
/// correct set - no partial credit, supersets count as wrong. Unanswered
/// questions (absent from the map or saved as an empty set) score zero.
/// The total is `100 * earned points / total points`, rounded to two
/// decimals.
pub fn score_exam(
    exam: &GeneratedExam,
    answers: &HashMap<i64, BTreeSet<i64>>,
    passing_score: u32,
) -> QuizResult {
    let total_points = exam.data.total_points;
    let mut earned_points: u32 = 0;
    let mut per_question = Vec::with_capacity(exam.data.questions.len());

    // Walk the public payload so the breakdown follows exam order.
    for public in &exam.data.questions {
        let Some(stored) = exam.key.get(&public.id) else {
            continue;
        };
        let correct_answer_ids = stored.correct_option_ids();
        let submitted_answer_ids = answers.get(&public.id).cloned().unwrap_or_default();
        let is_correct =
            !correct_answer_ids.is_empty() && submitted_answer_ids == correct_answer_ids;

        if is_correct {
            earned_points += stored.points;
        }

        per_question.push(QuestionResult {
            question_id: public.id,
            question: stored.content.clone(),
            options: stored.answers.clone(),
            correct_answer_ids,
            submitted_answer_ids,
            is_correct,
        });
    }

    let score = if total_points == 0 {
        0.0
    } else {
        round2(100.0 * earned_points as f64 / total_points as f64)
    };

    QuizResult {
        score,
        passed: score >= passing_score as f64,
        submitted_at: None,
        per_question,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
