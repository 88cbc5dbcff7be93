// src/engine/bank.rs

use std::collections::HashMap;

use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};

use crate::error::AppError;
use crate::models::question::{Difficulty, Question};

/// Read-only view over the stored questions, grouped by chapter.
/// Exposes counts and random sampling without replacement; never mutated
/// after construction.
#[derive(Debug, Default)]
pub struct QuestionBank {
    by_chapter: HashMap<i64, Vec<Question>>,
}

impl QuestionBank {
    pub fn new(questions: Vec<Question>) -> Self {
        let mut by_chapter: HashMap<i64, Vec<Question>> = HashMap::new();
        for q in questions {
            by_chapter.entry(q.chapter_id).or_default().push(q);
        }
        QuestionBank { by_chapter }
    }

    /// Number of eligible questions in a chapter. 0 for unknown chapters.
    pub fn available(&self, chapter_id: i64) -> u32 {
        self.by_chapter
            .get(&chapter_id)
            .map(|qs| qs.len() as u32)
            .unwrap_or(0)
    }

    /// Total questions across all chapters.
    pub fn total(&self) -> usize {
        self.by_chapter.values().map(|qs| qs.len()).sum()
    }

    /// Samples `count` distinct questions uniformly at random from a chapter.
    /// Counts are re-checked here: a pool that shrank since planning is a
    /// hard failure, never a short exam.
    pub fn sample(
        &self,
        chapter_id: i64,
        count: u32,
        rng: &mut impl Rng,
    ) -> Result<Vec<Question>, AppError> {
        let pool = self.by_chapter.get(&chapter_id).map(Vec::as_slice).unwrap_or(&[]);
        if (pool.len() as u32) < count {
            return Err(AppError::InsufficientQuestions {
                chapter_id,
                requested: count,
                available: pool.len() as u32,
            });
        }
        Ok(pool
            .choose_multiple(rng, count as usize)
            .cloned()
            .collect())
    }

    /// Samples `count` distinct questions from a chapter, steering toward the
    /// given per-tier targets. Tiers with too few questions fall back to the
    /// rest of the pool; the chapter quota itself stays hard.
    pub fn sample_with_difficulty(
        &self,
        chapter_id: i64,
        count: u32,
        targets: &HashMap<Difficulty, u32>,
        rng: &mut impl Rng,
    ) -> Result<Vec<Question>, AppError> {
        let pool = self.by_chapter.get(&chapter_id).map(Vec::as_slice).unwrap_or(&[]);
        if (pool.len() as u32) < count {
            return Err(AppError::InsufficientQuestions {
                chapter_id,
                requested: count,
                available: pool.len() as u32,
            });
        }

        let mut picked: Vec<Question> = Vec::with_capacity(count as usize);
        for (difficulty, target) in targets {
            let tier: Vec<&Question> = pool
                .iter()
                .filter(|q| q.difficulty == *difficulty)
                .collect();
            let take = (*target as usize).min(tier.len());
            picked.extend(tier.choose_multiple(rng, take).map(|q| (*q).clone()));
        }

        // Fill any shortfall from questions not yet picked, any difficulty.
        if picked.len() < count as usize {
            let remaining: Vec<&Question> = pool
                .iter()
                .filter(|q| !picked.iter().any(|p| p.id == q.id))
                .collect();
            let need = count as usize - picked.len();
            picked.extend(remaining.choose_multiple(rng, need).map(|q| (*q).clone()));
        }

        picked.shuffle(rng);
        picked.truncate(count as usize);
        Ok(picked)
    }
}
