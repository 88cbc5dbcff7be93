// src/models/question.rs

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Difficulty tier of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// A single answer choice attached to a question.
/// The `correct` flag never leaves the server before a session is terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub id: i64,
    pub text: String,
    pub correct: bool,
}

/// A question as stored in the bank. Belongs to exactly one chapter;
/// option ids are unique within the question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,

    /// Chapter this question belongs to; eligibility for an exam is
    /// decided by chapter membership.
    pub chapter_id: i64,

    /// The text content of the question.
    pub content: String,

    pub difficulty: Difficulty,

    /// Point value awarded when answered exactly right.
    pub points: u32,

    /// Ordered list of answer options.
    pub answers: Vec<AnswerOption>,
}

impl Question {
    /// The set of option ids flagged correct.
    pub fn correct_option_ids(&self) -> BTreeSet<i64> {
        self.answers
            .iter()
            .filter(|opt| opt.correct)
            .map(|opt| opt.id)
            .collect()
    }

    /// All option ids, used to reject saves referencing unknown options.
    pub fn option_ids(&self) -> BTreeSet<i64> {
        self.answers.iter().map(|opt| opt.id).collect()
    }
}

/// DTO for an answer option shown to the exam taker (correctness stripped).
#[derive(Debug, Clone, Serialize)]
pub struct PublicOption {
    pub id: i64,
    pub text: String,
}

/// DTO for a question shown to the exam taker.
/// This is the only question shape that ever appears in an active-session response.
#[derive(Debug, Clone, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub content: String,
    pub options: Vec<PublicOption>,
}

impl From<&Question> for PublicQuestion {
    fn from(q: &Question) -> Self {
        PublicQuestion {
            id: q.id,
            content: q.content.clone(),
            options: q
                .answers
                .iter()
                .map(|opt| PublicOption {
                    id: opt.id,
                    text: opt.text.clone(),
                })
                .collect(),
        }
    }
}
