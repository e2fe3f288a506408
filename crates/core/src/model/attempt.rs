use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{AttemptId, QuestionId, TestId};

/// Historical record of one completed exam submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attempt {
    pub id: AttemptId,
    pub test_id: TestId,
    pub attempted_at: DateTime<Utc>,
    pub score: u32,
    pub total_questions: u32,
}

/// What the user chose for one question of an attempt, and what was correct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptDetailEntry {
    pub question_id: QuestionId,
    pub user_answer: Option<String>,
    pub correct_answer: Option<String>,
    pub is_correct: Option<bool>,
}

impl AttemptDetailEntry {
    /// Correctness as recorded, falling back to comparing the stored answers.
    #[must_use]
    pub fn correct(&self) -> bool {
        self.is_correct.unwrap_or_else(|| {
            matches!(
                (&self.user_answer, &self.correct_answer),
                (Some(user), Some(correct)) if answers_match(user, correct)
            )
        })
    }
}

/// Aggregate dashboard numbers for one user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub attempts: u32,
    pub best: Option<u32>,
    pub average_score: Option<f64>,
}

/// One point of the performance-over-time series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub attempted_at: DateTime<Utc>,
    pub score: u32,
}

/// Answer comparison used by scoring: trimmed and case-insensitive.
#[must_use]
pub fn answers_match(user: &str, correct: &str) -> bool {
    user.trim().to_lowercase() == correct.trim().to_lowercase()
}
