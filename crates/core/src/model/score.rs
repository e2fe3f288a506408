use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::ids::QuestionId;
use crate::model::question::Question;

/// Verdict for a single question in a scored exam.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionResult {
    pub user_answer: Option<String>,
    pub correct_answer: Option<String>,
    pub correct: bool,
}

impl QuestionResult {
    /// Result for a question the user never answered, keeping the answer key
    /// when it is known.
    #[must_use]
    pub fn unanswered(correct_answer: Option<&str>) -> Self {
        Self {
            user_answer: None,
            correct_answer: correct_answer.map(str::to_owned),
            correct: false,
        }
    }
}

/// Outcome of one exam submission, as returned by the scoring collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    score: u32,
    total_questions: u32,
    results: BTreeMap<QuestionId, QuestionResult>,
}

impl Score {
    #[must_use]
    pub fn new(
        score: u32,
        total_questions: u32,
        results: BTreeMap<QuestionId, QuestionResult>,
    ) -> Self {
        Self {
            score,
            total_questions,
            results,
        }
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn result(&self, question_id: QuestionId) -> Option<&QuestionResult> {
        self.results.get(&question_id)
    }

    #[must_use]
    pub fn results(&self) -> &BTreeMap<QuestionId, QuestionResult> {
        &self.results
    }

    /// Ensure every question of the exam has an entry.
    ///
    /// The scoring collaborator only reports questions that were answered;
    /// the rest are recorded as unanswered so review never has to guess.
    #[must_use]
    pub fn covering(mut self, questions: &[Question]) -> Self {
        for question in questions {
            self.results
                .entry(question.id())
                .or_insert_with(|| QuestionResult::unanswered(question.answer()));
        }
        self
    }
}
