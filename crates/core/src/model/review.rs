use std::collections::HashMap;

use crate::model::attempt::{AttemptDetailEntry, answers_match};
use crate::model::ids::{AttemptId, TestId};
use crate::model::question::Question;
use crate::model::score::Score;

//
// ─── OUTCOME ───────────────────────────────────────────────────────────────────
//

/// Whether a reviewed question has a recorded result.
///
/// `NoResult` is a valid state and is never rendered as correct or incorrect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewOutcome {
    NoResult,
    Result {
        user_answer: Option<String>,
        correct_answer: Option<String>,
        correct: bool,
    },
}

impl ReviewOutcome {
    #[must_use]
    pub fn has_result(&self) -> bool {
        matches!(self, ReviewOutcome::Result { .. })
    }
}

/// Per-option marker used when displaying a reviewed question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionMark {
    Correct,
    UserWrong,
    Plain,
}

//
// ─── ITEMS ─────────────────────────────────────────────────────────────────────
//

/// One question in read-only review form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewItem {
    pub question: Question,
    pub outcome: ReviewOutcome,
}

impl ReviewItem {
    /// Mark for each option, in option order.
    ///
    /// Questions without a result get no marks at all. Options are compared
    /// the way scoring compares answers.
    #[must_use]
    pub fn option_marks(&self) -> Vec<OptionMark> {
        match &self.outcome {
            ReviewOutcome::NoResult => Vec::new(),
            ReviewOutcome::Result {
                user_answer,
                correct_answer,
                ..
            } => self
                .question
                .options()
                .iter()
                .map(|opt| {
                    let matches = |answer: &Option<String>| {
                        answer.as_deref().is_some_and(|a| answers_match(a, opt))
                    };
                    if matches(correct_answer) {
                        OptionMark::Correct
                    } else if matches(user_answer) {
                        OptionMark::UserWrong
                    } else {
                        OptionMark::Plain
                    }
                })
                .collect(),
        }
    }
}

/// A finished attempt merged with its test's questions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptReview {
    pub attempt_id: AttemptId,
    pub test_id: TestId,
    pub items: Vec<ReviewItem>,
}

impl AttemptReview {
    #[must_use]
    pub fn correct_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| matches!(item.outcome, ReviewOutcome::Result { correct: true, .. }))
            .count()
    }

    #[must_use]
    pub fn missing_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| !item.outcome.has_result())
            .count()
    }
}

//
// ─── MERGE ─────────────────────────────────────────────────────────────────────
//

/// Merge a test's questions with the detail entries of one attempt.
///
/// Question order drives the output; entries for unknown questions are dropped.
#[must_use]
pub fn merge_attempt(questions: Vec<Question>, details: &[AttemptDetailEntry]) -> Vec<ReviewItem> {
    let by_id: HashMap<_, _> = details.iter().map(|d| (d.question_id, d)).collect();
    questions
        .into_iter()
        .map(|question| {
            let outcome = match by_id.get(&question.id()) {
                Some(entry) => ReviewOutcome::Result {
                    user_answer: entry.user_answer.clone(),
                    correct_answer: entry.correct_answer.clone(),
                    correct: entry.correct(),
                },
                None => ReviewOutcome::NoResult,
            };
            ReviewItem { question, outcome }
        })
        .collect()
}

/// Review form of a freshly scored exam.
#[must_use]
pub fn merge_score(questions: &[Question], score: &Score) -> Vec<ReviewItem> {
    questions
        .iter()
        .map(|question| {
            let outcome = match score.result(question.id()) {
                Some(result) => ReviewOutcome::Result {
                    user_answer: result.user_answer.clone(),
                    correct_answer: result.correct_answer.clone(),
                    correct: result.correct,
                },
                None => ReviewOutcome::NoResult,
            };
            ReviewItem {
                question: question.clone(),
                outcome,
            }
        })
        .collect()
}
