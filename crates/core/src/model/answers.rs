use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::ids::QuestionId;

/// Selected option per question for one exam.
///
/// At most one answer exists per question; a missing entry means unanswered.
/// Options are not checked against the question's declared options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerTracker {
    answers: BTreeMap<QuestionId, String>,
}

impl AnswerTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert the selection for `question_id`. Last write wins.
    pub fn set(&mut self, question_id: QuestionId, option: impl Into<String>) {
        self.answers.insert(question_id, option.into());
    }

    #[must_use]
    pub fn get(&self, question_id: QuestionId) -> Option<&str> {
        self.answers.get(&question_id).map(String::as_str)
    }

    #[must_use]
    pub fn is_answered(&self, question_id: QuestionId) -> bool {
        self.answers.contains_key(&question_id)
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    pub fn clear(&mut self) {
        self.answers.clear();
    }

    /// Immutable copy of the current answers, as sent for scoring.
    #[must_use]
    pub fn snapshot(&self) -> AnswerSheet {
        AnswerSheet {
            answers: self.answers.clone(),
        }
    }
}

/// Frozen set of answers submitted for scoring.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerSheet {
    answers: BTreeMap<QuestionId, String>,
}

impl AnswerSheet {
    #[must_use]
    pub fn get(&self, question_id: QuestionId) -> Option<&str> {
        self.answers.get(&question_id).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.answers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (QuestionId, &str)> {
        self.answers.iter().map(|(id, opt)| (*id, opt.as_str()))
    }
}

impl FromIterator<(QuestionId, String)> for AnswerSheet {
    fn from_iter<I: IntoIterator<Item = (QuestionId, String)>>(iter: I) -> Self {
        Self {
            answers: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_write_wins() {
        let mut tracker = AnswerTracker::new();
        let q1 = QuestionId::new(1);
        tracker.set(q1, "a");
        tracker.set(q1, "c");
        tracker.set(q1, "c");
        assert_eq!(tracker.get(q1), Some("c"));
        assert_eq!(tracker.answered_count(), 1);
    }

    #[test]
    fn unanswered_until_set() {
        let mut tracker = AnswerTracker::new();
        let q2 = QuestionId::new(2);
        assert!(!tracker.is_answered(q2));
        assert_eq!(tracker.get(q2), None);
        tracker.set(q2, "anything goes");
        assert!(tracker.is_answered(q2));
    }

    #[test]
    fn clear_resets_and_snapshot_is_detached() {
        let mut tracker = AnswerTracker::new();
        tracker.set(QuestionId::new(1), "x");
        let sheet = tracker.snapshot();
        tracker.clear();
        assert_eq!(tracker.answered_count(), 0);
        assert_eq!(sheet.get(QuestionId::new(1)), Some("x"));
        assert_eq!(sheet.len(), 1);
    }
}
