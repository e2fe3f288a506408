use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{QuestionId, TestId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text cannot be empty")]
    EmptyText,

    #[error("question {0} has no options")]
    NoOptions(QuestionId),
}

//
// ─── OPTION LABELS ─────────────────────────────────────────────────────────────
//

/// Display label for the option at `index`: `a`, `b`, … `z`, then `aa`, `ab`, ….
///
/// Labels depend on position only, never on option text.
#[must_use]
pub fn option_label(index: usize) -> String {
    let mut label = Vec::new();
    let mut n = index;
    loop {
        let rem = u8::try_from(n % 26).unwrap_or(0);
        label.push(char::from(b'a' + rem));
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    label.iter().rev().collect()
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A prompt with ordered options and, optionally, its canonical answer.
///
/// The canonical answer is only present when the question was fetched for
/// editing or rebuilt from review data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    id: QuestionId,
    text: String,
    options: Vec<String>,
    answer: Option<String>,
}

impl Question {
    /// Build a question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyText` for blank text and
    /// `QuestionError::NoOptions` when `options` is empty or every option is
    /// blank.
    pub fn new(
        id: QuestionId,
        text: impl Into<String>,
        options: Vec<String>,
        answer: Option<String>,
    ) -> Result<Self, QuestionError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(QuestionError::EmptyText);
        }
        if options.iter().all(|o| o.trim().is_empty()) {
            return Err(QuestionError::NoOptions(id));
        }
        Ok(Self {
            id,
            text,
            options,
            answer: answer.filter(|a| !a.trim().is_empty()),
        })
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// Current canonical answer, if known.
    #[must_use]
    pub fn answer(&self) -> Option<&str> {
        self.answer.as_deref()
    }

    /// Replace the canonical answer locally.
    pub fn set_answer(&mut self, answer: impl Into<String>) {
        self.answer = Some(answer.into());
    }

    /// Options paired with their positional labels.
    pub fn labeled_options(&self) -> impl Iterator<Item = (String, &str)> {
        self.options
            .iter()
            .enumerate()
            .map(|(i, opt)| (option_label(i), opt.as_str()))
    }

    /// Position of `option` in this question, if present.
    #[must_use]
    pub fn option_index(&self, option: &str) -> Option<usize> {
        self.options.iter().position(|o| o == option)
    }
}

//
// ─── TEST ──────────────────────────────────────────────────────────────────────
//

/// A named, ordered collection of questions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Test {
    id: TestId,
    title: String,
    questions: Vec<Question>,
}

impl Test {
    #[must_use]
    pub fn new(id: TestId, title: impl Into<String>, questions: Vec<Question>) -> Self {
        Self {
            id,
            title: title.into(),
            questions,
        }
    }

    #[must_use]
    pub fn id(&self) -> &TestId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn into_questions(self) -> Vec<Question> {
        self.questions
    }
}
