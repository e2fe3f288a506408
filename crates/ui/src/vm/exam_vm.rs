use exam_core::model::Score;
use services::{ExamSessionController, ExamState};

use crate::vm::review_vm::{ReviewItemVm, map_review_items};
use crate::vm::time_fmt::format_timer;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExamOptionVm {
    pub label: String,
    pub text: String,
    pub selected: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NavCellVm {
    pub number: usize,
    pub answered: bool,
    pub current: bool,
}

/// The question screen of a running exam.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExamVm {
    pub title: String,
    pub position: String,
    pub question: String,
    pub options: Vec<ExamOptionVm>,
    pub timer: String,
    pub navigator: Vec<NavCellVm>,
    pub can_previous: bool,
    pub can_next: bool,
    pub submitting: bool,
}

impl ExamVm {
    /// `None` unless a question is on screen.
    #[must_use]
    pub fn from_controller(title: &str, exam: &ExamSessionController) -> Option<Self> {
        if !matches!(exam.state(), ExamState::InProgress | ExamState::Submitting) {
            return None;
        }
        let cursor = exam.cursor()?;
        let question = exam.current_question()?;
        let chosen = exam.answer(question.id());
        let options = question
            .labeled_options()
            .map(|(label, text)| ExamOptionVm {
                label,
                text: text.to_owned(),
                selected: chosen == Some(text),
            })
            .collect();
        let navigator = exam
            .navigator()
            .into_iter()
            .map(|status| NavCellVm {
                number: status.index + 1,
                answered: status.answered,
                current: status.current,
            })
            .collect();
        Some(Self {
            title: title.to_owned(),
            position: format!("Question {} of {}", cursor.index() + 1, cursor.len()),
            question: question.text().to_owned(),
            options,
            timer: format_timer(exam.remaining_secs()),
            navigator,
            can_previous: !cursor.is_first(),
            can_next: !cursor.is_last(),
            submitting: exam.state() == ExamState::Submitting,
        })
    }

    /// Compact navigator line, e.g. `[1*] 2 (3)`: `*` answered, brackets current.
    #[must_use]
    pub fn navigator_line(&self) -> String {
        self.navigator
            .iter()
            .map(|cell| {
                let mark = if cell.answered { "*" } else { "" };
                if cell.current {
                    format!("[{}{mark}]", cell.number)
                } else {
                    format!("{}{mark}", cell.number)
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// The score screen shown after submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScoreVm {
    pub title: String,
    pub headline: String,
    pub items: Vec<ReviewItemVm>,
}

impl ScoreVm {
    #[must_use]
    pub fn from_controller(title: &str, exam: &ExamSessionController) -> Option<Self> {
        let score: &Score = exam.score()?;
        Some(Self {
            title: title.to_owned(),
            headline: format!("Score: {} / {}", score.score(), score.total_questions()),
            items: map_review_items(&exam.review_items()),
        })
    }
}
