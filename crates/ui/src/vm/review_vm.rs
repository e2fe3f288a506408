use exam_core::model::{AttemptReview, OptionMark, ReviewItem, ReviewOutcome};

/// Verdict shown next to a reviewed question.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Correct,
    Incorrect,
    NoResult,
}

impl Verdict {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Verdict::Correct => "Correct",
            Verdict::Incorrect => "Incorrect",
            Verdict::NoResult => "No result available",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReviewOptionVm {
    pub label: String,
    pub text: String,
    pub mark: OptionMark,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReviewItemVm {
    pub number: usize,
    pub text: String,
    pub options: Vec<ReviewOptionVm>,
    pub verdict: Verdict,
    pub user_answer: Option<String>,
    pub correct_answer: Option<String>,
}

impl ReviewItemVm {
    fn from_item(index: usize, item: &ReviewItem) -> Self {
        let marks = item.option_marks();
        let options = item
            .question
            .labeled_options()
            .enumerate()
            .map(|(i, (label, text))| ReviewOptionVm {
                label,
                text: text.to_owned(),
                mark: marks.get(i).copied().unwrap_or(OptionMark::Plain),
            })
            .collect();
        let (verdict, user_answer, correct_answer) = match &item.outcome {
            ReviewOutcome::NoResult => (Verdict::NoResult, None, None),
            ReviewOutcome::Result {
                user_answer,
                correct_answer,
                correct,
            } => (
                if *correct {
                    Verdict::Correct
                } else {
                    Verdict::Incorrect
                },
                user_answer.clone(),
                correct_answer.clone(),
            ),
        };
        Self {
            number: index + 1,
            text: item.question.text().to_owned(),
            options,
            verdict,
            user_answer,
            correct_answer,
        }
    }

    /// `a) text` lines with markers for the correct and the wrongly chosen option.
    #[must_use]
    pub fn option_lines(&self) -> Vec<String> {
        self.options
            .iter()
            .map(|opt| {
                let marker = match opt.mark {
                    OptionMark::Correct => " [correct]",
                    OptionMark::UserWrong => " [your answer]",
                    OptionMark::Plain => "",
                };
                format!("{}) {}{marker}", opt.label, opt.text)
            })
            .collect()
    }
}

#[must_use]
pub fn map_review_items(items: &[ReviewItem]) -> Vec<ReviewItemVm> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| ReviewItemVm::from_item(i, item))
        .collect()
}

/// A past attempt ready to display.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReviewVm {
    pub title: String,
    pub correct: usize,
    pub total: usize,
    pub items: Vec<ReviewItemVm>,
}

impl ReviewVm {
    #[must_use]
    pub fn new(title: impl Into<String>, review: &AttemptReview) -> Self {
        Self {
            title: title.into(),
            correct: review.correct_count(),
            total: review.items.len(),
            items: map_review_items(&review.items),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::model::{Question, QuestionId};

    fn question() -> Question {
        Question::new(
            QuestionId::new(1),
            "Pick one",
            vec!["red".into(), "green".into(), "blue".into()],
            None,
        )
        .unwrap()
    }

    #[test]
    fn missing_result_has_no_marks_and_distinct_verdict() {
        let vm = map_review_items(&[ReviewItem {
            question: question(),
            outcome: ReviewOutcome::NoResult,
        }]);
        assert_eq!(vm[0].verdict, Verdict::NoResult);
        assert_eq!(vm[0].verdict.label(), "No result available");
        assert!(vm[0].options.iter().all(|o| o.mark == OptionMark::Plain));
        assert_eq!(vm[0].option_lines()[0], "a) red");
    }

    #[test]
    fn wrong_answer_marks_both_options() {
        let vm = map_review_items(&[ReviewItem {
            question: question(),
            outcome: ReviewOutcome::Result {
                user_answer: Some("blue".into()),
                correct_answer: Some("green".into()),
                correct: false,
            },
        }]);
        assert_eq!(vm[0].verdict, Verdict::Incorrect);
        assert_eq!(
            vm[0].option_lines(),
            vec!["a) red", "b) green [correct]", "c) blue [your answer]"]
        );
    }
}
