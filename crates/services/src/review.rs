use std::sync::Arc;

use exam_core::model::{AttemptId, AttemptReview, merge_attempt};
use remote::{AttemptStore, QuestionBank};
use tracing::{debug, instrument};

use crate::error::{ReviewError, ReviewStep};

/// Rebuilds a past attempt from its stored answers and the test's questions.
///
/// Details and attempt info are fetched together; the questions follow once
/// the test id is known. Any failure fails the whole review.
#[derive(Clone)]
pub struct AttemptReviewAssembler {
    attempts: Arc<dyn AttemptStore>,
    questions: Arc<dyn QuestionBank>,
}

impl AttemptReviewAssembler {
    #[must_use]
    pub fn new(attempts: Arc<dyn AttemptStore>, questions: Arc<dyn QuestionBank>) -> Self {
        Self {
            attempts,
            questions,
        }
    }

    /// Assemble the review of `attempt_id`.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::Load` naming the lookup that failed.
    #[instrument(skip(self))]
    pub async fn assemble(&self, attempt_id: AttemptId) -> Result<AttemptReview, ReviewError> {
        let (details, info) = tokio::join!(
            self.attempts.attempt_details(attempt_id),
            self.attempts.attempt_info(attempt_id),
        );
        let details = details.map_err(|source| ReviewError::Load {
            step: ReviewStep::Details,
            source,
        })?;
        let test_id = info.map_err(|source| ReviewError::Load {
            step: ReviewStep::Info,
            source,
        })?;
        let questions = self
            .questions
            .fetch_questions(&test_id)
            .await
            .map_err(|source| ReviewError::Load {
                step: ReviewStep::Questions,
                source,
            })?;

        let items = merge_attempt(questions, &details);
        debug!(
            %test_id,
            questions = items.len(),
            answered = details.len(),
            "assembled attempt review"
        );
        Ok(AttemptReview {
            attempt_id,
            test_id,
            items,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::model::{AnswerSheet, Question, QuestionId, ReviewOutcome, TestId, UserId};
    use exam_core::time::fixed_clock;
    use remote::{InMemoryBackend, Operation, Remote, RemoteError, ScoringService};

    fn question(id: u64, answer: &str) -> Question {
        Question::new(
            QuestionId::new(id),
            format!("Q{id}"),
            vec!["x".into(), "y".into()],
            Some(answer.into()),
        )
        .unwrap()
    }

    async fn scored_backend() -> (InMemoryBackend, AttemptId) {
        let backend = InMemoryBackend::new(fixed_clock())
            .with_test("test1", vec![question(1, "x"), question(2, "y")]);
        let sheet: AnswerSheet = [(QuestionId::new(1), "y".to_string())].into_iter().collect();
        backend
            .submit_exam(&TestId::new("test1"), &sheet)
            .await
            .unwrap();
        let attempts = backend.user_attempts(UserId::new(1)).await.unwrap();
        (backend, attempts[0].id)
    }

    fn assembler(backend: &InMemoryBackend) -> AttemptReviewAssembler {
        let remote = Remote::in_memory(backend.clone());
        AttemptReviewAssembler::new(remote.attempts, remote.questions)
    }

    #[tokio::test]
    async fn unanswered_question_has_no_result() {
        let (backend, attempt_id) = scored_backend().await;
        let review = assembler(&backend).assemble(attempt_id).await.unwrap();

        assert_eq!(review.test_id, TestId::new("test1"));
        assert_eq!(review.items.len(), 2);
        assert!(matches!(
            review.items[0].outcome,
            ReviewOutcome::Result { correct: false, .. }
        ));
        assert_eq!(review.items[1].outcome, ReviewOutcome::NoResult);
        assert_eq!(review.missing_count(), 1);
    }

    #[tokio::test]
    async fn failed_question_fetch_fails_whole_review() {
        let (backend, attempt_id) = scored_backend().await;
        backend.fail_on(Operation::FetchQuestions);
        let err = assembler(&backend).assemble(attempt_id).await.unwrap_err();
        assert!(matches!(
            err,
            ReviewError::Load {
                step: ReviewStep::Questions,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn unknown_attempt_reports_info_step() {
        let (backend, _) = scored_backend().await;
        let err = assembler(&backend)
            .assemble(AttemptId::new(999))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ReviewError::Load {
                step: ReviewStep::Info,
                source: RemoteError::NotFound,
            }
        );
        assert_eq!(backend.calls(Operation::AttemptDetails), 1);
        assert_eq!(backend.calls(Operation::FetchQuestions), 0);
    }

    #[tokio::test]
    async fn failed_details_fetch_reports_details_step() {
        let (backend, attempt_id) = scored_backend().await;
        backend.fail_on(Operation::AttemptDetails);
        let err = assembler(&backend).assemble(attempt_id).await.unwrap_err();
        assert!(matches!(
            err,
            ReviewError::Load {
                step: ReviewStep::Details,
                ..
            }
        ));
        assert_eq!(backend.calls(Operation::AttemptInfo), 1);
        assert_eq!(backend.calls(Operation::FetchQuestions), 0);
    }
}
