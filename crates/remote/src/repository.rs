use std::sync::Arc;

use async_trait::async_trait;
use exam_core::model::{
    AnswerSheet, Attempt, AttemptDetailEntry, AttemptId, ChartPoint, Question, QuestionId, Score,
    TestId, UserId, UserSummary,
};
use thiserror::Error;

use crate::memory::InMemoryBackend;

/// Errors surfaced by remote collaborators.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RemoteError {
    #[error("not found")]
    NotFound,

    /// The collaborator answered but declined the request.
    #[error("rejected: {0}")]
    Rejected(String),

    #[error("http {status}: {message}")]
    Http { status: u16, message: String },

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("network error: {0}")]
    Network(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("connection error: {0}")]
    Connection(String),
}

/// Opaque login: credentials in, user identifier out.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Exchange credentials for a user identifier.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError::Rejected` with the server message when the login is refused.
    async fn authenticate(&self, username: &str, password: &str) -> Result<UserId, RemoteError>;
}

/// Source of questions and owner of the canonical answer key.
#[async_trait]
pub trait QuestionBank: Send + Sync {
    /// Fetch the ordered questions of a test.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError` if the test is unknown or the call fails.
    async fn fetch_questions(&self, test_id: &TestId) -> Result<Vec<Question>, RemoteError>;

    /// Replace the canonical answer of one question.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError::NotFound` if the question is not part of the test,
    /// `RemoteError::Rejected` if the update is refused.
    async fn update_canonical_answer(
        &self,
        question_id: QuestionId,
        new_answer: &str,
        test_id: &TestId,
    ) -> Result<(), RemoteError>;
}

/// Grades a submitted answer sheet and records the attempt.
#[async_trait]
pub trait ScoringService: Send + Sync {
    /// Score the answers given for a test.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError` if scoring fails.
    async fn submit_exam(&self, test_id: &TestId, answers: &AnswerSheet)
    -> Result<Score, RemoteError>;
}

/// Read access to persisted attempts.
#[async_trait]
pub trait AttemptStore: Send + Sync {
    /// # Errors
    ///
    /// Returns `RemoteError` if the lookup fails.
    async fn user_summary(&self, user_id: UserId) -> Result<UserSummary, RemoteError>;

    /// Scores in chronological order.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError` if the lookup fails.
    async fn chart_series(&self, user_id: UserId) -> Result<Vec<ChartPoint>, RemoteError>;

    /// Attempts, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError` if the lookup fails.
    async fn user_attempts(&self, user_id: UserId) -> Result<Vec<Attempt>, RemoteError>;

    /// # Errors
    ///
    /// Returns `RemoteError` if the lookup fails.
    async fn attempt_details(
        &self,
        attempt_id: AttemptId,
    ) -> Result<Vec<AttemptDetailEntry>, RemoteError>;

    /// Test the attempt belongs to.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError::NotFound` for unknown attempts.
    async fn attempt_info(&self, attempt_id: AttemptId) -> Result<TestId, RemoteError>;
}

/// Aggregates the collaborators behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Remote {
    pub auth: Arc<dyn Authenticator>,
    pub questions: Arc<dyn QuestionBank>,
    pub scoring: Arc<dyn ScoringService>,
    pub attempts: Arc<dyn AttemptStore>,
}

impl Remote {
    #[must_use]
    pub fn in_memory(backend: InMemoryBackend) -> Self {
        let auth: Arc<dyn Authenticator> = Arc::new(backend.clone());
        let questions: Arc<dyn QuestionBank> = Arc::new(backend.clone());
        let scoring: Arc<dyn ScoringService> = Arc::new(backend.clone());
        let attempts: Arc<dyn AttemptStore> = Arc::new(backend);
        Self {
            auth,
            questions,
            scoring,
            attempts,
        }
    }
}
