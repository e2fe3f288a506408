//! Shared error types for the services crate.

use thiserror::Error;

use exam_core::model::TestId;
use remote::RemoteError;

/// Errors emitted by `ExamSessionController`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExamError {
    #[error("failed to load questions: {0}")]
    Load(RemoteError),
    #[error("test {0} has no questions")]
    EmptyTest(TestId),
    #[error("submission failed: {0}")]
    Submission(RemoteError),
    #[error("a submission is already in flight")]
    SubmissionInFlight,
    #[error("no exam in progress")]
    NotInProgress,
    #[error("question index {0} is out of range")]
    InvalidIndex(usize),
    #[error("question {0} is not part of this exam")]
    UnknownQuestion(u64),
}

/// Which lookup of an attempt review failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewStep {
    Details,
    Info,
    Questions,
}

/// Errors emitted by `AttemptReviewAssembler`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ReviewError {
    #[error("could not load attempt review ({step:?}): {source}")]
    Load {
        step: ReviewStep,
        #[source]
        source: RemoteError,
    },
}

/// Errors emitted by `AnswerEditingWorkflow`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EditError {
    #[error("select an answer before saving")]
    Validation,
    #[error("failed to save answer: {0}")]
    Persist(RemoteError),
    #[error("failed to load questions: {0}")]
    Load(RemoteError),
    #[error("test {0} has no questions")]
    EmptyTest(TestId),
    #[error("no test loaded for editing")]
    NotLoaded,
    #[error("an answer is being saved")]
    Busy,
}

/// Errors emitted by `AccountService`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AuthError {
    #[error("username and password are required")]
    MissingCredentials,
    #[error("{0}")]
    Rejected(String),
    #[error(transparent)]
    Remote(RemoteError),
}

/// Errors emitted by `ProgressService`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error(transparent)]
    Remote(#[from] RemoteError),
}
