use services::{AuthError, EditError, ExamError, ProgressError, ReviewError};

/// User-facing failure categories.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViewError {
    Unknown,
    Load,
    EmptyTest,
    Submission,
    Validation,
    Persist,
    Busy,
    Login(String),
}

impl ViewError {
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            ViewError::Unknown => "Something went wrong. Please try again.".into(),
            ViewError::Load => "Could not load data. Please try again.".into(),
            ViewError::EmptyTest => "This test has no questions.".into(),
            ViewError::Submission => {
                "Submission failed. Your answers are kept; try submitting again.".into()
            }
            ViewError::Validation => "Please select an answer before saving.".into(),
            ViewError::Persist => "Failed to update the answer. Please try again.".into(),
            ViewError::Busy => "Please wait for the current request to finish.".into(),
            ViewError::Login(message) => message.clone(),
        }
    }
}

impl From<ExamError> for ViewError {
    fn from(err: ExamError) -> Self {
        match err {
            ExamError::Load(_) => ViewError::Load,
            ExamError::EmptyTest(_) => ViewError::EmptyTest,
            ExamError::Submission(_) => ViewError::Submission,
            ExamError::SubmissionInFlight => ViewError::Busy,
            _ => ViewError::Unknown,
        }
    }
}

impl From<EditError> for ViewError {
    fn from(err: EditError) -> Self {
        match err {
            EditError::Validation => ViewError::Validation,
            EditError::Persist(_) => ViewError::Persist,
            EditError::Load(_) => ViewError::Load,
            EditError::EmptyTest(_) => ViewError::EmptyTest,
            EditError::Busy => ViewError::Busy,
            _ => ViewError::Unknown,
        }
    }
}

impl From<ReviewError> for ViewError {
    fn from(_: ReviewError) -> Self {
        ViewError::Load
    }
}

impl From<ProgressError> for ViewError {
    fn from(_: ProgressError) -> Self {
        ViewError::Load
    }
}

impl From<AuthError> for ViewError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredentials => {
                ViewError::Login("Please enter both username and password.".into())
            }
            AuthError::Rejected(message) => ViewError::Login(message),
            _ => ViewError::Login("An error occurred during login. Please try again.".into()),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ViewState<T> {
    Idle,
    Loading,
    Ready(T),
    Error(ViewError),
}

impl<T> ViewState<T> {
    #[must_use]
    pub fn from_result<E: Into<ViewError>>(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => ViewState::Ready(value),
            Err(err) => ViewState::Error(err.into()),
        }
    }

    #[must_use]
    pub fn ready(&self) -> Option<&T> {
        match self {
            ViewState::Ready(value) => Some(value),
            _ => None,
        }
    }
}
