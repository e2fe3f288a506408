#![forbid(unsafe_code)]

pub mod account;
pub mod app_services;
pub mod editing;
pub mod error;
pub mod exam;
pub mod progress;
pub mod review;

pub use exam_core::Clock;

pub use account::AccountService;
pub use app_services::AppServices;
pub use editing::{
    AnswerEditingWorkflow, CommitOutcome, CommitTicket, EditLoadTicket, EditSession, EditState,
    Navigation,
};
pub use error::{AuthError, EditError, ExamError, ProgressError, ReviewError, ReviewStep};
pub use exam::{
    ClockTick, Completion, ExamClock, ExamSessionController, ExamState, LoadTicket,
    QuestionStatus, SubmitReason, SubmitTicket,
};
pub use progress::ProgressService;
pub use review::AttemptReviewAssembler;
