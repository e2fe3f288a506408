//! Live exam: countdown plus the session state machine.

mod clock;
mod controller;

pub use clock::{ClockTick, ExamClock};
pub use controller::{
    Completion, ExamSessionController, ExamState, LoadTicket, QuestionStatus, SubmitReason,
    SubmitTicket,
};
