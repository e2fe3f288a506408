use std::sync::Arc;

use remote::Remote;
use tokio::sync::mpsc::UnboundedSender;

use crate::account::AccountService;
use crate::editing::AnswerEditingWorkflow;
use crate::exam::{ClockTick, ExamClock, ExamSessionController};
use crate::progress::ProgressService;
use crate::review::AttemptReviewAssembler;

/// Assembles app-facing services over one set of remote collaborators.
#[derive(Clone)]
pub struct AppServices {
    remote: Remote,
    accounts: Arc<AccountService>,
    progress: Arc<ProgressService>,
    reviews: Arc<AttemptReviewAssembler>,
}

impl AppServices {
    #[must_use]
    pub fn new(remote: Remote) -> Self {
        let accounts = Arc::new(AccountService::new(Arc::clone(&remote.auth)));
        let progress = Arc::new(ProgressService::new(Arc::clone(&remote.attempts)));
        let reviews = Arc::new(AttemptReviewAssembler::new(
            Arc::clone(&remote.attempts),
            Arc::clone(&remote.questions),
        ));
        Self {
            remote,
            accounts,
            progress,
            reviews,
        }
    }

    #[must_use]
    pub fn accounts(&self) -> Arc<AccountService> {
        Arc::clone(&self.accounts)
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn reviews(&self) -> Arc<AttemptReviewAssembler> {
        Arc::clone(&self.reviews)
    }

    /// Exam controller whose clock reports ticks on `ticks`.
    #[must_use]
    pub fn exam_controller(&self, ticks: UnboundedSender<ClockTick>) -> ExamSessionController {
        ExamSessionController::new(
            Arc::clone(&self.remote.questions),
            Arc::clone(&self.remote.scoring),
            ExamClock::with_ticker(ticks),
        )
    }

    #[must_use]
    pub fn editing_workflow(&self) -> AnswerEditingWorkflow {
        AnswerEditingWorkflow::new(Arc::clone(&self.remote.questions))
    }
}
