use exam_core::model::{AttemptId, AttemptReview, TestId};
use services::{
    AnswerEditingWorkflow, ClockTick, CommitOutcome, ExamSessionController, Navigation,
    ReviewError,
};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use crate::context::AppContext;
use crate::routes::{Effect, NavEvent, RouteError, RouterState, View, transition};
use crate::views::{ViewError, ViewState};
use crate::vm::{
    AttemptRowVm, ChartVm, DashboardVm, EditVm, ExamVm, MenuEntryVm, ReviewVm, ScoreVm,
    map_attempt_rows, map_menu,
};

/// A review assembled in the background, tagged with the attempt it was
/// requested for.
#[derive(Debug)]
pub struct ReviewReady {
    pub attempt_id: AttemptId,
    pub result: Result<AttemptReview, ReviewError>,
}

/// Input that arrives independently of the user.
#[derive(Debug)]
pub enum AppEvent {
    Tick(ClockTick),
    Review(ReviewReady),
}

/// Front-end independent driver: owns the router, the live exam and the
/// editing session, and applies router effects to them.
///
/// A front-end feeds it user actions and background events (`next_event`)
/// and reads back view models. Review assembly runs on a spawned task, so
/// the user may navigate away before it completes.
pub struct App {
    ctx: AppContext,
    router: RouterState,
    exam: ExamSessionController,
    ticks: UnboundedReceiver<ClockTick>,
    reviews_tx: UnboundedSender<ReviewReady>,
    reviews_rx: UnboundedReceiver<ReviewReady>,
    editing: AnswerEditingWorkflow,
    exam_title: String,
    edit_title: String,
    dashboard: ViewState<DashboardVm>,
    attempts: ViewState<Vec<AttemptRowVm>>,
    chart: ViewState<ChartVm>,
    review: ViewState<ReviewVm>,
    notice: Option<ViewError>,
}

impl App {
    #[must_use]
    pub fn new(ctx: AppContext) -> Self {
        let (tx, ticks) = mpsc::unbounded_channel();
        let (reviews_tx, reviews_rx) = mpsc::unbounded_channel();
        let exam = ctx.services().exam_controller(tx);
        let editing = ctx.services().editing_workflow();
        Self {
            ctx,
            router: RouterState::default(),
            exam,
            ticks,
            reviews_tx,
            reviews_rx,
            editing,
            exam_title: String::new(),
            edit_title: String::new(),
            dashboard: ViewState::Idle,
            attempts: ViewState::Idle,
            chart: ViewState::Idle,
            review: ViewState::Idle,
            notice: None,
        }
    }

    // ─── Navigation ────────────────────────────────────────────────────────

    /// Log in and open the dashboard.
    ///
    /// # Errors
    ///
    /// Returns `ViewError::Login` with a message for the login screen.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<(), ViewError> {
        if self.router.user.is_some() {
            return Err(ViewError::Login("Already logged in.".into()));
        }
        let user = self.ctx.accounts().login(username, password).await?;
        self.navigate(NavEvent::LoggedIn(user))
            .await
            .map_err(|_| ViewError::Unknown)
    }

    /// Apply a navigation event and its effects.
    ///
    /// # Errors
    ///
    /// Returns `RouteError` when the move is not allowed; nothing changes then.
    pub async fn navigate(&mut self, event: NavEvent) -> Result<(), RouteError> {
        let next = transition(&self.router, event)?;
        debug!(from = %self.router.view, to = %next.state.view, "navigate");
        self.router = next.state;
        self.notice = None;
        for effect in next.effects {
            self.apply(effect).await;
        }
        Ok(())
    }

    /// Start an exam from the menu, refusing tests the catalog keeps closed.
    ///
    /// # Errors
    ///
    /// Returns `RouteError::InvalidTransition` for closed or unknown tests.
    pub async fn start_exam(&mut self, test_id: TestId) -> Result<(), RouteError> {
        if !self.ctx.catalog().is_selectable(&test_id) {
            return Err(RouteError::InvalidTransition {
                from: self.router.view,
                event: format!("StartExam({test_id})"),
            });
        }
        self.navigate(NavEvent::StartExam(test_id)).await
    }

    async fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::ClearScore => self.exam.clear_score(),
            Effect::StartExam(test_id) => {
                self.exam_title = self.ctx.catalog().title(&test_id).to_owned();
                if let Err(e) = self.exam.load(test_id).await {
                    self.notice = Some(e.into());
                }
            }
            Effect::LeaveExam | Effect::DetachExam => self.exam.leave(),
            Effect::AssembleReview(attempt_id) => {
                self.review = ViewState::Loading;
                let reviews = self.ctx.reviews();
                let tx = self.reviews_tx.clone();
                tokio::spawn(async move {
                    let result = reviews.assemble(attempt_id).await;
                    if tx.send(ReviewReady { attempt_id, result }).is_err() {
                        debug!(%attempt_id, "driver gone, dropping review");
                    }
                });
            }
            Effect::LoadEditSession(test_id) => {
                self.edit_title = self.ctx.catalog().title(&test_id).to_owned();
                if let Err(e) = self.editing.load(test_id).await {
                    self.notice = Some(e.into());
                }
            }
            Effect::DiscardEditSession => self.editing.discard(),
            Effect::LoadDashboard => {
                let Some(user) = self.router.user else { return };
                self.dashboard = ViewState::Loading;
                let result = self.ctx.progress().summary(user).await;
                self.dashboard = ViewState::from_result(result.map(|s| DashboardVm::from(&s)));
            }
            Effect::LoadAttempts => {
                let Some(user) = self.router.user else { return };
                self.attempts = ViewState::Loading;
                let result = self.ctx.progress().attempts(user).await;
                self.attempts = ViewState::from_result(
                    result.map(|rows| map_attempt_rows(&rows, self.ctx.catalog())),
                );
            }
            Effect::LoadChart => {
                let Some(user) = self.router.user else { return };
                self.chart = ViewState::Loading;
                let result = self.ctx.progress().chart(user).await;
                self.chart = ViewState::from_result(result.map(|series| ChartVm::new(&series)));
            }
        }
    }

    // ─── Exam ──────────────────────────────────────────────────────────────

    /// Choose the option at `index` (0-based) for the current question.
    ///
    /// # Errors
    ///
    /// Returns `ViewError::Unknown` outside an exam, for a bad index or for a
    /// blank option slot.
    pub fn choose(&mut self, index: usize) -> Result<(), ViewError> {
        let option = self
            .exam
            .current_question()
            .and_then(|q| q.options().get(index))
            .filter(|opt| !opt.trim().is_empty())
            .cloned()
            .ok_or(ViewError::Unknown)?;
        self.exam.select_current(option).map_err(ViewError::from)
    }

    pub fn next_question(&mut self) {
        self.exam.next();
    }

    pub fn previous_question(&mut self) {
        self.exam.previous();
    }

    /// # Errors
    ///
    /// Returns `ViewError::Unknown` for an index outside the test.
    pub fn jump_to(&mut self, index: usize) -> Result<(), ViewError> {
        self.exam.jump_to(index).map_err(ViewError::from)
    }

    /// Submit the running exam.
    ///
    /// # Errors
    ///
    /// Returns `ViewError::Submission` when scoring failed; the exam stays open.
    pub async fn submit(&mut self) -> Result<(), ViewError> {
        let result = self.exam.submit().await.map(|_| ());
        if let Err(e) = &result {
            warn!(error = %e, "submit failed");
        }
        result.map_err(ViewError::from)
    }

    /// Wait for the next clock tick or background completion.
    pub async fn next_event(&mut self) -> Option<AppEvent> {
        tokio::select! {
            Some(tick) = self.ticks.recv() => Some(AppEvent::Tick(tick)),
            Some(ready) = self.reviews_rx.recv() => Some(AppEvent::Review(ready)),
            else => None,
        }
    }

    /// Show a finished review unless the user has moved on.
    ///
    /// Returns `true` when the review was applied.
    pub fn complete_review(&mut self, ready: ReviewReady) -> bool {
        if !self.router.accepts_review(ready.attempt_id) {
            debug!(attempt_id = %ready.attempt_id, "discarding stale review");
            return false;
        }
        self.review = ViewState::from_result(ready.result.map(|review| {
            let title = self.ctx.catalog().title(&review.test_id).to_owned();
            ReviewVm::new(title, &review)
        }));
        true
    }

    /// Apply a clock tick; on expiry the exam is submitted before returning.
    ///
    /// Returns `true` when the tick ended the exam.
    pub async fn on_tick(&mut self, tick: ClockTick) -> bool {
        let Some(ticket) = self.exam.on_clock_tick(tick) else {
            return false;
        };
        info!("time expired, submitting");
        if let Err(e) = self.exam.finish_submission(ticket).await {
            self.notice = Some(e.into());
        }
        true
    }

    // ─── Answer editing ────────────────────────────────────────────────────

    /// # Errors
    ///
    /// Returns `ViewError` when no session is loaded or a save is in flight.
    pub fn choose_pending(&mut self, index: usize) -> Result<(), ViewError> {
        let option = self
            .editing
            .session()
            .and_then(|s| s.current().options().get(index))
            .cloned()
            .ok_or(ViewError::Unknown)?;
        self.editing.select_pending(option).map_err(ViewError::from)
    }

    /// Save the pending answer and advance.
    ///
    /// # Errors
    ///
    /// Returns `ViewError::Validation` with nothing selected and
    /// `ViewError::Persist` when the backend refused the update.
    pub async fn commit_edit(&mut self) -> Result<CommitOutcome, ViewError> {
        self.editing.commit().await.map_err(ViewError::from)
    }

    /// # Errors
    ///
    /// Returns `ViewError` when no session is loaded or a save is in flight.
    pub fn edit_next(&mut self) -> Result<Navigation, ViewError> {
        self.editing.next().map_err(ViewError::from)
    }

    /// # Errors
    ///
    /// Returns `ViewError` when no session is loaded or a save is in flight.
    pub fn edit_previous(&mut self) -> Result<Navigation, ViewError> {
        self.editing.previous().map_err(ViewError::from)
    }

    // ─── View models ───────────────────────────────────────────────────────

    #[must_use]
    pub fn view(&self) -> View {
        self.router.view
    }

    #[must_use]
    pub fn router(&self) -> &RouterState {
        &self.router
    }

    #[must_use]
    pub fn exam(&self) -> &ExamSessionController {
        &self.exam
    }

    #[must_use]
    pub fn editing(&self) -> &AnswerEditingWorkflow {
        &self.editing
    }

    /// Last failure reported by a router effect, cleared on navigation.
    #[must_use]
    pub fn notice(&self) -> Option<&ViewError> {
        self.notice.as_ref()
    }

    #[must_use]
    pub fn menu(&self) -> Vec<MenuEntryVm> {
        map_menu(self.ctx.catalog())
    }

    #[must_use]
    pub fn exam_vm(&self) -> Option<ExamVm> {
        ExamVm::from_controller(&self.exam_title, &self.exam)
    }

    #[must_use]
    pub fn score_vm(&self) -> Option<ScoreVm> {
        ScoreVm::from_controller(&self.exam_title, &self.exam)
    }

    #[must_use]
    pub fn edit_vm(&self) -> Option<EditVm> {
        self.editing
            .session()
            .map(|s| EditVm::new(&self.edit_title, s, self.editing.is_at_end()))
    }

    #[must_use]
    pub fn dashboard(&self) -> &ViewState<DashboardVm> {
        &self.dashboard
    }

    #[must_use]
    pub fn attempts(&self) -> &ViewState<Vec<AttemptRowVm>> {
        &self.attempts
    }

    #[must_use]
    pub fn chart(&self) -> &ViewState<ChartVm> {
        &self.chart
    }

    #[must_use]
    pub fn review(&self) -> &ViewState<ReviewVm> {
        &self.review
    }
}
