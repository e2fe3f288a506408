use std::sync::Arc;

use exam_core::model::{
    AnswerSheet, AnswerTracker, Cursor, Question, QuestionId, ReviewItem, Score, Step, TestId,
    merge_score,
};
use exam_core::time::{TickOutcome, exam_duration_secs};
use remote::{QuestionBank, RemoteError, ScoringService};
use tracing::{debug, info, instrument, warn};

use super::clock::{ClockTick, ExamClock};
use crate::error::ExamError;

/// Lifecycle of one exam.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExamState {
    Idle,
    Loading,
    InProgress,
    Submitting,
    Scored,
}

/// Why a submission was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitReason {
    Manual,
    Expired,
}

/// Whether a completion was applied or dropped as stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    Discarded,
}

/// Outstanding question fetch, tagged with the exam instance that issued it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    instance: u64,
    test_id: TestId,
}

impl LoadTicket {
    #[must_use]
    pub fn test_id(&self) -> &TestId {
        &self.test_id
    }
}

/// Outstanding submission. Holding one means the exam is `Submitting`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitTicket {
    instance: u64,
    test_id: TestId,
    answers: AnswerSheet,
    reason: SubmitReason,
}

impl SubmitTicket {
    #[must_use]
    pub fn test_id(&self) -> &TestId {
        &self.test_id
    }

    #[must_use]
    pub fn answers(&self) -> &AnswerSheet {
        &self.answers
    }

    #[must_use]
    pub fn reason(&self) -> SubmitReason {
        self.reason
    }
}

/// One navigator entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionStatus {
    pub index: usize,
    pub answered: bool,
    pub current: bool,
}

/// Drives one exam at a time: loading, answering, the countdown and submission.
///
/// Remote calls are split into `begin_*`/`complete_*` pairs so a caller can
/// keep handling ticks and input while a call is outstanding. Every ticket
/// carries the exam instance it was issued for; completions for an older
/// instance are discarded. `load`, `submit` and `finish_submission` wrap the
/// pairs for callers that simply await.
pub struct ExamSessionController {
    questions_source: Arc<dyn QuestionBank>,
    scoring: Arc<dyn ScoringService>,
    clock: ExamClock,
    state: ExamState,
    instance: u64,
    test_id: Option<TestId>,
    questions: Vec<Question>,
    answers: AnswerTracker,
    cursor: Option<Cursor>,
    score: Option<Score>,
}

impl ExamSessionController {
    #[must_use]
    pub fn new(
        questions: Arc<dyn QuestionBank>,
        scoring: Arc<dyn ScoringService>,
        clock: ExamClock,
    ) -> Self {
        Self {
            questions_source: questions,
            scoring,
            clock,
            state: ExamState::Idle,
            instance: 0,
            test_id: None,
            questions: Vec::new(),
            answers: AnswerTracker::new(),
            cursor: None,
            score: None,
        }
    }

    // ─── Loading ───────────────────────────────────────────────────────────

    /// Start loading `test_id`, abandoning whatever exam was active.
    pub fn begin_load(&mut self, test_id: TestId) -> LoadTicket {
        self.reset();
        self.state = ExamState::Loading;
        self.test_id = Some(test_id.clone());
        debug!(instance = self.instance, %test_id, "loading exam");
        LoadTicket {
            instance: self.instance,
            test_id,
        }
    }

    /// Apply the result of a question fetch.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::Load` when the fetch failed and `ExamError::EmptyTest`
    /// when the test has no questions; both leave the controller `Idle`.
    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Vec<Question>, RemoteError>,
    ) -> Result<Completion, ExamError> {
        if ticket.instance != self.instance || self.state != ExamState::Loading {
            debug!(test_id = %ticket.test_id, "discarding stale question load");
            return Ok(Completion::Discarded);
        }
        let questions = match result {
            Ok(questions) => questions,
            Err(e) => {
                warn!(test_id = %ticket.test_id, error = %e, "question load failed");
                self.reset();
                return Err(ExamError::Load(e));
            }
        };
        let Some(cursor) = Cursor::new(questions.len()) else {
            self.reset();
            return Err(ExamError::EmptyTest(ticket.test_id));
        };

        let duration = exam_duration_secs(questions.len());
        self.questions = questions;
        self.cursor = Some(cursor);
        self.answers.clear();
        self.state = ExamState::InProgress;
        self.clock.start(duration);
        info!(
            test_id = %ticket.test_id,
            questions = self.questions.len(),
            duration_secs = duration,
            "exam started"
        );
        Ok(Completion::Applied)
    }

    /// Fetch and start `test_id`.
    ///
    /// # Errors
    ///
    /// See `complete_load`.
    #[instrument(skip(self))]
    pub async fn load(&mut self, test_id: TestId) -> Result<Completion, ExamError> {
        let ticket = self.begin_load(test_id);
        let result = self.questions_source.fetch_questions(&ticket.test_id).await;
        self.complete_load(ticket, result)
    }

    // ─── Answering and navigation ──────────────────────────────────────────

    /// Record `option` for `question_id`, replacing any earlier choice.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::NotInProgress` outside an active exam and
    /// `ExamError::UnknownQuestion` for ids not in the loaded test.
    pub fn select_option(
        &mut self,
        question_id: QuestionId,
        option: impl Into<String>,
    ) -> Result<(), ExamError> {
        if self.state != ExamState::InProgress {
            return Err(ExamError::NotInProgress);
        }
        if !self.questions.iter().any(|q| q.id() == question_id) {
            return Err(ExamError::UnknownQuestion(question_id.value()));
        }
        self.answers.set(question_id, option);
        Ok(())
    }

    /// Record `option` for the question under the cursor.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::NotInProgress` outside an active exam.
    pub fn select_current(&mut self, option: impl Into<String>) -> Result<(), ExamError> {
        let id = self
            .current_question()
            .map(Question::id)
            .ok_or(ExamError::NotInProgress)?;
        self.select_option(id, option)
    }

    /// Move forward one question; a no-op on the last one.
    pub fn next(&mut self) -> Step {
        self.navigable_cursor().map_or(Step::AtBoundary, Cursor::next)
    }

    /// Move back one question; a no-op on the first one.
    pub fn previous(&mut self) -> Step {
        self.navigable_cursor()
            .map_or(Step::AtBoundary, Cursor::previous)
    }

    /// Move straight to `index`.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::InvalidIndex` when `index` is outside the test and
    /// `ExamError::NotInProgress` outside an active exam.
    pub fn jump_to(&mut self, index: usize) -> Result<(), ExamError> {
        let cursor = self.navigable_cursor().ok_or(ExamError::NotInProgress)?;
        if cursor.jump_to(index) {
            Ok(())
        } else {
            Err(ExamError::InvalidIndex(index))
        }
    }

    fn navigable_cursor(&mut self) -> Option<&mut Cursor> {
        if self.state == ExamState::InProgress {
            self.cursor.as_mut()
        } else {
            None
        }
    }

    /// Answered/current markers for every question, in order.
    #[must_use]
    pub fn navigator(&self) -> Vec<QuestionStatus> {
        let current = self.cursor.map(|c| c.index());
        self.questions
            .iter()
            .enumerate()
            .map(|(index, q)| QuestionStatus {
                index,
                answered: self.answers.is_answered(q.id()),
                current: current == Some(index),
            })
            .collect()
    }

    // ─── Submission ────────────────────────────────────────────────────────

    /// Stop the clock and snapshot the answers for submission.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::SubmissionInFlight` while another submission for
    /// this exam is outstanding and `ExamError::NotInProgress` otherwise.
    pub fn begin_submit(&mut self) -> Result<SubmitTicket, ExamError> {
        self.begin_submit_for(SubmitReason::Manual)
    }

    fn begin_submit_for(&mut self, reason: SubmitReason) -> Result<SubmitTicket, ExamError> {
        match self.state {
            ExamState::InProgress => {}
            ExamState::Submitting => return Err(ExamError::SubmissionInFlight),
            _ => return Err(ExamError::NotInProgress),
        }
        let test_id = self.test_id.clone().ok_or(ExamError::NotInProgress)?;
        self.clock.stop();
        self.state = ExamState::Submitting;
        info!(
            %test_id,
            ?reason,
            answered = self.answers.answered_count(),
            "submitting exam"
        );
        Ok(SubmitTicket {
            instance: self.instance,
            test_id,
            answers: self.answers.snapshot(),
            reason,
        })
    }

    /// Apply a clock tick. On expiry the exam moves to `Submitting` and the
    /// returned ticket must be completed by the caller.
    pub fn on_clock_tick(&mut self, tick: ClockTick) -> Option<SubmitTicket> {
        match self.clock.on_tick(tick) {
            TickOutcome::Expired if self.state == ExamState::InProgress => {
                info!("time is up");
                self.begin_submit_for(SubmitReason::Expired).ok()
            }
            _ => None,
        }
    }

    /// Apply the scoring result.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::Submission` on failure; the exam goes back to
    /// `InProgress` with its answers kept and the clock resumed when time is left.
    pub fn complete_submit(
        &mut self,
        ticket: SubmitTicket,
        result: Result<Score, RemoteError>,
    ) -> Result<Completion, ExamError> {
        if ticket.instance != self.instance || self.state != ExamState::Submitting {
            debug!(test_id = %ticket.test_id, "discarding stale submission result");
            return Ok(Completion::Discarded);
        }
        match result {
            Ok(score) => {
                let score = score.covering(&self.questions);
                info!(
                    score = score.score(),
                    total = score.total_questions(),
                    "exam scored"
                );
                self.score = Some(score);
                self.state = ExamState::Scored;
                Ok(Completion::Applied)
            }
            Err(e) => {
                warn!(error = %e, "submission failed");
                self.state = ExamState::InProgress;
                if self.clock.remaining() > 0 {
                    self.clock.resume();
                }
                Err(ExamError::Submission(e))
            }
        }
    }

    /// Submit the current answers and wait for the score.
    ///
    /// # Errors
    ///
    /// See `begin_submit` and `complete_submit`.
    pub async fn submit(&mut self) -> Result<Completion, ExamError> {
        let ticket = self.begin_submit()?;
        self.finish_submission(ticket).await
    }

    /// Send an already started submission and apply its result.
    ///
    /// # Errors
    ///
    /// See `complete_submit`.
    #[instrument(skip_all, fields(test_id = %ticket.test_id, reason = ?ticket.reason))]
    pub async fn finish_submission(
        &mut self,
        ticket: SubmitTicket,
    ) -> Result<Completion, ExamError> {
        let result = self
            .scoring
            .submit_exam(&ticket.test_id, &ticket.answers)
            .await;
        self.complete_submit(ticket, result)
    }

    // ─── Lifecycle ─────────────────────────────────────────────────────────

    /// Abandon the exam; outstanding loads and submissions become stale.
    pub fn leave(&mut self) {
        if self.state != ExamState::Idle {
            debug!(instance = self.instance, "leaving exam");
        }
        self.reset();
    }

    /// Forget the last score without touching the running exam.
    pub fn clear_score(&mut self) {
        self.score = None;
        if self.state == ExamState::Scored {
            self.state = ExamState::Idle;
        }
    }

    fn reset(&mut self) {
        self.clock.stop();
        self.instance += 1;
        self.state = ExamState::Idle;
        self.test_id = None;
        self.questions.clear();
        self.answers.clear();
        self.cursor = None;
        self.score = None;
    }

    // ─── Accessors ─────────────────────────────────────────────────────────

    #[must_use]
    pub fn state(&self) -> ExamState {
        self.state
    }

    #[must_use]
    pub fn test_id(&self) -> Option<&TestId> {
        self.test_id.as_ref()
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn cursor(&self) -> Option<Cursor> {
        self.cursor
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.cursor.and_then(|c| self.questions.get(c.index()))
    }

    #[must_use]
    pub fn answer(&self, question_id: QuestionId) -> Option<&str> {
        self.answers.get(question_id)
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.answered_count()
    }

    #[must_use]
    pub fn remaining_secs(&self) -> u32 {
        self.clock.remaining()
    }

    #[must_use]
    pub fn clock(&self) -> &ExamClock {
        &self.clock
    }

    /// Tick for the running countdown, for callers that drive time by hand.
    #[must_use]
    pub fn current_tick(&self) -> ClockTick {
        self.clock.current_tick()
    }

    #[must_use]
    pub fn score(&self) -> Option<&Score> {
        self.score.as_ref()
    }

    /// Scored questions with their verdicts, empty until the exam is scored.
    #[must_use]
    pub fn review_items(&self) -> Vec<ReviewItem> {
        self.score
            .as_ref()
            .map(|score| merge_score(&self.questions, score))
            .unwrap_or_default()
    }

    #[must_use]
    pub fn question_bank(&self) -> Arc<dyn QuestionBank> {
        Arc::clone(&self.questions_source)
    }

    #[must_use]
    pub fn scoring(&self) -> Arc<dyn ScoringService> {
        Arc::clone(&self.scoring)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::time::fixed_clock;
    use remote::{InMemoryBackend, Operation, Remote};

    fn question(id: u64, answer: &str) -> Question {
        Question::new(
            QuestionId::new(id),
            format!("Question {id}"),
            vec!["a".into(), "b".into(), "c".into()],
            Some(answer.into()),
        )
        .unwrap()
    }

    fn controller(backend: &InMemoryBackend) -> ExamSessionController {
        let remote = Remote::in_memory(backend.clone());
        ExamSessionController::new(remote.questions, remote.scoring, ExamClock::manual())
    }

    fn backend() -> InMemoryBackend {
        InMemoryBackend::new(fixed_clock())
            .with_test("test1", vec![question(1, "b"), question(2, "c"), question(3, "a")])
    }

    #[tokio::test]
    async fn load_starts_clock_at_45_seconds_per_question() {
        let backend = backend();
        let mut exam = controller(&backend);
        exam.load(TestId::new("test1")).await.unwrap();
        assert_eq!(exam.state(), ExamState::InProgress);
        assert_eq!(exam.remaining_secs(), 135);
        assert_eq!(exam.cursor().unwrap().index(), 0);
    }

    #[tokio::test]
    async fn navigation_is_clamped() {
        let backend = backend();
        let mut exam = controller(&backend);
        exam.load(TestId::new("test1")).await.unwrap();

        assert_eq!(exam.previous(), Step::AtBoundary);
        assert_eq!(exam.next(), Step::Moved(1));
        assert_eq!(exam.next(), Step::Moved(2));
        assert_eq!(exam.next(), Step::AtBoundary);
        assert_eq!(exam.jump_to(3), Err(ExamError::InvalidIndex(3)));
        exam.jump_to(0).unwrap();
        assert_eq!(exam.current_question().unwrap().id(), QuestionId::new(1));
    }

    #[tokio::test]
    async fn last_selection_wins_and_marks_navigator() {
        let backend = backend();
        let mut exam = controller(&backend);
        exam.load(TestId::new("test1")).await.unwrap();

        exam.select_current("a").unwrap();
        exam.select_current("c").unwrap();
        exam.select_current("c").unwrap();
        assert_eq!(exam.answer(QuestionId::new(1)), Some("c"));
        assert_eq!(
            exam.select_option(QuestionId::new(42), "a"),
            Err(ExamError::UnknownQuestion(42))
        );

        let marks: Vec<_> = exam.navigator().iter().map(|s| s.answered).collect();
        assert_eq!(marks, vec![true, false, false]);
        assert!(exam.navigator()[0].current);
    }

    #[tokio::test]
    async fn second_submit_while_in_flight_is_refused() {
        let backend = backend();
        let mut exam = controller(&backend);
        exam.load(TestId::new("test1")).await.unwrap();

        let ticket = exam.begin_submit().unwrap();
        assert!(!exam.clock().is_running());
        assert_eq!(exam.begin_submit(), Err(ExamError::SubmissionInFlight));
        assert_eq!(ticket.reason(), SubmitReason::Manual);
    }

    #[tokio::test]
    async fn load_failure_returns_to_idle() {
        let backend = backend();
        backend.fail_on(Operation::FetchQuestions);
        let mut exam = controller(&backend);
        let err = exam.load(TestId::new("test1")).await.unwrap_err();
        assert!(matches!(err, ExamError::Load(_)));
        assert_eq!(exam.state(), ExamState::Idle);
        assert!(exam.questions().is_empty());
    }

    #[tokio::test]
    async fn empty_test_is_a_load_error() {
        let backend = InMemoryBackend::new(fixed_clock()).with_test("empty", Vec::new());
        let mut exam = controller(&backend);
        assert_eq!(
            exam.load(TestId::new("empty")).await,
            Err(ExamError::EmptyTest(TestId::new("empty")))
        );
        assert_eq!(exam.state(), ExamState::Idle);
    }

    #[tokio::test]
    async fn leaving_discards_outstanding_submission() {
        let backend = backend();
        let mut exam = controller(&backend);
        exam.load(TestId::new("test1")).await.unwrap();
        let ticket = exam.begin_submit().unwrap();
        exam.leave();

        let score = Score::new(0, 3, Default::default());
        assert_eq!(exam.complete_submit(ticket, Ok(score)), Ok(Completion::Discarded));
        assert_eq!(exam.state(), ExamState::Idle);
        assert!(exam.score().is_none());
    }

    #[tokio::test]
    async fn clear_score_forgets_finished_exam() {
        let backend = backend();
        let mut exam = controller(&backend);
        exam.load(TestId::new("test1")).await.unwrap();
        exam.select_current("b").unwrap();
        exam.submit().await.unwrap();
        assert_eq!(exam.state(), ExamState::Scored);
        assert_eq!(exam.review_items().len(), 3);

        exam.clear_score();
        assert!(exam.score().is_none());
        assert_eq!(exam.state(), ExamState::Idle);
    }
}
