use std::sync::Arc;

use exam_core::model::{Cursor, Question, QuestionId, Step, TestId};
use remote::{QuestionBank, RemoteError};
use tracing::{debug, info, instrument, warn};

use crate::error::EditError;

/// Where the editing workflow stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditState {
    Unloaded,
    Loading,
    Loaded,
    Persisting,
    End,
}

/// Result of moving through the set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Moved(usize),
    EndOfSet,
    AtStart,
}

/// Result of applying a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Advanced(usize),
    EndOfSet,
    Discarded,
}

/// Questions of one test under correction.
///
/// `pending` is the choice for the question at the cursor; it starts as that
/// question's canonical answer and is `None` when the question has none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    test_id: TestId,
    questions: Vec<Question>,
    cursor: Cursor,
    pending: Option<String>,
}

impl EditSession {
    fn new(test_id: TestId, questions: Vec<Question>) -> Option<Self> {
        let cursor = Cursor::new(questions.len())?;
        let mut session = Self {
            test_id,
            questions,
            cursor,
            pending: None,
        };
        session.reseed();
        Some(session)
    }

    fn reseed(&mut self) {
        self.pending = self.current().answer().map(str::to_owned);
    }

    #[must_use]
    pub fn test_id(&self) -> &TestId {
        &self.test_id
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    #[must_use]
    pub fn current(&self) -> &Question {
        &self.questions[self.cursor.index()]
    }

    #[must_use]
    pub fn pending(&self) -> Option<&str> {
        self.pending.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditLoadTicket {
    generation: u64,
    test_id: TestId,
}

/// Outstanding save of one canonical answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitTicket {
    generation: u64,
    index: usize,
    question: QuestionId,
    answer: String,
    test_id: TestId,
}

impl CommitTicket {
    #[must_use]
    pub fn question_id(&self) -> QuestionId {
        self.question
    }

    #[must_use]
    pub fn answer(&self) -> &str {
        &self.answer
    }

    #[must_use]
    pub fn test_id(&self) -> &TestId {
        &self.test_id
    }
}

/// Corrects canonical answers one question at a time.
///
/// Each commit persists exactly one answer. The local copy is only updated
/// once the backend accepted it; on failure nothing moves.
pub struct AnswerEditingWorkflow {
    questions_source: Arc<dyn QuestionBank>,
    state: EditState,
    generation: u64,
    session: Option<EditSession>,
}

impl AnswerEditingWorkflow {
    #[must_use]
    pub fn new(questions: Arc<dyn QuestionBank>) -> Self {
        Self {
            questions_source: questions,
            state: EditState::Unloaded,
            generation: 0,
            session: None,
        }
    }

    pub fn begin_load(&mut self, test_id: TestId) -> EditLoadTicket {
        self.discard();
        self.state = EditState::Loading;
        EditLoadTicket {
            generation: self.generation,
            test_id,
        }
    }

    /// # Errors
    ///
    /// Returns `EditError::Load` or `EditError::EmptyTest`; the workflow is
    /// left `Unloaded`.
    pub fn complete_load(
        &mut self,
        ticket: EditLoadTicket,
        result: Result<Vec<Question>, RemoteError>,
    ) -> Result<bool, EditError> {
        if ticket.generation != self.generation || self.state != EditState::Loading {
            debug!(test_id = %ticket.test_id, "discarding stale edit load");
            return Ok(false);
        }
        let questions = result.map_err(|e| {
            self.state = EditState::Unloaded;
            EditError::Load(e)
        })?;
        let count = questions.len();
        let Some(session) = EditSession::new(ticket.test_id.clone(), questions) else {
            self.state = EditState::Unloaded;
            return Err(EditError::EmptyTest(ticket.test_id));
        };
        self.session = Some(session);
        self.state = EditState::Loaded;
        info!(test_id = %ticket.test_id, count, "editing started");
        Ok(true)
    }

    /// Fetch `test_id` for editing.
    ///
    /// # Errors
    ///
    /// See `complete_load`.
    #[instrument(skip(self))]
    pub async fn load(&mut self, test_id: TestId) -> Result<bool, EditError> {
        let ticket = self.begin_load(test_id);
        let result = self.questions_source.fetch_questions(&ticket.test_id).await;
        self.complete_load(ticket, result)
    }

    /// Set the pending choice for the question at the cursor.
    ///
    /// # Errors
    ///
    /// Returns `EditError::NotLoaded` without a session and `EditError::Busy`
    /// while a save is outstanding.
    pub fn select_pending(&mut self, option: impl Into<String>) -> Result<(), EditError> {
        let session = self.idle_session()?;
        session.pending = Some(option.into());
        Ok(())
    }

    /// Start saving the pending choice.
    ///
    /// # Errors
    ///
    /// Returns `EditError::Validation` when nothing is selected; no remote call
    /// may follow in that case.
    pub fn begin_commit(&mut self) -> Result<CommitTicket, EditError> {
        let generation = self.generation;
        let session = self.idle_session()?;
        let answer = session
            .pending
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .ok_or(EditError::Validation)?
            .to_owned();
        let ticket = CommitTicket {
            generation,
            index: session.cursor.index(),
            question: session.current().id(),
            answer,
            test_id: session.test_id.clone(),
        };
        self.state = EditState::Persisting;
        Ok(ticket)
    }

    /// Apply the backend's answer to a save.
    ///
    /// # Errors
    ///
    /// Returns `EditError::Persist` on failure; the local answer and cursor are
    /// left as they were.
    pub fn complete_commit(
        &mut self,
        ticket: CommitTicket,
        result: Result<(), RemoteError>,
    ) -> Result<CommitOutcome, EditError> {
        if ticket.generation != self.generation || self.state != EditState::Persisting {
            debug!(question_id = %ticket.question, "discarding stale commit");
            return Ok(CommitOutcome::Discarded);
        }
        let Some(session) = self.session.as_mut() else {
            return Ok(CommitOutcome::Discarded);
        };
        if let Err(e) = result {
            warn!(question_id = %ticket.question, error = %e, "answer update failed");
            self.state = EditState::Loaded;
            return Err(EditError::Persist(e));
        }

        if let Some(question) = session.questions.get_mut(ticket.index) {
            question.set_answer(ticket.answer.as_str());
        }
        info!(question_id = %ticket.question, answer = %ticket.answer, "canonical answer updated");
        let step = session.cursor.next();
        session.reseed();
        Ok(match step {
            Step::Moved(index) => {
                self.state = EditState::Loaded;
                CommitOutcome::Advanced(index)
            }
            Step::AtBoundary => {
                self.state = EditState::End;
                CommitOutcome::EndOfSet
            }
        })
    }

    /// Save the pending choice and move on.
    ///
    /// # Errors
    ///
    /// See `begin_commit` and `complete_commit`.
    pub async fn commit(&mut self) -> Result<CommitOutcome, EditError> {
        let ticket = self.begin_commit()?;
        let result = self
            .questions_source
            .update_canonical_answer(ticket.question, &ticket.answer, &ticket.test_id)
            .await;
        self.complete_commit(ticket, result)
    }

    /// Move forward without saving; the pending edit is dropped.
    ///
    /// # Errors
    ///
    /// Returns `EditError::NotLoaded` or `EditError::Busy`.
    pub fn next(&mut self) -> Result<Navigation, EditError> {
        let session = self.idle_session()?;
        let step = session.cursor.next();
        session.reseed();
        Ok(match step {
            Step::Moved(index) => {
                self.state = EditState::Loaded;
                Navigation::Moved(index)
            }
            Step::AtBoundary => {
                self.state = EditState::End;
                Navigation::EndOfSet
            }
        })
    }

    /// Move back; the pending edit is dropped.
    ///
    /// # Errors
    ///
    /// Returns `EditError::NotLoaded` or `EditError::Busy`.
    pub fn previous(&mut self) -> Result<Navigation, EditError> {
        let session = self.idle_session()?;
        let step = session.cursor.previous();
        session.reseed();
        self.state = EditState::Loaded;
        Ok(match step {
            Step::Moved(index) => Navigation::Moved(index),
            Step::AtBoundary => Navigation::AtStart,
        })
    }

    /// Drop the session; outstanding loads and saves become stale.
    pub fn discard(&mut self) {
        self.generation += 1;
        self.session = None;
        self.state = EditState::Unloaded;
    }

    fn idle_session(&mut self) -> Result<&mut EditSession, EditError> {
        match self.state {
            EditState::Persisting => return Err(EditError::Busy),
            EditState::Unloaded | EditState::Loading => return Err(EditError::NotLoaded),
            EditState::Loaded | EditState::End => {}
        }
        self.session.as_mut().ok_or(EditError::NotLoaded)
    }

    #[must_use]
    pub fn state(&self) -> EditState {
        self.state
    }

    #[must_use]
    pub fn session(&self) -> Option<&EditSession> {
        self.session.as_ref()
    }

    #[must_use]
    pub fn is_at_end(&self) -> bool {
        self.state == EditState::End
    }

    #[must_use]
    pub fn question_bank(&self) -> Arc<dyn QuestionBank> {
        Arc::clone(&self.questions_source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::time::fixed_clock;
    use remote::{InMemoryBackend, Operation, Remote};

    fn question(id: u64, answer: Option<&str>) -> Question {
        Question::new(
            QuestionId::new(id),
            format!("Q{id}"),
            vec!["a".into(), "b".into(), "c".into()],
            answer.map(str::to_owned),
        )
        .unwrap()
    }

    fn workflow(backend: &InMemoryBackend) -> AnswerEditingWorkflow {
        AnswerEditingWorkflow::new(Remote::in_memory(backend.clone()).questions)
    }

    #[tokio::test]
    async fn pending_is_seeded_from_canonical_answer() {
        let backend = InMemoryBackend::new(fixed_clock())
            .with_test("t", vec![question(1, Some("b")), question(2, None)]);
        let mut edit = workflow(&backend);
        edit.load(TestId::new("t")).await.unwrap();
        assert_eq!(edit.session().unwrap().pending(), Some("b"));

        assert_eq!(edit.next(), Ok(Navigation::Moved(1)));
        assert_eq!(edit.session().unwrap().pending(), None);
        assert_eq!(edit.commit().await, Err(EditError::Validation));
        assert_eq!(backend.calls(Operation::UpdateCanonicalAnswer), 0);
    }

    #[tokio::test]
    async fn persist_failure_keeps_cursor_and_local_answer() {
        let backend = InMemoryBackend::new(fixed_clock())
            .with_test("t", vec![question(1, Some("a")), question(2, Some("a"))]);
        let mut edit = workflow(&backend);
        edit.load(TestId::new("t")).await.unwrap();
        backend.fail_on(Operation::UpdateCanonicalAnswer);

        edit.select_pending("c").unwrap();
        assert!(matches!(edit.commit().await, Err(EditError::Persist(_))));
        let session = edit.session().unwrap();
        assert_eq!(session.cursor().index(), 0);
        assert_eq!(session.current().answer(), Some("a"));
        assert_eq!(session.pending(), Some("c"));
        assert_eq!(edit.state(), EditState::Loaded);
    }

    #[tokio::test]
    async fn saving_is_single_flight() {
        let backend =
            InMemoryBackend::new(fixed_clock()).with_test("t", vec![question(1, Some("a"))]);
        let mut edit = workflow(&backend);
        edit.load(TestId::new("t")).await.unwrap();

        let ticket = edit.begin_commit().unwrap();
        assert_eq!(edit.begin_commit(), Err(EditError::Busy));
        assert_eq!(edit.select_pending("b"), Err(EditError::Busy));
        assert_eq!(
            edit.complete_commit(ticket, Ok(())),
            Ok(CommitOutcome::EndOfSet)
        );
        assert!(edit.is_at_end());
    }

    #[tokio::test]
    async fn discarded_session_ignores_late_commit() {
        let backend =
            InMemoryBackend::new(fixed_clock()).with_test("t", vec![question(1, Some("a"))]);
        let mut edit = workflow(&backend);
        edit.load(TestId::new("t")).await.unwrap();
        let ticket = edit.begin_commit().unwrap();
        edit.discard();
        assert_eq!(
            edit.complete_commit(ticket, Ok(())),
            Ok(CommitOutcome::Discarded)
        );
        assert!(edit.session().is_none());
    }
}
