use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use exam_core::Clock;
use exam_core::model::{
    AnswerSheet, Attempt, AttemptDetailEntry, AttemptId, ChartPoint, Question, QuestionId,
    QuestionResult, Score, TestId, UserId, UserSummary, answers_match,
};
use tracing::debug;

use crate::repository::{AttemptStore, Authenticator, QuestionBank, RemoteError, ScoringService};

/// Collaborator operations that can be counted or made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Authenticate,
    FetchQuestions,
    UpdateCanonicalAnswer,
    SubmitExam,
    UserSummary,
    ChartSeries,
    UserAttempts,
    AttemptDetails,
    AttemptInfo,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

struct StoredAttempt {
    user_id: UserId,
    attempt: Attempt,
    details: Vec<AttemptDetailEntry>,
}

#[derive(Default)]
struct State {
    tests: HashMap<TestId, Vec<Question>>,
    users: HashMap<String, (UserId, String)>,
    attempts: Vec<StoredAttempt>,
    last_login: Option<UserId>,
    failing: HashSet<Operation>,
    calls: HashMap<Operation, usize>,
}

/// Simple in-memory backend implementing every collaborator, for testing and demos.
///
/// Scoring follows the server rules: answers are compared trimmed and
/// case-insensitive, and each submission is recorded as an attempt for the
/// most recently authenticated user.
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    state: Arc<Mutex<State>>,
    clock: Clock,
}

const DEFAULT_USER: u64 = 1;

impl InMemoryBackend {
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            clock,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, RemoteError> {
        self.state
            .lock()
            .map_err(|e| RemoteError::Connection(e.to_string()))
    }

    /// Register or replace the questions of a test.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_test(self, test_id: impl Into<String>, questions: Vec<Question>) -> Self {
        self.state
            .lock()
            .expect("in-memory backend lock")
            .tests
            .insert(TestId::new(test_id), questions);
        self
    }

    /// Register a user and return its identifier.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn add_user(&self, username: &str, password: &str) -> UserId {
        let mut state = self.state.lock().expect("in-memory backend lock");
        let next = u64::try_from(state.users.len()).unwrap_or(u64::MAX) + DEFAULT_USER;
        let id = UserId::new(next);
        state
            .users
            .insert(username.to_owned(), (id, password.to_owned()));
        id
    }

    /// Make every call of `op` fail until `recover` is called.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn fail_on(&self, op: Operation) {
        self.state
            .lock()
            .expect("in-memory backend lock")
            .failing
            .insert(op);
    }

    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn recover(&self, op: Operation) {
        self.state
            .lock()
            .expect("in-memory backend lock")
            .failing
            .remove(&op);
    }

    /// Number of calls made to `op`, failed ones included.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn calls(&self, op: Operation) -> usize {
        self.state
            .lock()
            .expect("in-memory backend lock")
            .calls
            .get(&op)
            .copied()
            .unwrap_or(0)
    }

    /// Current canonical answer, straight from the backing store.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn canonical_answer(&self, test_id: &TestId, question_id: QuestionId) -> Option<String> {
        let state = self.state.lock().expect("in-memory backend lock");
        state
            .tests
            .get(test_id)?
            .iter()
            .find(|q| q.id() == question_id)?
            .answer()
            .map(str::to_owned)
    }

    fn enter(&self, op: Operation) -> Result<MutexGuard<'_, State>, RemoteError> {
        let mut state = self.lock()?;
        *state.calls.entry(op).or_insert(0) += 1;
        if state.failing.contains(&op) {
            debug!(%op, "injected failure");
            return Err(RemoteError::Network(format!("injected failure: {op}")));
        }
        Ok(state)
    }

    fn user_attempts_sorted(state: &State, user_id: UserId) -> Vec<&StoredAttempt> {
        let mut rows: Vec<_> = state
            .attempts
            .iter()
            .filter(|a| a.user_id == user_id)
            .collect();
        rows.sort_by_key(|a| (a.attempt.attempted_at, a.attempt.id));
        rows
    }
}

#[async_trait]
impl Authenticator for InMemoryBackend {
    async fn authenticate(&self, username: &str, password: &str) -> Result<UserId, RemoteError> {
        let mut state = self.enter(Operation::Authenticate)?;
        let (id, stored) = state
            .users
            .get(username)
            .cloned()
            .ok_or_else(|| RemoteError::Rejected("User not found".into()))?;
        if stored != password {
            return Err(RemoteError::Rejected("Invalid password".into()));
        }
        state.last_login = Some(id);
        Ok(id)
    }
}

#[async_trait]
impl QuestionBank for InMemoryBackend {
    async fn fetch_questions(&self, test_id: &TestId) -> Result<Vec<Question>, RemoteError> {
        let state = self.enter(Operation::FetchQuestions)?;
        state.tests.get(test_id).cloned().ok_or(RemoteError::NotFound)
    }

    async fn update_canonical_answer(
        &self,
        question_id: QuestionId,
        new_answer: &str,
        test_id: &TestId,
    ) -> Result<(), RemoteError> {
        let mut state = self.enter(Operation::UpdateCanonicalAnswer)?;
        if new_answer.trim().is_empty() {
            return Err(RemoteError::Rejected("Missing new_answer".into()));
        }
        let questions = state
            .tests
            .get_mut(test_id)
            .ok_or_else(|| RemoteError::Rejected("Invalid test_id".into()))?;
        let question = questions
            .iter_mut()
            .find(|q| q.id() == question_id)
            .ok_or(RemoteError::NotFound)?;
        question.set_answer(new_answer);
        Ok(())
    }
}

#[async_trait]
impl ScoringService for InMemoryBackend {
    async fn submit_exam(
        &self,
        test_id: &TestId,
        answers: &AnswerSheet,
    ) -> Result<Score, RemoteError> {
        let mut state = self.enter(Operation::SubmitExam)?;
        if answers.is_empty() {
            return Err(RemoteError::Http {
                status: 400,
                message: "No answers submitted".into(),
            });
        }
        let questions = state
            .tests
            .get(test_id)
            .ok_or_else(|| RemoteError::Rejected("Invalid test id".into()))?;
        // The server counts submitted answers, not the questions of the test.
        let total = u32::try_from(answers.len()).unwrap_or(u32::MAX);

        let mut score = 0u32;
        let mut results = BTreeMap::new();
        for (question_id, user_answer) in answers.iter() {
            let correct_answer = questions
                .iter()
                .find(|q| q.id() == question_id)
                .and_then(Question::answer)
                .map(str::to_owned);
            let correct = correct_answer
                .as_deref()
                .is_some_and(|c| answers_match(user_answer, c));
            if correct {
                score += 1;
            }
            results.insert(
                question_id,
                QuestionResult {
                    user_answer: Some(user_answer.to_owned()),
                    correct_answer,
                    correct,
                },
            );
        }

        let user_id = state.last_login.unwrap_or(UserId::new(DEFAULT_USER));
        let next_id = u64::try_from(state.attempts.len()).unwrap_or(u64::MAX) + 1;
        let details = results
            .iter()
            .map(|(id, r)| AttemptDetailEntry {
                question_id: *id,
                user_answer: r.user_answer.clone(),
                correct_answer: r.correct_answer.clone(),
                is_correct: Some(r.correct),
            })
            .collect();
        state.attempts.push(StoredAttempt {
            user_id,
            attempt: Attempt {
                id: AttemptId::new(next_id),
                test_id: test_id.clone(),
                attempted_at: self.clock.now(),
                score,
                total_questions: total,
            },
            details,
        });
        debug!(%test_id, score, total, attempt_id = next_id, "scored submission");

        Ok(Score::new(score, total, results))
    }
}

#[async_trait]
impl AttemptStore for InMemoryBackend {
    async fn user_summary(&self, user_id: UserId) -> Result<UserSummary, RemoteError> {
        let state = self.enter(Operation::UserSummary)?;
        let scores: Vec<u32> = Self::user_attempts_sorted(&state, user_id)
            .iter()
            .map(|a| a.attempt.score)
            .collect();
        let attempts = u32::try_from(scores.len()).unwrap_or(u32::MAX);
        let average_score = (!scores.is_empty())
            .then(|| f64::from(scores.iter().sum::<u32>()) / f64::from(attempts));
        Ok(UserSummary {
            attempts,
            best: scores.iter().copied().max(),
            average_score,
        })
    }

    async fn chart_series(&self, user_id: UserId) -> Result<Vec<ChartPoint>, RemoteError> {
        let state = self.enter(Operation::ChartSeries)?;
        Ok(Self::user_attempts_sorted(&state, user_id)
            .iter()
            .map(|a| ChartPoint {
                attempted_at: a.attempt.attempted_at,
                score: a.attempt.score,
            })
            .collect())
    }

    async fn user_attempts(&self, user_id: UserId) -> Result<Vec<Attempt>, RemoteError> {
        let state = self.enter(Operation::UserAttempts)?;
        Ok(Self::user_attempts_sorted(&state, user_id)
            .iter()
            .rev()
            .map(|a| a.attempt.clone())
            .collect())
    }

    async fn attempt_details(
        &self,
        attempt_id: AttemptId,
    ) -> Result<Vec<AttemptDetailEntry>, RemoteError> {
        let state = self.enter(Operation::AttemptDetails)?;
        Ok(state
            .attempts
            .iter()
            .find(|a| a.attempt.id == attempt_id)
            .map(|a| a.details.clone())
            .unwrap_or_default())
    }

    async fn attempt_info(&self, attempt_id: AttemptId) -> Result<TestId, RemoteError> {
        let state = self.enter(Operation::AttemptInfo)?;
        state
            .attempts
            .iter()
            .find(|a| a.attempt.id == attempt_id)
            .map(|a| a.attempt.test_id.clone())
            .ok_or(RemoteError::NotFound)
    }
}
