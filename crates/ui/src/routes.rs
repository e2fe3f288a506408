//! View router: the named views and the legal moves between them.
//!
//! `transition` is pure. It returns the next `RouterState` plus the effects
//! the driver must apply to the exam controller, the editing workflow and the
//! loaders. Nothing outside this module decides which view is shown.

use std::fmt;

use exam_core::model::{AttemptId, TestId, UserId};
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum View {
    Login,
    Dashboard,
    Menu,
    Exam,
    Attempts,
    ReviewAttempt,
    Charts,
    SelectEditTest,
    EditQuestions,
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            View::Login => "login",
            View::Dashboard => "dashboard",
            View::Menu => "menu",
            View::Exam => "exam",
            View::Attempts => "attempts",
            View::ReviewAttempt => "reviewAttempt",
            View::Charts => "charts",
            View::SelectEditTest => "selectEditTest",
            View::EditQuestions => "editQuestions",
        };
        f.write_str(name)
    }
}

/// User navigation and login/logout outcomes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NavEvent {
    LoggedIn(UserId),
    Logout,
    OpenDashboard,
    OpenMenu,
    StartExam(TestId),
    OpenAttempts,
    ReviewAttempt(AttemptId),
    OpenCharts,
    OpenEditor,
    EditTest(TestId),
}

/// Work the driver performs after a transition, in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    ClearScore,
    StartExam(TestId),
    LeaveExam,
    AssembleReview(AttemptId),
    DetachExam,
    LoadEditSession(TestId),
    DiscardEditSession,
    LoadDashboard,
    LoadAttempts,
    LoadChart,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouterState {
    pub view: View,
    pub user: Option<UserId>,
    pub pending_review: Option<AttemptId>,
}

impl Default for RouterState {
    fn default() -> Self {
        Self {
            view: View::Login,
            user: None,
            pending_review: None,
        }
    }
}

impl RouterState {
    /// Whether a finished review for `attempt_id` may still be shown.
    #[must_use]
    pub fn accepts_review(&self, attempt_id: AttemptId) -> bool {
        self.view == View::ReviewAttempt && self.pending_review == Some(attempt_id)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transition {
    pub state: RouterState,
    pub effects: Vec<Effect>,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum RouteError {
    #[error("log in first")]
    Unauthenticated,
    #[error("cannot go from {from} via {event}")]
    InvalidTransition { from: View, event: String },
}

/// Compute the next state for `event`.
///
/// # Errors
///
/// Returns `RouteError::Unauthenticated` for any event but a login while no
/// user is set, and `RouteError::InvalidTransition` for moves the current
/// view does not offer.
pub fn transition(state: &RouterState, event: NavEvent) -> Result<Transition, RouteError> {
    let from = state.view;
    let invalid = |event: &NavEvent| RouteError::InvalidTransition {
        from,
        event: format!("{event:?}"),
    };

    let user = match (&event, state.user) {
        (NavEvent::LoggedIn(user), None) => Some(*user),
        (NavEvent::LoggedIn(_), Some(_)) => return Err(invalid(&event)),
        (_, None) => return Err(RouteError::Unauthenticated),
        (NavEvent::Logout, Some(_)) => None,
        (_, Some(user)) => Some(user),
    };

    let mut entry = Vec::new();
    let mut pending_review = None;
    let to = match &event {
        NavEvent::LoggedIn(_) | NavEvent::OpenDashboard => {
            entry.push(Effect::LoadDashboard);
            View::Dashboard
        }
        NavEvent::Logout => View::Login,
        NavEvent::OpenMenu => View::Menu,
        NavEvent::StartExam(test_id) => {
            if !matches!(from, View::Menu | View::Exam) {
                return Err(invalid(&event));
            }
            entry.push(Effect::ClearScore);
            entry.push(Effect::StartExam(test_id.clone()));
            View::Exam
        }
        NavEvent::OpenAttempts => {
            entry.push(Effect::LoadAttempts);
            View::Attempts
        }
        NavEvent::ReviewAttempt(attempt_id) => {
            if !matches!(from, View::Attempts | View::ReviewAttempt) {
                return Err(invalid(&event));
            }
            pending_review = Some(*attempt_id);
            entry.push(Effect::DetachExam);
            entry.push(Effect::AssembleReview(*attempt_id));
            View::ReviewAttempt
        }
        NavEvent::OpenCharts => {
            entry.push(Effect::LoadChart);
            View::Charts
        }
        NavEvent::OpenEditor => View::SelectEditTest,
        NavEvent::EditTest(test_id) => {
            if !matches!(from, View::SelectEditTest | View::EditQuestions) {
                return Err(invalid(&event));
            }
            entry.push(Effect::LoadEditSession(test_id.clone()));
            View::EditQuestions
        }
    };

    let mut effects = Vec::new();
    if from == View::Exam && to != View::Exam {
        effects.push(Effect::LeaveExam);
    }
    if from == View::EditQuestions && to != View::EditQuestions {
        effects.push(Effect::DiscardEditSession);
    }
    effects.extend(entry);

    Ok(Transition {
        state: RouterState {
            view: to,
            user,
            pending_review,
        },
        effects,
    })
}
