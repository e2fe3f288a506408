use exam_core::model::{AnswerSheet, Question, QuestionId, TestId};
use exam_core::time::fixed_clock;
use remote::{InMemoryBackend, Operation, Remote, ScoringService};
use services::{AppServices, CommitOutcome, ExamState};
use ui::vm::Verdict;
use ui::{
    App, AppEvent, NavEvent, ReviewReady, RouteError, View, ViewError, ViewState,
    build_app_context,
};

fn question(id: u64, answer: &str) -> Question {
    Question::new(
        QuestionId::new(id),
        format!("Question {id}?"),
        vec!["alpha".into(), "beta".into(), "gamma".into()],
        Some(answer.into()),
    )
    .expect("valid question")
}

fn demo() -> (InMemoryBackend, App) {
    let backend = InMemoryBackend::new(fixed_clock())
        .with_test("test1", vec![question(1, "beta"), question(2, "gamma")]);
    backend.add_user("ana", "secret");
    let services = AppServices::new(Remote::in_memory(backend.clone()));
    (backend, App::new(build_app_context(services)))
}

async fn next_review(app: &mut App) -> ReviewReady {
    loop {
        if let Some(AppEvent::Review(ready)) = app.next_event().await {
            return ready;
        }
    }
}

#[tokio::test]
async fn nothing_but_login_before_authentication() {
    let (_, mut app) = demo();
    assert_eq!(app.view(), View::Login);
    assert_eq!(
        app.navigate(NavEvent::OpenMenu).await,
        Err(RouteError::Unauthenticated)
    );
    assert_eq!(
        app.login("ana", "wrong").await,
        Err(ViewError::Login("Invalid password".into()))
    );
    app.login("ana", "secret").await.expect("login");
    assert_eq!(app.view(), View::Dashboard);
    assert!(matches!(app.dashboard(), ViewState::Ready(d) if d.attempts == 0));
}

#[tokio::test]
async fn exam_then_review_of_the_recorded_attempt() {
    let (backend, mut app) = demo();
    app.login("ana", "secret").await.expect("login");
    app.navigate(NavEvent::OpenMenu).await.expect("menu");
    assert!(app.start_exam(TestId::new("test5")).await.is_err());
    app.start_exam(TestId::new("test1")).await.expect("start");

    let vm = app.exam_vm().expect("question on screen");
    assert_eq!(vm.title, "NACC Mock Test 1");
    assert_eq!(vm.position, "Question 1 of 2");
    assert_eq!(vm.timer, "00:01:30");

    app.choose(1).expect("choose beta");
    app.submit().await.expect("submit");
    let score = app.score_vm().expect("score");
    assert_eq!(score.headline, "Score: 1 / 1");

    app.navigate(NavEvent::OpenAttempts).await.expect("attempts");
    assert_eq!(app.exam().state(), ExamState::Idle);
    let attempt_id = match app.attempts() {
        ViewState::Ready(rows) => rows[0].id,
        other => panic!("attempts not loaded: {other:?}"),
    };

    app.navigate(NavEvent::ReviewAttempt(attempt_id))
        .await
        .expect("review");
    assert!(matches!(app.review(), ViewState::Loading));
    let ready = next_review(&mut app).await;
    assert!(app.complete_review(ready));
    let review = app.review().ready().expect("review ready");
    assert_eq!(review.correct, 1);
    assert_eq!(review.items[0].verdict, Verdict::Correct);
    assert_eq!(review.items[1].verdict, Verdict::NoResult);
    assert_eq!(backend.calls(Operation::SubmitExam), 1);
}

#[tokio::test]
async fn editing_the_answer_key_then_leaving() {
    let (backend, mut app) = demo();
    app.login("ana", "secret").await.expect("login");
    app.navigate(NavEvent::OpenEditor).await.expect("editor");
    app.navigate(NavEvent::EditTest(TestId::new("test1")))
        .await
        .expect("edit");

    let vm = app.edit_vm().expect("edit screen");
    assert!(vm.options[1].pending && vm.options[1].canonical);

    app.choose_pending(0).expect("pending");
    assert_eq!(app.commit_edit().await, Ok(CommitOutcome::Advanced(1)));
    assert_eq!(
        backend
            .canonical_answer(&TestId::new("test1"), QuestionId::new(1))
            .as_deref(),
        Some("alpha")
    );

    app.navigate(NavEvent::OpenDashboard).await.expect("leave");
    assert!(app.edit_vm().is_none());
}

#[tokio::test]
async fn review_finishing_after_leaving_is_dropped() {
    let (backend, mut app) = demo();
    app.login("ana", "secret").await.expect("login");
    let sheet: AnswerSheet = [(QuestionId::new(1), "beta".to_string())]
        .into_iter()
        .collect();
    backend
        .submit_exam(&TestId::new("test1"), &sheet)
        .await
        .expect("recorded attempt");

    app.navigate(NavEvent::OpenAttempts).await.expect("attempts");
    let attempt_id = match app.attempts() {
        ViewState::Ready(rows) => rows[0].id,
        other => panic!("attempts not loaded: {other:?}"),
    };
    app.navigate(NavEvent::ReviewAttempt(attempt_id))
        .await
        .expect("review");
    app.navigate(NavEvent::OpenMenu).await.expect("menu");

    let ready = next_review(&mut app).await;
    assert_eq!(ready.attempt_id, attempt_id);
    assert!(ready.result.is_ok());
    assert!(!app.complete_review(ready));
    assert_eq!(app.view(), View::Menu);
    assert!(app.review().ready().is_none());
}
