use exam_core::model::{AnswerSheet, AttemptId, QuestionId, TestId, UserId};
use remote::{
    AttemptStore, Authenticator, HttpBackend, HttpConfig, QuestionBank, RemoteError,
    ScoringService,
};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn backend_for(server: &MockServer) -> HttpBackend {
    HttpBackend::new(&HttpConfig {
        base_url: server.uri(),
        timeout_secs: 5,
    })
    .expect("http backend")
}

#[tokio::test]
async fn login_returns_user_id_or_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .and(body_json(json!({"username": "ana", "password": "pw"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true, "user_id": 7
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .and(body_json(json!({"username": "ana", "password": "bad"})))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "success": false, "message": "Invalid password"
        })))
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    assert_eq!(backend.authenticate("ana", "pw").await.unwrap(), UserId::new(7));
    assert_eq!(
        backend.authenticate("ana", "bad").await.unwrap_err(),
        RemoteError::Rejected("Invalid password".into())
    );
}

#[tokio::test]
async fn fetches_questions_in_server_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/test1/questions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 2, "question": "Second?", "options": ["a", "b", null, "d"]},
            {"id": 1, "question": "First?", "options": ["w", "x", "y", "z"], "answer": "y"}
        ])))
        .mount(&server)
        .await;

    let questions = backend_for(&server)
        .fetch_questions(&TestId::new("test1"))
        .await
        .unwrap();
    assert_eq!(questions.len(), 2);
    assert_eq!(questions[0].id(), QuestionId::new(2));
    assert_eq!(questions[0].options().len(), 4);
    assert_eq!(questions[0].option_index("d"), Some(3));
    assert_eq!(questions[0].answer(), None);
    assert_eq!(questions[1].answer(), Some("y"));
}

#[tokio::test]
async fn invalid_test_surfaces_error_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/nope/questions"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"error": "Invalid test id"})),
        )
        .mount(&server)
        .await;

    let err = backend_for(&server)
        .fetch_questions(&TestId::new("nope"))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        RemoteError::Http {
            status: 400,
            message: "Invalid test id".into()
        }
    );
}

#[tokio::test]
async fn submit_posts_answer_map_and_decodes_results() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/test1/submit_exam"))
        .and(body_json(json!({"answers": {"1": "b"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "score": 1,
            "total_questions": 1,
            "results": {"1": {"user_answer": "b", "correct": true, "correct_answer": "b"}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let sheet: AnswerSheet = [(QuestionId::new(1), "b".to_string())].into_iter().collect();
    let score = backend_for(&server)
        .submit_exam(&TestId::new("test1"), &sheet)
        .await
        .unwrap();
    assert_eq!(score.score(), 1);
    assert!(score.result(QuestionId::new(1)).unwrap().correct);
}

#[tokio::test]
async fn update_answer_maps_acknowledgements() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/question/3/update_answer"))
        .and(body_json(json!({"test_id": "test1", "new_answer": "c"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true, "message": "Answer updated successfully"
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/question/99/update_answer"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "success": false, "message": "Question not found in this test"
        })))
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    let test = TestId::new("test1");
    backend
        .update_canonical_answer(QuestionId::new(3), "c", &test)
        .await
        .unwrap();
    assert_eq!(
        backend
            .update_canonical_answer(QuestionId::new(99), "c", &test)
            .await
            .unwrap_err(),
        RemoteError::NotFound
    );
}

#[tokio::test]
async fn attempt_lookups_decode_server_rows() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/user/1/attempts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 5, "test_id": "test2", "attempt_time": "Tue, 14 Nov 2023 22:13:20 GMT",
             "score": 3, "total_questions": 4}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/attempt/5/details"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"question_id": "11", "user_answer": "a", "correct_answer": "a", "is_correct": 1}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/attempt/5/info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"test_id": "test2"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/attempt/6/info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(null)))
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    let attempts = backend.user_attempts(UserId::new(1)).await.unwrap();
    assert_eq!(attempts[0].id, AttemptId::new(5));
    assert_eq!(attempts[0].total_questions, 4);

    let details = backend.attempt_details(AttemptId::new(5)).await.unwrap();
    assert_eq!(details[0].question_id, QuestionId::new(11));
    assert_eq!(details[0].is_correct, Some(true));

    assert_eq!(
        backend.attempt_info(AttemptId::new(5)).await.unwrap(),
        TestId::new("test2")
    );
    assert_eq!(
        backend.attempt_info(AttemptId::new(6)).await.unwrap_err(),
        RemoteError::NotFound
    );
}

#[tokio::test]
async fn unreachable_server_is_a_network_error() {
    let backend = HttpBackend::new(&HttpConfig {
        base_url: "http://127.0.0.1:9".into(),
        timeout_secs: 2,
    })
    .unwrap();
    let err = backend.user_summary(UserId::new(1)).await.unwrap_err();
    assert!(matches!(
        err,
        RemoteError::Network(_) | RemoteError::Timeout(_)
    ));
}
