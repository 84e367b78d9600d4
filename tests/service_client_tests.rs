use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use wiki_quiz_client::{Difficulty, ErrorKind, QuizService, ServiceClient};

#[derive(Clone, Default)]
struct MockState {
    requests: Arc<AtomicUsize>,
    last_generate_body: Arc<Mutex<Option<Value>>>,
    history: Arc<Mutex<Vec<Value>>>,
}

fn quiz_json(id: i64, num_questions: usize) -> Value {
    let questions: Vec<Value> = (0..num_questions)
        .map(|index| {
            let difficulty = ["easy", "medium", "hard"][index % 3];
            json!({
                "question": format!("Question {}?", index + 1),
                "options": ["Alpha", "Beta", "Gamma", "Delta"],
                "correct_answer": "Beta",
                "explanation": "Beta is mentioned in the second paragraph.",
                "difficulty": difficulty
            })
        })
        .collect();

    json!({
        "id": id,
        "title": "Alan Turing",
        "summary": "English mathematician and computer scientist.",
        "wikipedia_url": "https://en.wikipedia.org/wiki/Alan_Turing",
        "created_at": "2024-05-01T12:30:00",
        "questions": questions,
        "related_topics": ["Enigma", "Bletchley Park"]
    })
}

async fn generate_quiz(State(state): State<MockState>, Json(body): Json<Value>) -> Response {
    state.requests.fetch_add(1, Ordering::SeqCst);
    *state.last_generate_body.lock().unwrap() = Some(body.clone());

    let url = body["wikipedia_url"].as_str().unwrap_or_default();
    if url.ends_with("Missing_Article") {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"detail": "Could not fetch Wikipedia article"})),
        )
            .into_response();
    }
    if url.ends_with("Broken_Article") {
        return (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response();
    }
    if url.ends_with("Structured_Error") {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"detail": [{"loc": ["body", "num_questions"], "msg": "too large"}]})),
        )
            .into_response();
    }

    let num_questions = body["num_questions"].as_u64().unwrap_or(5) as usize;
    Json(quiz_json(1, num_questions)).into_response()
}

async fn list_history(State(state): State<MockState>) -> Json<Value> {
    state.requests.fetch_add(1, Ordering::SeqCst);
    Json(Value::Array(state.history.lock().unwrap().clone()))
}

async fn get_quiz(State(state): State<MockState>, Path(id): Path<i64>) -> Response {
    state.requests.fetch_add(1, Ordering::SeqCst);
    match id {
        404 => (StatusCode::NOT_FOUND, Json(json!({"detail": "Quiz not found"}))).into_response(),
        500 => (StatusCode::OK, "not json").into_response(),
        _ => Json(quiz_json(id, 3)).into_response(),
    }
}

async fn delete_quiz(State(state): State<MockState>, Path(id): Path<i64>) -> Response {
    state.requests.fetch_add(1, Ordering::SeqCst);
    if id == 404 {
        return (StatusCode::NOT_FOUND, Json(json!({"detail": "Quiz not found"}))).into_response();
    }
    Json(json!({"message": format!("Quiz {} deleted successfully", id)})).into_response()
}

async fn spawn_mock_service(history: Vec<Value>) -> (ServiceClient, MockState) {
    let state = MockState::default();
    *state.history.lock().unwrap() = history;

    let app = Router::new()
        .route("/generate_quiz", post(generate_quiz))
        .route("/history", get(list_history))
        .route("/quiz/:id", get(get_quiz).delete(delete_quiz))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (ServiceClient::new(format!("http://{}/", address)), state)
}

#[tokio::test]
async fn test_generate_quiz_wire_format() {
    let (client, state) = spawn_mock_service(vec![]).await;

    let quiz = client
        .generate_quiz("https://en.wikipedia.org/wiki/Alan_Turing", 7)
        .await
        .unwrap();

    let body = state.last_generate_body.lock().unwrap().clone().unwrap();
    assert_eq!(
        body,
        json!({"wikipedia_url": "https://en.wikipedia.org/wiki/Alan_Turing", "num_questions": 7})
    );

    assert_eq!(quiz.id, 1);
    assert_eq!(quiz.title, "Alan Turing");
    assert_eq!(quiz.questions.len(), 7);
    assert_eq!(quiz.questions[0].text, "Question 1?");
    assert_eq!(quiz.questions[0].correct_answer, "Beta");
    assert_eq!(quiz.questions[1].difficulty, Some(Difficulty::Medium));
    assert_eq!(
        quiz.related_topics,
        Some(vec!["Enigma".to_string(), "Bletchley Park".to_string()])
    );
    assert_eq!(quiz.created_at.to_rfc3339(), "2024-05-01T12:30:00+00:00");
    assert_eq!(state.requests.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_generate_quiz_uses_service_detail() {
    let (client, _) = spawn_mock_service(vec![]).await;

    let error = client
        .generate_quiz("https://en.wikipedia.org/wiki/Missing_Article", 5)
        .await
        .unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Service);
    assert_eq!(error.message(), "Could not fetch Wikipedia article");
}

#[tokio::test]
async fn test_generate_quiz_falls_back_on_unparsable_error_body() {
    let (client, _) = spawn_mock_service(vec![]).await;

    for article in ["Broken_Article", "Structured_Error"] {
        let error = client
            .generate_quiz(&format!("https://en.wikipedia.org/wiki/{}", article), 5)
            .await
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Service);
        assert_eq!(error.message(), "Failed to generate quiz", "article {}", article);
    }
}

#[tokio::test]
async fn test_list_history() {
    let history = vec![
        json!({
            "id": 2,
            "title": "Paris",
            "wikipedia_url": "https://en.wikipedia.org/wiki/Paris",
            "created_at": "2024-05-02T08:00:00Z"
        }),
        json!({
            "id": 1,
            "title": "Alan Turing",
            "wikipedia_url": "https://en.wikipedia.org/wiki/Alan_Turing",
            "created_at": "2024-05-01T12:30:00.123456"
        }),
    ];
    let (client, _) = spawn_mock_service(history).await;

    let rows = client.list_history().await.unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].id, 2);
    assert_eq!(rows[0].title, "Paris");
    assert_eq!(rows[1].wikipedia_url, "https://en.wikipedia.org/wiki/Alan_Turing");
}

#[tokio::test]
async fn test_list_history_empty() {
    let (client, _) = spawn_mock_service(vec![]).await;
    assert!(client.list_history().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_get_quiz() {
    let (client, _) = spawn_mock_service(vec![]).await;

    let quiz = client.get_quiz(42).await.unwrap();

    assert_eq!(quiz.id, 42);
    assert_eq!(quiz.questions.len(), 3);
    assert!(quiz.answer_key_violations().is_empty());
}

#[tokio::test]
async fn test_get_quiz_not_found_is_a_service_error() {
    let (client, _) = spawn_mock_service(vec![]).await;

    let error = client.get_quiz(404).await.unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Service);
    assert_eq!(error.message(), "Failed to fetch quiz");
}

#[tokio::test]
async fn test_get_quiz_malformed_body_is_a_service_error() {
    let (client, _) = spawn_mock_service(vec![]).await;

    let error = client.get_quiz(500).await.unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Service);
    assert!(!error.message().is_empty());
}

#[tokio::test]
async fn test_delete_quiz() {
    let (client, _) = spawn_mock_service(vec![]).await;

    let confirmation = client.delete_quiz(3).await.unwrap();
    assert_eq!(confirmation.message, "Quiz 3 deleted successfully");

    let error = client.delete_quiz(404).await.unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Service);
    assert_eq!(error.message(), "Failed to delete quiz");
}

#[tokio::test]
async fn test_transport_failure_is_a_service_error() {
    // Reserve a port, then close it so nothing is listening
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    drop(listener);

    let client = ServiceClient::new(format!("http://{}", address));

    let error = client.list_history().await.unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Service);
    assert!(!error.message().is_empty());

    let error = client
        .generate_quiz("https://en.wikipedia.org/wiki/Alan_Turing", 5)
        .await
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Service);
}

#[tokio::test]
async fn test_concurrent_calls_issue_one_request_each() {
    let (client, state) = spawn_mock_service(vec![]).await;

    let fetches = (1..=5).map(|id| client.get_quiz(id));
    let results = futures_util::future::join_all(fetches).await;
    let (generated, history) = tokio::join!(
        client.generate_quiz("https://en.wikipedia.org/wiki/Alan_Turing", 5),
        client.list_history()
    );

    for (index, result) in results.into_iter().enumerate() {
        assert_eq!(result.unwrap().id, index as i64 + 1);
    }
    assert!(generated.is_ok());
    assert!(history.is_ok());
    assert_eq!(state.requests.load(Ordering::SeqCst), 7);
}
