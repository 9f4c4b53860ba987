//! Feedback client against a local chat-completion endpoint.
//!
//! Exercises the real blocking HTTP transport: status classification,
//! per-attempt timeouts and the request headers/body on the wire.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use fluoride_common::{
    FeedbackClient, FeedbackRequest, GuidelineDirectory, LlmConfig, EXHAUSTED_MESSAGE,
    UNAUTHORIZED_MESSAGE,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const API_KEY: &str = "sk-test";
const COMPLETION: &str = r#"{"choices":[{"message":{"content":" Hello. "}}]}"#;

#[derive(Clone, Copy)]
enum Script {
    Unauthorized,
    ServerError,
    TimeoutThenOk,
}

#[derive(Clone)]
struct Endpoint {
    script: Script,
    calls: Arc<AtomicUsize>,
    bodies: Arc<Mutex<Vec<serde_json::Value>>>,
}

async fn chat_completions(
    State(endpoint): State<Endpoint>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> (StatusCode, String) {
    let call = endpoint.calls.fetch_add(1, Ordering::SeqCst) + 1;
    endpoint.bodies.lock().unwrap().push(body);

    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {}", API_KEY))
        .unwrap_or(false);
    if !authorized {
        return (StatusCode::UNAUTHORIZED, "bad key".to_string());
    }

    match endpoint.script {
        Script::Unauthorized => (StatusCode::UNAUTHORIZED, "{}".to_string()),
        Script::ServerError => (StatusCode::INTERNAL_SERVER_ERROR, "boom".to_string()),
        Script::TimeoutThenOk => {
            if call == 1 {
                tokio::time::sleep(Duration::from_secs(3)).await;
            }
            (StatusCode::OK, COMPLETION.to_string())
        }
    }
}

/// Serve `script` on an ephemeral port, returning the endpoint URL
fn spawn_endpoint(script: Script) -> (String, Endpoint) {
    let endpoint = Endpoint {
        script,
        calls: Arc::new(AtomicUsize::new(0)),
        bodies: Arc::new(Mutex::new(Vec::new())),
    };
    let state = endpoint.clone();
    let (tx, rx) = std::sync::mpsc::channel();

    std::thread::spawn(move || {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async move {
            let app = Router::new()
                .route("/v1/chat/completions", post(chat_completions))
                .with_state(state);
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            tx.send(listener.local_addr().unwrap()).unwrap();
            axum::serve(listener, app).await.unwrap();
        });
    });

    let addr = rx.recv().unwrap();
    (format!("http://{}/v1/chat/completions", addr), endpoint)
}

fn client(url: String, retries: u32, api_key: &str) -> FeedbackClient {
    let config = LlmConfig {
        endpoint: url,
        timeout_secs: 0.5,
        max_retries: retries,
        api_key: Some(api_key.to_string()),
        ..LlmConfig::default()
    };
    FeedbackClient::from_config(&config)
        .unwrap()
        .with_directory(GuidelineDirectory::from_entries([("Texas", "https://example.org/tx")]))
}

fn ohio() -> FeedbackRequest {
    FeedbackRequest {
        state_name: "Ohio".to_string(),
        year: 2021,
        cws_name: "Columbus Water".to_string(),
        max_fluoride: 0.71,
        avg_fluoride: 0.68,
    }
}

#[test]
fn test_unauthorized_stops_after_one_call() {
    let (url, endpoint) = spawn_endpoint(Script::Unauthorized);
    let feedback = client(url, 3, API_KEY).generate_feedback(&ohio());

    assert_eq!(feedback, UNAUTHORIZED_MESSAGE);
    assert_eq!(endpoint.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_wrong_key_is_unauthorized() {
    let (url, endpoint) = spawn_endpoint(Script::TimeoutThenOk);
    let feedback = client(url, 3, "sk-wrong").generate_feedback(&ohio());

    assert_eq!(feedback, UNAUTHORIZED_MESSAGE);
    assert_eq!(endpoint.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_server_errors_use_every_attempt() {
    let (url, endpoint) = spawn_endpoint(Script::ServerError);
    let feedback = client(url, 3, API_KEY).generate_feedback(&ohio());

    assert_eq!(feedback, EXHAUSTED_MESSAGE);
    assert_eq!(endpoint.calls.load(Ordering::SeqCst), 3);
}

#[test]
fn test_timeout_then_completion() {
    let (url, endpoint) = spawn_endpoint(Script::TimeoutThenOk);
    let feedback = client(url, 3, API_KEY).generate_feedback(&ohio());

    assert_eq!(feedback, "Hello.");
    assert_eq!(endpoint.calls.load(Ordering::SeqCst), 2);

    let bodies = endpoint.bodies.lock().unwrap();
    let body = &bodies[1];
    assert_eq!(body["model"], "gpt-4");
    assert_eq!(body["max_tokens"], 350);
    assert_eq!(body["messages"][0]["role"], "system");
    let prompt = body["messages"][1]["content"].as_str().unwrap();
    assert!(prompt.contains("CDC’s WFRS"));
    assert!(prompt.contains("0.71"));
    assert!(prompt.contains("0.68"));
}

#[test]
fn test_connection_refused_exhausts() {
    // Bind and drop to get a port with nothing listening
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let url = format!("http://127.0.0.1:{}/v1/chat/completions", port);

    let feedback = client(url, 2, API_KEY).generate_feedback(&ohio());
    assert_eq!(feedback, EXHAUSTED_MESSAGE);
}
