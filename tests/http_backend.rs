//! `HttpChatBackend` against a local stub of the remote assistant.

use std::time::Duration;

use axum::http::{HeaderMap, StatusCode, header::USER_AGENT};
use axum::{Json, Router, routing::post};
use gemini_chat_widget::error::DispatchError;
use gemini_chat_widget::widget::{ChatBackend, HttpChatBackend};
use serde_json::{Value, json};
use url::Url;

/// Serve `app` on an ephemeral port and return the `/chat` URL.
async fn spawn_stub(app: Router) -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    Url::parse(&format!("http://{addr}/chat")).unwrap()
}

fn backend(endpoint: Url) -> HttpChatBackend {
    HttpChatBackend::new(endpoint, Some(Duration::from_secs(5))).unwrap()
}

#[tokio::test]
async fn test_reply_is_returned() {
    let app = Router::new().route(
        "/chat",
        post(|Json(body): Json<Value>| async move {
            let message = body["message"].as_str().unwrap_or_default().to_string();
            Json(json!({ "reply": format!("You said: {message}"), "model": "stub" }))
        }),
    );
    let endpoint = spawn_stub(app).await;

    let reply = backend(endpoint).send("Hello").await.unwrap();
    assert_eq!(reply, "You said: Hello");
}

#[tokio::test]
async fn test_supplied_client_is_used() {
    let app = Router::new().route(
        "/chat",
        post(|headers: HeaderMap| async move {
            let agent = headers[USER_AGENT].to_str().unwrap_or_default().to_string();
            Json(json!({ "reply": agent }))
        }),
    );
    let endpoint = spawn_stub(app).await;
    let http = reqwest::Client::builder()
        .user_agent("chat-widget-test/1.0")
        .build()
        .unwrap();

    let backend = HttpChatBackend::with_client(endpoint.clone(), http);
    assert_eq!(backend.endpoint(), &endpoint);
    assert_eq!(backend.send("Hello").await.unwrap(), "chat-widget-test/1.0");
}

#[tokio::test]
async fn test_server_error_is_status_error() {
    let app = Router::new().route(
        "/chat",
        post(|| async {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "quota exceeded" })),
            )
        }),
    );
    let endpoint = spawn_stub(app).await;

    let err = backend(endpoint).send("Ping").await.unwrap_err();
    match err {
        DispatchError::Status { status, body } => {
            assert_eq!(status, 500);
            assert!(body.contains("quota exceeded"));
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_invalid_json_is_malformed() {
    let app = Router::new().route("/chat", post(|| async { "not json at all" }));
    let endpoint = spawn_stub(app).await;

    let err = backend(endpoint).send("Ping").await.unwrap_err();
    assert!(matches!(err, DispatchError::Malformed(_)));
}

#[tokio::test]
async fn test_missing_reply_is_malformed() {
    let app = Router::new().route(
        "/chat",
        post(|| async { Json(json!({ "answer": "wrong field" })) }),
    );
    let endpoint = spawn_stub(app).await;

    let err = backend(endpoint).send("Ping").await.unwrap_err();
    assert!(matches!(err, DispatchError::Malformed(_)));
}

#[tokio::test]
async fn test_non_string_reply_is_malformed() {
    let app = Router::new().route("/chat", post(|| async { Json(json!({ "reply": 42 })) }));
    let endpoint = spawn_stub(app).await;

    let err = backend(endpoint).send("Ping").await.unwrap_err();
    assert!(matches!(err, DispatchError::Malformed(_)));
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    // Bind then drop to get a port nothing listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let endpoint = Url::parse(&format!("http://{addr}/chat")).unwrap();
    let err = backend(endpoint).send("Ping").await.unwrap_err();
    assert!(matches!(err, DispatchError::Transport(_)));
}

#[tokio::test]
async fn test_timeout_is_transport_error() {
    let app = Router::new().route(
        "/chat",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({ "reply": "too late" }))
        }),
    );
    let endpoint = spawn_stub(app).await;

    let slow = HttpChatBackend::new(endpoint, Some(Duration::from_millis(100))).unwrap();
    let err = slow.send("Ping").await.unwrap_err();
    assert!(matches!(err, DispatchError::Transport(_)));
}
