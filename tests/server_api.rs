// tests/server_api.rs
// HTTP routes driven in-process through tower's oneshot

mod test_helpers;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use ragchat::chat::{ChatMessage, Sender, FALLBACK_REPLY};
use ragchat::llm::PlaceholderEmbedder;
use ragchat::rag::{RagError, RagPipeline, Responder};
use ragchat::server::{create_router, AppState};
use ragchat::session::ChatSession;
use test_helpers::FakeModel;

fn state(model: FakeModel) -> AppState {
    let pipeline = RagPipeline::new(Arc::new(model), Arc::new(PlaceholderEmbedder::new(8)));
    AppState::new(ChatSession::new(Arc::new(pipeline)))
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body readable")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("json body")
}

#[tokio::test]
async fn test_health() {
    let app = create_router(state(FakeModel::replying("unused")));
    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_chat_then_history() {
    let state = state(FakeModel::replying("Abbey Road was released in 1969."));

    let response = create_router(state.clone())
        .oneshot(post_json("/api/chat", json!({ "message": "When did Abbey Road come out?" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["reply"]["sender"], "bot");
    assert_eq!(body["reply"]["text"], "Abbey Road was released in 1969.");
    assert_eq!(body["history_len"], 2);

    let response = create_router(state)
        .oneshot(Request::get("/api/history").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let history: Vec<ChatMessage> = serde_json::from_value(body_json(response).await).unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].sender, Sender::User);
    assert_eq!(history[0].text, "When did Abbey Road come out?");
}

#[tokio::test]
async fn test_failed_answer_returns_fallback() {
    let response = create_router(state(FakeModel::failing()))
        .oneshot(post_json("/api/chat", json!({ "message": "hello" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["reply"]["text"], FALLBACK_REPLY);
}

#[tokio::test]
async fn test_blank_message_is_rejected() {
    let state = state(FakeModel::replying("unused"));
    let response = create_router(state.clone())
        .oneshot(post_json("/api/chat", json!({ "message": "   " })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(state.session.lock().await.history().is_empty());
}

#[tokio::test]
async fn test_chat_while_busy_conflicts() {
    let state = state(FakeModel::replying("unused"));
    let _held = state.session.lock().await;

    let response = create_router(state.clone())
        .oneshot(post_json("/api/chat", json!({ "message": "hi" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_theme_toggles() {
    let state = state(FakeModel::replying("unused"));

    let response = create_router(state.clone())
        .oneshot(Request::post("/api/theme").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["theme"], "dark");
    assert_eq!(body["class"], "dark");

    let response = create_router(state)
        .oneshot(Request::post("/api/theme").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["theme"], "light");
    assert_eq!(body["class"], "");
}

/// Takes far longer than any client is willing to wait on "slow"
struct Stalling;

#[async_trait]
impl Responder for Stalling {
    async fn respond(&self, question: &str) -> Result<String, RagError> {
        if question == "slow" {
            tokio::time::sleep(Duration::from_secs(5)).await;
        }
        Ok(format!("answered {}", question))
    }
}

#[tokio::test]
async fn test_dropped_request_does_not_wedge_the_session() {
    let state = AppState::new(ChatSession::new(Arc::new(Stalling)));

    let dropped = tokio::time::timeout(
        Duration::from_millis(50),
        create_router(state.clone()).oneshot(post_json("/api/chat", json!({ "message": "slow" }))),
    )
    .await;
    assert!(dropped.is_err());

    let response = create_router(state.clone())
        .oneshot(post_json("/api/chat", json!({ "message": "fast" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["reply"]["text"], "answered fast");
    // slow question, its fallback, then the fast exchange
    assert_eq!(body["history_len"], 4);

    let session = state.session.lock().await;
    assert_eq!(session.history().messages()[1], ChatMessage::bot(FALLBACK_REPLY));
}
