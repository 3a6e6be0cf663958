// src/server/routes.rs

use axum::{
    extract::State,
    http::{header, Method, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::AppState;
use crate::chat::{ChatMessage, Theme};
use crate::session::SendOutcome;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: ChatMessage,
    pub history_len: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ThemeResponse {
    pub theme: Theme,
    pub class: String,
}

type ApiError = (StatusCode, Json<Value>);

fn api_error(status: StatusCode, message: &str) -> ApiError {
    (status, Json(json!({ "error": message })))
}

/// Create the router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/chat", post(chat_handler))
        .route("/api/history", get(history_handler))
        .route("/api/theme", post(theme_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_handler() -> &'static str {
    "ok"
}

async fn chat_handler(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if req.message.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "message is empty"));
    }

    // one question at a time, like the loading flag in the terminal
    let mut session = state
        .session
        .try_lock()
        .map_err(|_| api_error(StatusCode::CONFLICT, "still answering the previous message"))?;

    match session.send(&req.message).await {
        SendOutcome::Replied(reply) => Ok(Json(ChatResponse {
            reply,
            history_len: session.history().len(),
        })),
        SendOutcome::Busy => Err(api_error(
            StatusCode::CONFLICT,
            "still answering the previous message",
        )),
        SendOutcome::Ignored => Err(api_error(StatusCode::BAD_REQUEST, "message is empty")),
    }
}

async fn history_handler(State(state): State<AppState>) -> Json<Vec<ChatMessage>> {
    let session = state.session.lock().await;
    Json(session.history().messages().to_vec())
}

async fn theme_handler(State(state): State<AppState>) -> Json<ThemeResponse> {
    let mut session = state.session.lock().await;
    let theme = session.toggle_theme();
    Json(ThemeResponse {
        theme,
        class: theme.class_name().to_string(),
    })
}
