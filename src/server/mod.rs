//! HTTP surface for the chat session
//!
//! - POST /api/chat     - ask a question
//! - GET  /api/history  - conversation so far
//! - POST /api/theme    - toggle dark/light
//! - GET  /health       - liveness

pub mod routes;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use crate::session::ChatSession;

pub use routes::create_router;

#[derive(Clone)]
pub struct AppState {
    pub session: Arc<Mutex<ChatSession>>,
}

impl AppState {
    pub fn new(session: ChatSession) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
        }
    }
}

/// Run the HTTP server
pub async fn run(port: u16, session: ChatSession) -> Result<()> {
    let app = create_router(AppState::new(session));
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on http://{}", addr);
    println!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
