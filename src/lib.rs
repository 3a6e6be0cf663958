// src/lib.rs

pub mod chat;
pub mod config;
pub mod knowledge;
pub mod llm;
pub mod rag;
pub mod repl;
pub mod server;
pub mod session;
pub mod tools;

pub use chat::{ChatHistory, ChatMessage, Sender, Theme, FALLBACK_REPLY};
pub use config::Config;
pub use rag::{RagPipeline, Responder};
pub use session::{ChatSession, SendOutcome};
