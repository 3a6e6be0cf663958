// src/session.rs
// Chat session state: history, theme and the idle/loading cycle

use std::sync::Arc;
use tracing::{error, info, warn};

use crate::chat::{ChatHistory, ChatMessage, Theme, FALLBACK_REPLY};
use crate::rag::Responder;

/// What happened to one input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Blank input; nothing was appended
    Ignored,
    /// A previous question is still being answered; nothing was appended
    Busy,
    /// The user message and this bot message were appended
    Replied(ChatMessage),
}

pub struct ChatSession {
    history: ChatHistory,
    theme: Theme,
    loading: bool,
    responder: Arc<dyn Responder>,
}

impl ChatSession {
    pub fn new(responder: Arc<dyn Responder>) -> Self {
        Self {
            history: ChatHistory::new(),
            theme: Theme::default(),
            loading: false,
            responder,
        }
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// Append the question, wait for the answer, append exactly one reply.
    ///
    /// Any failure while answering becomes the fixed fallback reply; the
    /// cause only goes to the log. Dropping the future mid-answer (client
    /// disconnect, timeout) also closes the turn with the fallback.
    pub async fn send(&mut self, input: &str) -> SendOutcome {
        if input.trim().is_empty() {
            return SendOutcome::Ignored;
        }
        if self.loading {
            return SendOutcome::Busy;
        }

        let turn = Turn::open(&mut self.history, &mut self.loading, input);

        let reply = match self.responder.respond(input).await {
            Ok(text) => ChatMessage::bot(text),
            Err(e) => {
                error!("Error sending message: {}", e);
                ChatMessage::bot(FALLBACK_REPLY)
            }
        };

        turn.close(reply.clone());
        SendOutcome::Replied(reply)
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.theme = self.theme.toggle();
        info!("Theme switched to {}", self.theme);
        self.theme
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn history(&self) -> &ChatHistory {
        &self.history
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }
}

/// One question in flight. Owns the loading flag until the bot reply is
/// appended; if dropped first, appends the fallback instead.
struct Turn<'a> {
    history: &'a mut ChatHistory,
    loading: &'a mut bool,
    closed: bool,
}

impl<'a> Turn<'a> {
    fn open(history: &'a mut ChatHistory, loading: &'a mut bool, input: &str) -> Self {
        history.push(ChatMessage::user(input));
        *loading = true;
        Self {
            history,
            loading,
            closed: false,
        }
    }

    fn close(mut self, reply: ChatMessage) {
        self.history.push(reply);
        self.closed = true;
    }
}

impl Drop for Turn<'_> {
    fn drop(&mut self) {
        if !self.closed {
            warn!("Turn cancelled before a reply arrived");
            self.history.push(ChatMessage::bot(FALLBACK_REPLY));
        }
        *self.loading = false;
    }
}
