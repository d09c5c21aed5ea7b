//! Conversation with the health assistant.
//!
//! Keeps the transcript and routes each turn to the live provider when one is
//! configured, or to the demo responder otherwise. The chat never surfaces AI
//! failures as errors: the assistant answers with an apology instead.

use super::latch::InFlight;
use crate::domain::{ChatMessage, DomainError};
use crate::ports::ChatPort;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

pub const GREETING: &str =
    "Hello! I am IASO AI, your personal health assistant. How can I help you today?";

pub const ERROR_REPLY: &str = "I'm sorry, I encountered an error. Please try again later.";

pub const KEY_ERROR_REPLY: &str =
    "⚠️ API key issue detected. Please check your AI provider configuration.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatMode {
    Live,
    Demo,
}

pub struct ChatService {
    live: Option<Arc<dyn ChatPort>>,
    demo: Arc<dyn ChatPort>,
    history: Mutex<Vec<ChatMessage>>,
    latch: InFlight,
}

impl ChatService {
    /// `live` is `None` when no API key is configured.
    pub fn new(live: Option<Arc<dyn ChatPort>>, demo: Arc<dyn ChatPort>) -> Self {
        Self {
            live,
            demo,
            history: Mutex::new(vec![ChatMessage::assistant(GREETING)]),
            latch: InFlight::new(),
        }
    }

    pub fn mode(&self) -> ChatMode {
        if self.live.is_some() {
            ChatMode::Live
        } else {
            ChatMode::Demo
        }
    }

    pub fn is_busy(&self) -> bool {
        self.latch.is_busy()
    }

    pub async fn history(&self) -> Vec<ChatMessage> {
        self.history.lock().await.clone()
    }

    /// Start over with just the greeting.
    pub async fn reset(&self) {
        *self.history.lock().await = vec![ChatMessage::assistant(GREETING)];
    }

    /// Send one user message and return the assistant's answer.
    ///
    /// Blank input is ignored (`Ok(None)`). A second call while a reply is
    /// pending fails with `Busy`. Otherwise exactly one user message and one
    /// assistant message are appended to the transcript.
    pub async fn send(&self, input: &str) -> Result<Option<ChatMessage>, DomainError> {
        let text = input.trim();
        if text.is_empty() {
            return Ok(None);
        }
        let _permit = self.latch.try_begin()?;

        let prior = {
            let mut history = self.history.lock().await;
            let prior = history.clone();
            history.push(ChatMessage::user(text));
            prior
        };

        let content = self.answer(&prior, text).await;
        let reply = ChatMessage::assistant(content);
        self.history.lock().await.push(reply.clone());
        Ok(Some(reply))
    }

    async fn answer(&self, prior: &[ChatMessage], text: &str) -> String {
        let Some(live) = &self.live else {
            return self.demo_answer(prior, text).await;
        };

        match live.reply(prior, text).await {
            Ok(reply) => {
                info!(reply_len = reply.len(), "assistant replied");
                reply
            }
            Err(DomainError::NotConfigured(_)) => self.demo_answer(prior, text).await,
            Err(e) => {
                warn!(error = %e, "chat reply failed");
                error_reply(&e).to_string()
            }
        }
    }

    async fn demo_answer(&self, prior: &[ChatMessage], text: &str) -> String {
        match self.demo.reply(prior, text).await {
            Ok(reply) => reply,
            Err(e) => error_reply(&e).to_string(),
        }
    }
}

/// Apology shown in place of a failed reply.
pub fn error_reply(err: &DomainError) -> &'static str {
    if err.to_string().contains("API key") {
        KEY_ERROR_REPLY
    } else {
        ERROR_REPLY
    }
}
