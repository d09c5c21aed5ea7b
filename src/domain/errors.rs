//! Domain errors. Used by ports and use cases.
//!
//! Adapters map infrastructure errors into these. The AI variants are kept apart
//! so callers can pick the right fallback: `NotConfigured` selects demo replies,
//! the rest degrade to an apology (chat) or a warning (report analysis).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    /// No API key for the AI provider.
    #[error("AI provider not configured: {0}")]
    NotConfigured(String),

    /// Request never produced an HTTP response (DNS, connect, TLS, body read).
    #[error("AI transport error: {0}")]
    Transport(String),

    /// Provider answered with a non-success status.
    #[error("AI provider returned {status}: {message}")]
    ProviderStatus { status: u16, message: String },

    #[error("malformed AI response: {0}")]
    MalformedResponse(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Storage upload failed: {0}")]
    Storage(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    /// A request for the same action is already in flight.
    #[error("another request is already in progress")]
    Busy,

    #[error("UI error: {0}")]
    Ui(String),
}
