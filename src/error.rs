//! Error Handling Module
//!
//! Error taxonomy for the chat client. Authentication and transport failures
//! are terminal for a stream; payload-level parse failures are recovered
//! locally (the record is skipped) and never terminate the stream.

use thiserror::Error;

/// Chat client error type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    /// No credential was available before the request was sent.
    /// Raised without issuing any network I/O.
    #[error("not authenticated: {0}")]
    Unauthenticated(String),

    /// Invalid caller input or configuration (empty prompt, bad header value).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Non-success HTTP status or a network-level failure, including a
    /// response stream that closed before a terminal payload.
    #[error("transport error: {0}")]
    Transport(String),

    /// Malformed structured payload inside an otherwise valid record.
    #[error("malformed payload: {0}")]
    Payload(String),

    /// The server explicitly signaled failure inside a payload.
    #[error("server error: {0}")]
    Server(String),
}

impl ChatError {
    /// Whether the caller may reasonably retry the whole exchange.
    ///
    /// The client itself never retries; this only informs the UI's
    /// failure notice.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for ChatError {
    fn from(err: serde_json::Error) -> Self {
        Self::Payload(err.to_string())
    }
}
