//! Core Types
//!
//! Request, event, and completion types shared by the streaming pipeline and
//! the observer bridge.

use chrono::{DateTime, Utc};
use futures::Stream;
use std::pin::Pin;

use crate::error::ChatError;
use crate::streaming::StreamPayload;

/// One logical chat exchange submitted by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    /// The user's prompt. Must be non-empty at submission time.
    pub prompt: String,
    /// Server-assigned opaque conversation id; absent on the first exchange
    /// of a conversation (the server allocates one).
    pub conversation_id: Option<String>,
}

impl ChatRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            conversation_id: None,
        }
    }

    pub fn with_conversation_id(mut self, id: impl Into<String>) -> Self {
        self.conversation_id = Some(id.into());
        self
    }
}

/// Terminal success data for one stream.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChatCompletion {
    /// Final response text.
    pub message: String,
    /// Conversation id, stable for the remainder of the exchange once the
    /// server assigns it.
    pub conversation_id: Option<String>,
    /// Server-reported completion time; absent when the server omits it or
    /// sends something unparseable.
    pub timestamp: Option<DateTime<Utc>>,
    /// Ordered source references backing the response.
    pub source_references: Vec<String>,
}

/// Events yielded by a chat stream.
///
/// A stream yields zero or more `TokenDelta` items followed by exactly one
/// terminal item: `Completed`, or `Err(ChatError)` for failures.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatStreamEvent {
    /// One partial token plus the server-reported accumulated text so far.
    TokenDelta {
        token: String,
        accumulated: String,
        /// The full wire payload the delta was derived from.
        raw: StreamPayload,
    },
    /// Terminal success.
    Completed { completion: ChatCompletion },
}

/// Chat Stream - pinned, boxed stream of chat events.
pub type ChatStream = Pin<Box<dyn Stream<Item = Result<ChatStreamEvent, ChatError>> + Send>>;

/// Chat stream paired with a first-class cancellation handle.
///
/// Cancelling (or dropping the stream) closes the underlying HTTP connection
/// so the server stops generating tokens. Best-effort: events already in
/// flight may still be delivered.
pub struct ChatStreamHandle {
    pub stream: ChatStream,
    pub cancel: crate::client::CancelHandle,
}
