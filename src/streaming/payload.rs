//! Wire payload parsing and classification
//!
//! Each data-bearing record carries one JSON payload. Classification
//! precedence: an `error` field is terminal, a `token` field is a partial
//! delta, `done: true` is terminal success, anything else is ignored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ChatError;
use crate::types::ChatCompletion;

/// Structured payload of one data-bearing record.
///
/// All fields are optional on the wire; unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct StreamPayload {
    /// Server-signaled failure; terminal.
    pub error: Option<String>,
    /// One partial token.
    pub token: Option<String>,
    /// Accumulated text so far (with `token`) or final text (with `done`).
    pub message: Option<String>,
    /// Completion marker.
    pub done: Option<bool>,
    /// Alternate final-text field some server builds use.
    pub response: Option<String>,
    pub conversation_id: Option<String>,
    /// RFC 3339 completion time as sent by the server.
    pub timestamp: Option<String>,
    #[serde(default)]
    pub source_references: Vec<String>,
}

impl StreamPayload {
    /// Parse one record payload. Failures are recoverable: the caller logs
    /// and skips the record, the stream continues.
    pub fn parse(data: &str) -> Result<Self, ChatError> {
        serde_json::from_str(data)
            .map_err(|e| ChatError::Payload(format!("failed to parse record payload: {e}")))
    }

    /// Classify this payload into its stream-level meaning.
    pub fn classify(&self) -> PayloadClass {
        if let Some(error) = &self.error {
            return PayloadClass::ServerError(error.clone());
        }
        if let Some(token) = &self.token {
            let accumulated = self.message.clone().unwrap_or_else(|| token.clone());
            return PayloadClass::Token {
                token: token.clone(),
                accumulated,
            };
        }
        if self.done == Some(true) {
            return PayloadClass::Completion(self.completion());
        }
        PayloadClass::Ignored
    }

    fn completion(&self) -> ChatCompletion {
        ChatCompletion {
            message: self
                .message
                .clone()
                .or_else(|| self.response.clone())
                .unwrap_or_default(),
            conversation_id: self.conversation_id.clone(),
            timestamp: self.parsed_timestamp(),
            source_references: self.source_references.clone(),
        }
    }

    /// Lenient timestamp parse: unparseable or absent values become `None`.
    fn parsed_timestamp(&self) -> Option<DateTime<Utc>> {
        let raw = self.timestamp.as_deref()?;
        match DateTime::parse_from_rfc3339(raw) {
            Ok(ts) => Some(ts.with_timezone(&Utc)),
            Err(e) => {
                tracing::debug!("ignoring unparseable completion timestamp {raw:?}: {e}");
                None
            }
        }
    }
}

/// Stream-level meaning of one payload.
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadClass {
    /// Terminal failure reported by the server.
    ServerError(String),
    /// One partial token with the accumulated text so far.
    Token { token: String, accumulated: String },
    /// Terminal success.
    Completion(ChatCompletion),
    /// Recognized framing, no stream-level meaning.
    Ignored,
}
