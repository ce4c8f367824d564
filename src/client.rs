//! Streaming Chat Client
//!
//! Opens one HTTP request per exchange and turns the incrementally
//! delivered response body into chat events. The client is stateless
//! across calls: decoder and record buffer live inside one stream, so
//! concurrent `stream_chat` calls never share mutable state. It imposes
//! no cross-call exclusion; serializing exchanges per conversation (e.g.
//! disabling input while a stream is active) is the caller's job.

use std::sync::Arc;

use futures_util::StreamExt;
use secrecy::ExposeSecret;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::auth::{CredentialStore, MemoryCredentialStore};
use crate::error::ChatError;
use crate::http::HttpHeaderBuilder;
use crate::observer::ChatObserver;
use crate::streaming::{PayloadClass, RecordBuffer, StreamPayload, Utf8StreamDecoder, record_payload};
use crate::types::{ChatRequest, ChatStream, ChatStreamEvent, ChatStreamHandle};

/// Default relative path of the streaming chat endpoint.
pub const DEFAULT_STREAM_PATH: &str = "/api/chat/stream";

/// Wire shape of the request body.
#[derive(Serialize)]
struct StreamRequestBody<'a> {
    message: &'a str,
    conversation_id: Option<&'a str>,
}

/// A handle that can be used to request cancellation of a chat stream.
#[derive(Clone, Debug)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// Request cancellation. The wrapped stream stops as soon as possible;
    /// dropping it closes the underlying HTTP connection so the server
    /// stops generating tokens.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Check if cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Wrap a chat stream so it stops when the returned handle is cancelled.
fn make_cancellable_stream(stream: ChatStream) -> ChatStreamHandle {
    let cancel = CancelHandle::new();
    let token = cancel.token.clone();
    let mut inner = stream;
    let s = async_stream::stream! {
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                item = inner.next() => {
                    let Some(item) = item else { break };
                    yield item;
                }
            }
        }
    };
    ChatStreamHandle {
        stream: Box::pin(s),
        cancel,
    }
}

/// Client for the lab site's streaming chat endpoint.
pub struct StreamingChatClient {
    http: reqwest::Client,
    base_url: String,
    stream_path: String,
    credentials: Arc<dyn CredentialStore>,
}

impl StreamingChatClient {
    pub fn builder() -> StreamingChatClientBuilder {
        StreamingChatClientBuilder::new()
    }

    /// Open one exchange and return its event stream.
    ///
    /// Fails fast with [`ChatError::Unauthenticated`] when no credential is
    /// available, before any network I/O. A non-success HTTP status is
    /// terminal; the response body is not read.
    pub async fn stream_chat(&self, request: &ChatRequest) -> Result<ChatStream, ChatError> {
        if request.prompt.trim().is_empty() {
            return Err(ChatError::InvalidRequest("prompt must be non-empty".into()));
        }
        let token = self.credentials.get().await.ok_or_else(|| {
            ChatError::Unauthenticated("no bearer token in any credential store".into())
        })?;
        let headers = HttpHeaderBuilder::new()
            .with_bearer_auth(token.expose_secret())?
            .with_json_content_type()
            .build();
        let url = format!("{}{}", self.base_url, self.stream_path);
        let body = StreamRequestBody {
            message: &request.prompt,
            conversation_id: request.conversation_id.as_deref(),
        };

        tracing::debug!(conversation_id = ?request.conversation_id, "opening chat stream");
        let response = self
            .http
            .post(&url)
            .headers(headers)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChatError::Transport(format!("failed to send request: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChatError::Transport(format!("HTTP {status}")));
        }

        Ok(events_from_response(response))
    }

    /// Like [`stream_chat`](Self::stream_chat), with a cancellation handle.
    pub async fn stream_chat_with_cancel(
        &self,
        request: &ChatRequest,
    ) -> Result<ChatStreamHandle, ChatError> {
        let stream = self.stream_chat(request).await?;
        Ok(make_cancellable_stream(stream))
    }

    /// Drive one exchange into observer callbacks.
    ///
    /// Exactly one terminal callback (`on_complete` or `on_error`) fires
    /// per invocation; `on_token` calls precede it in byte-arrival order.
    pub async fn consume(&self, request: &ChatRequest, observer: &dyn ChatObserver) {
        let mut stream = match self.stream_chat(request).await {
            Ok(stream) => stream,
            Err(e) => {
                observer.on_error(&e.to_string());
                return;
            }
        };
        while let Some(item) = stream.next().await {
            match item {
                Ok(ChatStreamEvent::TokenDelta {
                    token,
                    accumulated,
                    raw,
                }) => observer.on_token(&token, &accumulated, &raw),
                Ok(ChatStreamEvent::Completed { completion }) => {
                    observer.on_complete(&completion);
                    return;
                }
                Err(e) => {
                    observer.on_error(&e.to_string());
                    return;
                }
            }
        }
        // The pipeline always ends with a terminal item; not reached.
        tracing::debug!("chat stream ended without a terminal event");
    }
}

/// Builder for [`StreamingChatClient`].
pub struct StreamingChatClientBuilder {
    base_url: Option<String>,
    stream_path: String,
    http: Option<reqwest::Client>,
    credentials: Option<Arc<dyn CredentialStore>>,
}

impl StreamingChatClientBuilder {
    fn new() -> Self {
        Self {
            base_url: None,
            stream_path: DEFAULT_STREAM_PATH.to_string(),
            http: None,
            credentials: None,
        }
    }

    /// Origin of the community site, e.g. `https://lab.example.org`.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Override the relative endpoint path (defaults to
    /// [`DEFAULT_STREAM_PATH`]).
    pub fn stream_path(mut self, path: impl Into<String>) -> Self {
        self.stream_path = path.into();
        self
    }

    /// Supply a preconfigured HTTP client (proxies, TLS settings).
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http = Some(client);
        self
    }

    /// Inject the credential source. Defaults to an empty in-memory store,
    /// i.e. unauthenticated until a token is set.
    pub fn credential_store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.credentials = Some(store);
        self
    }

    pub fn build(self) -> Result<StreamingChatClient, ChatError> {
        let base_url = self
            .base_url
            .ok_or_else(|| ChatError::InvalidRequest("base_url is required".into()))?;
        Ok(StreamingChatClient {
            http: self.http.unwrap_or_default(),
            base_url: base_url.trim_end_matches('/').to_string(),
            stream_path: self.stream_path,
            credentials: self
                .credentials
                .unwrap_or_else(|| Arc::new(MemoryCredentialStore::new())),
        })
    }
}

/// Turn a successful response into the event stream.
///
/// Terminal rule: the stream always ends with exactly one terminal item.
/// When the body closes without a terminal payload, a transport error is
/// synthesized instead of leaving the caller waiting on a feed that will
/// never finish.
fn events_from_response(response: reqwest::Response) -> ChatStream {
    let stream = async_stream::stream! {
        let mut bytes = response.bytes_stream();
        let mut decoder = Utf8StreamDecoder::new();
        let mut records = RecordBuffer::new();

        loop {
            let chunk = match bytes.next().await {
                Some(Ok(chunk)) => chunk,
                Some(Err(e)) => {
                    yield Err(ChatError::Transport(format!("stream read error: {e}")));
                    return;
                }
                None => break,
            };
            records.push(&decoder.decode(&chunk));
            while let Some(record) = records.next_record() {
                if let Some(event) = record_event(&record) {
                    let terminal = is_terminal(&event);
                    yield event;
                    if terminal {
                        return;
                    }
                }
            }
        }

        // End of body. The buffer can still hold one final record from a
        // server that omits the trailing newline.
        records.push(&decoder.flush());
        loop {
            let record = match records.next_record() {
                Some(record) => record,
                None => match records.take_remainder() {
                    Some(record) => record,
                    None => break,
                },
            };
            if let Some(event) = record_event(&record) {
                let terminal = is_terminal(&event);
                yield event;
                if terminal {
                    return;
                }
            }
        }

        tracing::debug!("response body closed before a terminal payload");
        yield Err(ChatError::Transport(
            "response stream closed before completion".into(),
        ));
    };
    Box::pin(stream)
}

fn is_terminal(event: &Result<ChatStreamEvent, ChatError>) -> bool {
    matches!(event, Err(_) | Ok(ChatStreamEvent::Completed { .. }))
}

/// Map one record to its stream event, if any.
///
/// Framing noise is discarded silently; a malformed payload is logged and
/// skipped without terminating the stream.
fn record_event(record: &str) -> Option<Result<ChatStreamEvent, ChatError>> {
    let data = match record_payload(record) {
        Some(data) => data,
        None => {
            if !record.is_empty() {
                tracing::trace!("discarding framing noise: {record:?}");
            }
            return None;
        }
    };
    let payload = match StreamPayload::parse(data) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!("skipping malformed record payload: {e}");
            return None;
        }
    };
    match payload.classify() {
        PayloadClass::ServerError(message) => Some(Err(ChatError::Server(message))),
        PayloadClass::Token { token, accumulated } => Some(Ok(ChatStreamEvent::TokenDelta {
            token,
            accumulated,
            raw: payload,
        })),
        PayloadClass::Completion(completion) => {
            Some(Ok(ChatStreamEvent::Completed { completion }))
        }
        PayloadClass::Ignored => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    fn builder_requires_base_url() {
        let result = StreamingChatClient::builder().build();
        assert!(matches!(result, Err(ChatError::InvalidRequest(_))));
    }

    #[test]
    fn builder_trims_trailing_slash() {
        let client = StreamingChatClient::builder()
            .base_url("https://lab.example.org/")
            .build()
            .unwrap();
        assert_eq!(client.base_url, "https://lab.example.org");
        assert_eq!(client.stream_path, DEFAULT_STREAM_PATH);
    }

    #[test]
    fn record_event_maps_token_and_completion() {
        let event = record_event(r#"data: {"token":"Hi","message":"Hi"}"#).unwrap();
        match event.unwrap() {
            ChatStreamEvent::TokenDelta {
                token, accumulated, ..
            } => {
                assert_eq!(token, "Hi");
                assert_eq!(accumulated, "Hi");
            }
            other => panic!("unexpected event: {other:?}"),
        }

        let event = record_event(r#"data: {"done":true,"message":"all done"}"#).unwrap();
        assert!(is_terminal(&event));
    }

    #[test]
    fn record_event_surfaces_server_error_as_terminal() {
        let event = record_event(r#"data: {"error":"model overloaded"}"#).unwrap();
        assert!(is_terminal(&event));
        assert!(matches!(event, Err(ChatError::Server(_))));
    }

    #[test]
    fn framing_noise_and_ignored_payloads_yield_nothing() {
        assert!(record_event("event: ping").is_none());
        assert!(record_event(": keep-alive").is_none());
        assert!(record_event("").is_none());
        assert!(record_event(r#"data: {"status":"thinking"}"#).is_none());
    }

    #[traced_test]
    #[test]
    fn malformed_payload_is_logged_and_skipped() {
        assert!(record_event("data: {not-json").is_none());
        assert!(logs_contain("skipping malformed record payload"));
    }

    #[test]
    fn request_body_wire_shape() {
        let body = StreamRequestBody {
            message: "hello",
            conversation_id: Some("c1"),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"message": "hello", "conversation_id": "c1"})
        );

        let body = StreamRequestBody {
            message: "hello",
            conversation_id: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"message": "hello", "conversation_id": null})
        );
    }
}
