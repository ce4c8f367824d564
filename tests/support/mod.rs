//! Shared test support: a recording observer and a chunk-streaming dev server.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::HeaderValue;
use axum::response::Response;
use axum::{Router, routing::post};

use labchat::auth::MemoryCredentialStore;
use labchat::streaming::StreamPayload;
use labchat::{ChatCompletion, ChatObserver, StreamingChatClient};

/// One observer callback, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum Callback {
    Token { token: String, accumulated: String },
    Complete(ChatCompletion),
    Error(String),
}

/// Observer that records every callback for later assertions.
#[derive(Default)]
pub struct RecordingObserver {
    calls: Mutex<Vec<Callback>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Callback> {
        self.calls.lock().unwrap().clone()
    }

    pub fn tokens(&self) -> Vec<(String, String)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Callback::Token { token, accumulated } => Some((token, accumulated)),
                _ => None,
            })
            .collect()
    }

    pub fn completions(&self) -> Vec<ChatCompletion> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Callback::Complete(completion) => Some(completion),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Callback::Error(message) => Some(message),
                _ => None,
            })
            .collect()
    }
}

impl ChatObserver for RecordingObserver {
    fn on_token(&self, token: &str, accumulated: &str, _raw: &StreamPayload) {
        self.calls.lock().unwrap().push(Callback::Token {
            token: token.into(),
            accumulated: accumulated.into(),
        });
    }

    fn on_complete(&self, completion: &ChatCompletion) {
        self.calls
            .lock()
            .unwrap()
            .push(Callback::Complete(completion.clone()));
    }

    fn on_error(&self, message: &str) {
        self.calls
            .lock()
            .unwrap()
            .push(Callback::Error(message.into()));
    }
}

/// Spawn a dev server that streams the given byte chunks from the chat
/// endpoint, pausing briefly between chunks, then closes the body.
pub async fn spawn_stream_server(chunks: Vec<Vec<u8>>) -> String {
    let app = Router::new().route(
        "/api/chat/stream",
        post(move || {
            let chunks = chunks.clone();
            async move {
                let stream = async_stream::stream! {
                    for chunk in chunks {
                        yield Ok::<Bytes, std::io::Error>(Bytes::from(chunk));
                        tokio::time::sleep(Duration::from_millis(5)).await;
                    }
                };
                Response::builder()
                    .header(
                        "content-type",
                        HeaderValue::from_static("application/x-ndjson"),
                    )
                    .body(Body::from_stream(stream))
                    .unwrap()
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{addr}")
}

/// Build a client for `base_url` authenticated with `token`.
pub fn authed_client(base_url: &str, token: &str) -> StreamingChatClient {
    StreamingChatClient::builder()
        .base_url(base_url)
        .credential_store(Arc::new(MemoryCredentialStore::with_token(token)))
        .build()
        .unwrap()
}
