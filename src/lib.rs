//! labchat
//!
//! Streaming chat client for the lab community site. Submits a prompt to the
//! site's chat endpoint, incrementally decodes the newline-delimited response
//! feed, and delivers partial/complete/error notifications either as a
//! `Stream` of events or through a caller-supplied [`ChatObserver`].
#![deny(unsafe_code)]

pub mod auth;
pub mod client;
pub mod error;
pub mod http;
pub mod observer;
pub mod streaming;
pub mod types;

pub use client::{CancelHandle, StreamingChatClient, StreamingChatClientBuilder};
pub use error::ChatError;
pub use observer::ChatObserver;
pub use types::{ChatCompletion, ChatRequest, ChatStream, ChatStreamEvent, ChatStreamHandle};
