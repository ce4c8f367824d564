//! Streaming Module
//!
//! Wire-level pipeline for the chat endpoint's incremental response feed:
//! - Stateful UTF-8 decoding across chunk boundaries
//! - Newline-delimited record framing with `data:` prefix filtering
//! - Payload parsing and classification

mod decoder;
mod framing;
mod payload;

pub use decoder::Utf8StreamDecoder;
pub use framing::{RecordBuffer, record_payload};
pub use payload::{PayloadClass, StreamPayload};
