//! Chat Observer
//!
//! Callback port for UI layers that prefer push-style delivery over driving
//! a `Stream` themselves. See [`StreamingChatClient::consume`].
//!
//! [`StreamingChatClient::consume`]: crate::client::StreamingChatClient::consume

use crate::streaming::StreamPayload;
use crate::types::ChatCompletion;

/// Observer for one chat stream.
///
/// For every `consume` call that passes request validation, exactly one of
/// `on_complete` / `on_error` fires, after zero or more `on_token` calls.
/// Callbacks fire on the driving task in byte-arrival order.
pub trait ChatObserver: Send + Sync {
    /// A partial token arrived. `accumulated` is the server-reported text so
    /// far; `raw` is the full wire payload the token came from.
    fn on_token(&self, token: &str, accumulated: &str, raw: &StreamPayload);

    /// Terminal success.
    fn on_complete(&self, completion: &ChatCompletion);

    /// Terminal failure. The message is human-readable and suitable for a
    /// retryable failure notice.
    fn on_error(&self, message: &str);
}
