//! Credential Stores
//!
//! Bearer tokens are looked up through an injected [`CredentialStore`]
//! capability rather than ambient global state. Several storage locations
//! can be chained in a fixed priority order; an empty chain is a valid
//! state and simply means the caller is unauthenticated.

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::SecretString;
use tokio::sync::RwLock;

/// A source of the bearer token authorizing chat requests.
///
/// `get` returning `None` is not an error; the client maps it to
/// [`ChatError::Unauthenticated`](crate::error::ChatError::Unauthenticated)
/// before any network I/O happens.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up the current token, if any.
    async fn get(&self) -> Option<SecretString>;

    /// Store a new token. Read-only locations may ignore this.
    async fn set(&self, token: SecretString);

    /// Forget the stored token. Read-only locations may ignore this.
    async fn clear(&self);
}

/// In-process credential store (session-storage analog).
#[derive(Default)]
pub struct MemoryCredentialStore {
    token: RwLock<Option<SecretString>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(SecretString::from(token.into()))),
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn get(&self) -> Option<SecretString> {
        self.token.read().await.clone()
    }

    async fn set(&self, token: SecretString) {
        *self.token.write().await = Some(token);
    }

    async fn clear(&self) {
        *self.token.write().await = None;
    }
}

/// Read-only store backed by an environment variable.
pub struct EnvCredentialStore {
    var: String,
}

impl EnvCredentialStore {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

#[async_trait]
impl CredentialStore for EnvCredentialStore {
    async fn get(&self) -> Option<SecretString> {
        std::env::var(&self.var)
            .ok()
            .filter(|v| !v.is_empty())
            .map(SecretString::from)
    }

    async fn set(&self, _token: SecretString) {}

    async fn clear(&self) {}
}

/// Tries several stores in a fixed priority order.
///
/// `get` returns the first hit; `set` writes to the primary (first) store;
/// `clear` clears every store so a stale lower-priority token cannot
/// resurface.
pub struct ChainCredentialStore {
    stores: Vec<Arc<dyn CredentialStore>>,
}

impl ChainCredentialStore {
    pub fn new(stores: Vec<Arc<dyn CredentialStore>>) -> Self {
        Self { stores }
    }
}

#[async_trait]
impl CredentialStore for ChainCredentialStore {
    async fn get(&self) -> Option<SecretString> {
        for store in &self.stores {
            if let Some(token) = store.get().await {
                return Some(token);
            }
        }
        None
    }

    async fn set(&self, token: SecretString) {
        if let Some(primary) = self.stores.first() {
            primary.set(token).await;
        }
    }

    async fn clear(&self) {
        for store in &self.stores {
            store.clear().await;
        }
    }
}
