//! Session key-value store.
//!
//! The store is the edge where per-request values meet the transport layer:
//! the orchestrator writes the latest request signature here and reads it
//! back when building headers. Values are opaque strings.
//!
//! # Thread Safety
//!
//! [`InMemorySessionStore`] uses `RwLock` for thread-safe access. Lock
//! poisoning is handled gracefully by returning an error rather than
//! panicking.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::{RedotError, Result};

/// Store key holding the signature of the most recent request.
pub const SIGNATURE_KEY: &str = "SIGN";

/// Store key holding the bearer token.
pub const BEARER_TOKEN_KEY: &str = "JWT_TOKEN";

/// Store key holding the UI language (`en` or anything else for `zh`).
pub const LANGUAGE_KEY: &str = "APP_LANGUAGE";

/// Key-value store for session values consumed by the transport layer.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Read a value, `None` if absent.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, overwriting any previous one.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a value. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;
}

#[async_trait]
impl<S: SessionStore + ?Sized> SessionStore for Arc<S> {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key).await
    }
}

/// In-memory session store.
///
/// Values are lost when the process exits, which is what the signature and
/// token entries want in most embeddings.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    values: RwLock<HashMap<String, String>>,
}

/// Helper function to handle lock poisoning gracefully.
fn lock_error(context: &str) -> RedotError {
    RedotError::Storage(format!(
        "InMemorySessionStore: lock poisoned during {}",
        context
    ))
}

impl InMemorySessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of stored values.
    ///
    /// Returns 0 if the lock is poisoned.
    pub fn len(&self) -> usize {
        self.values.read().map(|v| v.len()).unwrap_or(0)
    }

    /// Check if the store is empty.
    ///
    /// Returns true if the lock is poisoned.
    pub fn is_empty(&self) -> bool {
        self.values.read().map(|v| v.is_empty()).unwrap_or(true)
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self.values.read().map_err(|_| lock_error("get"))?;
        Ok(values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.write().map_err(|_| lock_error("set"))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut values = self.values.write().map_err(|_| lock_error("remove"))?;
        values.remove(key);
        Ok(())
    }
}
