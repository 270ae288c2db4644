//! Transport seam.
//!
//! The library never opens sockets on its own. A [`Transport`] receives the
//! target URL, the JSON request body and the [`RequestHeaders`] built for the
//! request, and returns the JSON reply.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::Language;
use crate::{RedotError, Result};

#[cfg(feature = "http-transport")]
mod http;

#[cfg(feature = "http-transport")]
pub use http::HttpTransport;

/// Business code the gateway uses for accepted requests.
pub const SUCCESS_CODE: &str = "SUCCESS";

/// Sends one JSON request and returns the JSON reply.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST `body` to `url` with `headers`.
    async fn send(&self, url: &str, body: Value, headers: &RequestHeaders) -> Result<Value>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, url: &str, body: Value, headers: &RequestHeaders) -> Result<Value> {
        (**self).send(url, body, headers).await
    }
}

/// Ordered set of request headers.
///
/// Names compare case-insensitively; inserting an existing name replaces
/// its value in place.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct RequestHeaders {
    entries: Vec<(String, String)>,
}

impl RequestHeaders {
    /// `Authorization: Bearer <token>`.
    pub const AUTHORIZATION: &'static str = "Authorization";
    /// Raw bearer token.
    pub const SESSION_TOKEN: &'static str = "X-SToken";
    /// Signature of the request payload.
    pub const SIGNATURE: &'static str = "X-R-Signature";
    /// Request time, unix epoch milliseconds.
    pub const TIMESTAMP: &'static str = "X-R-Ts";
    /// `en` or `zh`.
    pub const LANG: &'static str = "Lang";

    /// Empty header set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Headers for one gateway request.
    ///
    /// Token and signature headers are omitted when absent or empty.
    pub fn build(
        bearer_token: Option<&str>,
        signature: Option<&str>,
        language: Language,
        timestamp_ms: u64,
    ) -> Self {
        let mut headers = Self::new();
        if let Some(token) = bearer_token.filter(|t| !t.is_empty()) {
            headers.insert(Self::AUTHORIZATION, format!("Bearer {}", token));
            headers.insert(Self::SESSION_TOKEN, token);
        }
        if let Some(signature) = signature.filter(|s| !s.is_empty()) {
            headers.insert(Self::SIGNATURE, signature);
        }
        headers.insert(Self::LANG, language.as_str());
        headers.insert(Self::TIMESTAMP, timestamp_ms.to_string());
        headers
    }

    /// Insert or replace a header.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .entries
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(&name))
        {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Look up a header value.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Number of headers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no header is set.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for RequestHeaders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (name, value) in &self.entries {
            let sensitive = [Self::AUTHORIZATION, Self::SESSION_TOKEN, Self::SIGNATURE]
                .iter()
                .any(|s| s.eq_ignore_ascii_case(name));
            if sensitive {
                map.entry(name, &"[REDACTED]");
            } else {
                map.entry(name, value);
            }
        }
        map.finish()
    }
}

/// Reject replies whose `code` is set to anything but `SUCCESS`.
///
/// A missing, null, `false`, zero or empty `code` counts as unset and the
/// body passes through untouched.
pub fn check_business_code(body: Value) -> Result<Value> {
    let code = match body.get("code") {
        None | Some(Value::Null) | Some(Value::Bool(false)) => return Ok(body),
        Some(Value::String(s)) if s.is_empty() || s == SUCCESS_CODE => return Ok(body),
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => return Ok(body),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };
    let message = match body.get("msg") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };
    Err(RedotError::Api { code, message })
}
