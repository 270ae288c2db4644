//! Per-session state for the request cycle.
//!
//! A [`SessionContext`] owns the imported key handles, the bearer token and
//! the signature of the most recent request. Keys are imported once, when
//! the context is built, and reused for every request of the session.

use std::fmt;

use zeroize::Zeroizing;

use crate::config::RedotConfig;
use crate::keys::{SigningKey, WrappingKey};
use crate::{RedotError, Result};

/// Session state consumed and updated by the orchestrator.
pub struct SessionContext {
    pre_order_id: String,
    bearer_token: Option<String>,
    signing_key_pem: Option<Zeroizing<String>>,
    signing_key: Option<SigningKey>,
    wrapping_key: WrappingKey,
    last_signature: Option<String>,
}

impl SessionContext {
    /// Create a session for `pre_order_id`, importing the gateway's public key.
    ///
    /// # Errors
    ///
    /// `KeyImport` if the PEM is not an RSA SPKI public key.
    pub fn new(pre_order_id: impl Into<String>, wrapping_key_pem: &str) -> Result<Self> {
        let wrapping_key = WrappingKey::from_pem(wrapping_key_pem)?;
        Ok(Self {
            pre_order_id: pre_order_id.into(),
            bearer_token: None,
            signing_key_pem: None,
            signing_key: None,
            wrapping_key,
            last_signature: None,
        })
    }

    /// Import the merchant signing key.
    ///
    /// # Errors
    ///
    /// `KeyImport` if the PEM is not an RSA PKCS#8 private key.
    pub fn with_signing_key_pem(mut self, pem: impl Into<String>) -> Result<Self> {
        let pem = Zeroizing::new(pem.into());
        self.signing_key = Some(SigningKey::from_pem(&pem)?);
        self.signing_key_pem = Some(pem);
        Ok(self)
    }

    /// Set the bearer token.
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.set_bearer_token(token);
        self
    }

    /// Build a session from the client configuration.
    pub fn from_config(config: &RedotConfig) -> Result<Self> {
        let mut session = Self::new(config.pre_order_id.clone(), &config.wrapping_key_pem)?;
        if let Some(pem) = &config.signing_key_pem {
            session = session.with_signing_key_pem(pem.clone())?;
        }
        if let Some(token) = &config.bearer_token {
            session.set_bearer_token(token.clone());
        }
        Ok(session)
    }

    /// Pre-order serial number.
    pub fn pre_order_id(&self) -> &str {
        &self.pre_order_id
    }

    /// Current bearer token, if any.
    pub fn bearer_token(&self) -> Option<&str> {
        self.bearer_token.as_deref()
    }

    /// Replace the bearer token.
    pub fn set_bearer_token(&mut self, token: impl Into<String>) {
        self.bearer_token = Some(token.into());
    }

    /// Drop the bearer token.
    pub fn clear_bearer_token(&mut self) {
        self.bearer_token = None;
    }

    /// True if a signing key was imported.
    pub fn has_signing_key(&self) -> bool {
        self.signing_key.is_some()
    }

    /// The signing key.
    ///
    /// # Errors
    ///
    /// `Signing` if the session was built without a private key.
    pub fn signing_key(&self) -> Result<&SigningKey> {
        self.signing_key
            .as_ref()
            .ok_or_else(|| RedotError::Signing("no signing key configured".to_string()))
    }

    /// The signing key PEM, if one was supplied.
    pub fn signing_key_pem(&self) -> Option<&str> {
        self.signing_key_pem.as_ref().map(|pem| pem.as_str())
    }

    /// The gateway's wrapping key.
    pub fn wrapping_key(&self) -> &WrappingKey {
        &self.wrapping_key
    }

    /// Signature of the most recent request of this session.
    pub fn last_signature(&self) -> Option<&str> {
        self.last_signature.as_deref()
    }

    pub(crate) fn record_signature(&mut self, signature: String) {
        self.last_signature = Some(signature);
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("pre_order_id", &self.pre_order_id)
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "[REDACTED]"))
            .field("signing_key", &self.signing_key.is_some())
            .field("wrapping_key_bits", &self.wrapping_key.bits())
            .field("last_signature", &self.last_signature.is_some())
            .finish()
    }
}
