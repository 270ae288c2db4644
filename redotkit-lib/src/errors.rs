//! Error types for Redotkit operations.
//!
//! Every failure of a request cycle surfaces as exactly one [`RedotError`]
//! variant, and the orchestrator propagates it unchanged. Callers decide on
//! user-facing messaging and retry policy; a retry must always be a fresh
//! `call_api` (new IV, new AES key), never a replay of an old envelope.

use std::fmt;

/// Error codes for FFI and mobile integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum RedotErrorCode {
    /// Malformed or incompatible PEM / raw key material
    KeyImport = 1000,
    /// Signing invocation failed
    Signing = 2000,
    /// Signature did not verify
    SignatureInvalid = 2001,
    /// Envelope encryption failed
    Encryption = 3000,
    /// Envelope decryption / tag verification failed
    Decryption = 3001,
    /// Decrypted response is not the expected JSON
    ResponseFormat = 4000,
    /// Transport/network layer error
    Transport = 5000,
    /// Transport timeout
    ConnectionTimeout = 5001,
    /// Gateway answered with a non-success business code
    Api = 6000,
    /// Session store error
    Storage = 7000,
    /// Invalid configuration
    Config = 8000,
}

/// Comprehensive error type for Redotkit operations.
#[derive(Debug)]
pub enum RedotError {
    /// A PEM or raw key could not be imported.
    KeyImport {
        /// Which key failed (e.g., "signing key", "wrapping key")
        key_type: String,
        /// Reason for the failure
        reason: String,
    },

    /// Signing failed (missing key, serialization or RSA failure).
    Signing(String),

    /// A signature did not verify against the given public key.
    SignatureInvalid,

    /// Encryption failed (missing wrapping key, serialization, RSA or AES failure).
    Encryption(String),

    /// Decryption failed.
    ///
    /// Deliberately carries no detail: tag mismatch, corrupted ciphertext,
    /// wrong key and malformed fields are indistinguishable to the caller.
    Decryption,

    /// The decrypted response (or the transport reply) has an unexpected shape.
    ResponseFormat(String),

    /// Transport/network layer error.
    Transport(String),

    /// Transport timeout.
    ConnectionTimeout {
        /// Operation that timed out
        operation: String,
        /// Timeout duration in milliseconds
        timeout_ms: u64,
    },

    /// The gateway rejected the request with a business error code.
    Api {
        /// Code returned by the gateway
        code: String,
        /// Message returned by the gateway
        message: String,
    },

    /// Session store operation failed.
    Storage(String),

    /// Invalid configuration value.
    Config {
        /// Field or environment variable name
        field: String,
        /// Reason for invalidity
        reason: String,
    },
}

impl RedotError {
    /// Get the error code for FFI/mobile integration.
    pub fn code(&self) -> RedotErrorCode {
        match self {
            Self::KeyImport { .. } => RedotErrorCode::KeyImport,
            Self::Signing(_) => RedotErrorCode::Signing,
            Self::SignatureInvalid => RedotErrorCode::SignatureInvalid,
            Self::Encryption(_) => RedotErrorCode::Encryption,
            Self::Decryption => RedotErrorCode::Decryption,
            Self::ResponseFormat(_) => RedotErrorCode::ResponseFormat,
            Self::Transport(_) => RedotErrorCode::Transport,
            Self::ConnectionTimeout { .. } => RedotErrorCode::ConnectionTimeout,
            Self::Api { .. } => RedotErrorCode::Api,
            Self::Storage(_) => RedotErrorCode::Storage,
            Self::Config { .. } => RedotErrorCode::Config,
        }
    }

    /// Get the error message as an owned String (useful for FFI).
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Returns true if a fresh `call_api` may succeed where this one failed.
    ///
    /// Only transport-class failures qualify. Crypto failures are
    /// deterministic for their inputs and are never worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::ConnectionTimeout { .. })
    }

    /// Returns a suggested retry delay in milliseconds, if applicable.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            Self::ConnectionTimeout { .. } => Some(1000),
            Self::Transport(_) => Some(1000),
            _ => None,
        }
    }

    /// Create a key import error.
    pub fn key_import(key_type: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::KeyImport {
            key_type: key_type.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Config {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for RedotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KeyImport { key_type, reason } => {
                write!(f, "failed to import {}: {}", key_type, reason)
            }
            Self::Signing(msg) => write!(f, "signing failed: {}", msg),
            Self::SignatureInvalid => write!(f, "signature verification failed"),
            Self::Encryption(msg) => write!(f, "encryption failed: {}", msg),
            Self::Decryption => write!(f, "decryption failed"),
            Self::ResponseFormat(msg) => write!(f, "unexpected response format: {}", msg),
            Self::Transport(msg) => write!(f, "transport error: {}", msg),
            Self::ConnectionTimeout {
                operation,
                timeout_ms,
            } => {
                write!(f, "{} timed out after {}ms", operation, timeout_ms)
            }
            Self::Api { code, message } => {
                write!(f, "gateway rejected request ({}): {}", code, message)
            }
            Self::Storage(msg) => write!(f, "storage error: {}", msg),
            Self::Config { field, reason } => write!(f, "invalid {}: {}", field, reason),
        }
    }
}

impl std::error::Error for RedotError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = RedotError::ConnectionTimeout {
            operation: "POST /order".to_string(),
            timeout_ms: 10_000,
        };
        assert_eq!(err.code(), RedotErrorCode::ConnectionTimeout);
        assert!(err.is_retryable());
        assert_eq!(err.retry_after_ms(), Some(1000));
    }

    #[test]
    fn test_crypto_errors_not_retryable() {
        for err in [
            RedotError::Decryption,
            RedotError::Signing("no key".into()),
            RedotError::Encryption("no key".into()),
            RedotError::ResponseFormat("not json".into()),
        ] {
            assert!(!err.is_retryable(), "{err} must not be retryable");
            assert_eq!(err.retry_after_ms(), None);
        }
    }

    #[test]
    fn test_decryption_display_has_no_detail() {
        assert_eq!(RedotError::Decryption.to_string(), "decryption failed");
    }

    #[test]
    fn test_helper_constructors() {
        let err = RedotError::key_import("wrapping key", "not an RSA key");
        assert_eq!(err.code(), RedotErrorCode::KeyImport);
        assert!(err.to_string().contains("wrapping key"));

        let err = RedotError::config("REDOT_LANG", "unsupported language");
        assert_eq!(err.code(), RedotErrorCode::Config);
    }
}
