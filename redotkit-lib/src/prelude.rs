//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types and traits for
//! quick setup. Import everything with:
//!
//! ```rust,ignore
//! use redotkit_lib::prelude::*;
//! ```
//!
//! ## What's Included
//!
//! - Client: `RedotClient`, `RedotConfig`, `Language`, `ApiRoutes`
//! - Envelope: `sign`, `verify_signature`, `encrypt`, `decrypt`
//! - Keys: `SigningKey`, `VerifyingKey`, `WrappingKey`, `SymmetricKey`
//! - Error types: `RedotError`, `RedotErrorCode`, `Result`
//! - Collaborator traits: `Transport`, `SessionStore`

// Client
pub use crate::client::RedotClient;
pub use crate::config::{ApiRoutes, Language, RedotConfig};
pub use crate::orchestrator::RequestOrchestrator;
pub use crate::session::SessionContext;

// Envelope
pub use crate::envelope::{
    decrypt, encrypt, sign, verify_signature, RequestEnvelope, ResponseEnvelope, SealedRequest,
};
pub use crate::keys::{SigningKey, SymmetricKey, VerifyingKey, WrappingKey};

// Error handling
pub use crate::errors::{RedotError, RedotErrorCode};
pub use crate::Result;

// Collaborators
pub use crate::store::{InMemorySessionStore, SessionStore};
pub use crate::transport::{RequestHeaders, Transport};

#[cfg(feature = "http-transport")]
pub use crate::transport::HttpTransport;

// Payment API
pub use crate::api::{
    BindTxHashParams, PaymentOrderParams, PaymentOrderStatusParams, PaymentStatus,
    PreOrderParams, QrcodeStatusParams,
};
