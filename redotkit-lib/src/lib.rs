//! Redotkit library.
//!
//! Client side of the payment gateway's secure request envelope. Every
//! outbound payload is signed with the merchant's RSA key and encrypted under
//! a fresh AES-128-GCM key that is wrapped for the gateway with RSA-OAEP.
//! The gateway's reply is decrypted with the same AES key.
//!
//! The crate stays transport-agnostic and delegates network and key-value
//! access to callers through trait-based dependency injection.
//!
//! # Layers
//!
//! - [`keys`]: PEM import of the signing/wrapping keys, ephemeral AES keys
//! - [`envelope`]: `sign`, `encrypt`, `decrypt`
//! - [`orchestrator`]: one full request cycle over a [`Transport`]
//! - [`client`] and [`api`]: session lifecycle and typed payment endpoints
//!
//! # Example
//!
//! ```ignore
//! use redotkit_lib::{RedotClient, RedotConfig, InMemorySessionStore};
//! use redotkit_lib::api::PreOrderParams;
//!
//! let config = RedotConfig::from_env()?;
//! let transport = redotkit_lib::HttpTransport::new(&config)?;
//! let mut client = RedotClient::new(config, transport, InMemorySessionStore::new())?;
//!
//! let order = client
//!     .get_pre_order_info(&PreOrderParams::new("ABC123"))
//!     .await?;
//! println!("amount due: {} {}", order.order_amount, order.order_currency);
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod envelope;
pub mod errors;
pub mod keys;
pub mod orchestrator;
pub mod prelude;
pub mod session;
pub mod store;
pub mod transport;

/// Test utilities for envelope and orchestrator testing.
///
/// This module is only available with the `test-utils` feature or in test builds.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use client::RedotClient;
pub use config::{ApiRoutes, Language, RedotConfig};
pub use envelope::{RequestEnvelope, ResponseEnvelope, SealedRequest};
pub use errors::{RedotError, RedotErrorCode};
pub use keys::{SigningKey, SymmetricKey, VerifyingKey, WrappingKey};
pub use orchestrator::RequestOrchestrator;
pub use session::SessionContext;
pub use store::{InMemorySessionStore, SessionStore};
pub use transport::{check_business_code, RequestHeaders, Transport};

/// The reqwest-backed transport is only exposed with the `http-transport` feature.
#[cfg(feature = "http-transport")]
pub use transport::HttpTransport;

/// Common result alias for Redotkit operations.
pub type Result<T> = std::result::Result<T, RedotError>;

/// Current time as unix epoch milliseconds.
pub(crate) fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
