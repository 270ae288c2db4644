//! Test utilities for Redotkit.
//!
//! This module provides:
//! - Fixture RSA keys and ready-made sessions
//! - An echo transport that reflects the request ciphertext
//! - A gateway simulator that unwraps, verifies and re-encrypts
//! - A scripted transport with canned replies and failures
//!
//! ## Usage
//!
//! ```rust,ignore
//! use redotkit_lib::test_utils::{fixtures, EchoTransport};
//! use redotkit_lib::{InMemorySessionStore, RequestOrchestrator};
//!
//! let orchestrator = RequestOrchestrator::new(EchoTransport::new(), InMemorySessionStore::new());
//! let mut session = fixtures::test_session();
//! let reply: serde_json::Value = orchestrator
//!     .call_api("/echo", &serde_json::json!({"sn": "X1"}), &mut session)
//!     .await?;
//! ```

pub mod fixtures;
mod mock_transport;

pub use fixtures::{test_config, test_session};
pub use mock_transport::{EchoTransport, GatewaySimulator, RecordedRequest, ScriptedTransport};
