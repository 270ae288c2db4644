//! Fixture keys and pre-built sessions.
//!
//! All RSA fixtures are 2048-bit. The client pair signs requests, the
//! gateway pair wraps request keys, and the "other" pair is an unrelated
//! key for negative tests.

use crate::config::RedotConfig;
use crate::session::SessionContext;

/// Base URL used by [`test_config`].
pub const TEST_BASE_URL: &str = "https://gateway.test";

/// Pre-order id used by [`test_config`].
pub const TEST_PRE_ORDER_ID: &str = "ABC123";

/// Merchant private key (PKCS#8).
pub const CLIENT_PRIVATE_PEM: &str = include_str!("keys/client_private.pem");
/// Merchant public key (SPKI).
pub const CLIENT_PUBLIC_PEM: &str = include_str!("keys/client_public.pem");
/// Gateway private key (PKCS#8), used to unwrap request keys.
pub const GATEWAY_PRIVATE_PEM: &str = include_str!("keys/gateway_private.pem");
/// Gateway public key (SPKI).
pub const GATEWAY_PUBLIC_PEM: &str = include_str!("keys/gateway_public.pem");
/// Unrelated private key (PKCS#8).
pub const OTHER_PRIVATE_PEM: &str = include_str!("keys/other_private.pem");
/// Unrelated public key (SPKI).
pub const OTHER_PUBLIC_PEM: &str = include_str!("keys/other_public.pem");
/// P-256 private key, not RSA.
pub const EC_PRIVATE_PEM: &str = include_str!("keys/ec_private.pem");

/// Configuration with the fixture keys and no bearer token.
pub fn test_config() -> RedotConfig {
    RedotConfig::new(TEST_BASE_URL, GATEWAY_PUBLIC_PEM)
        .with_signing_key(CLIENT_PRIVATE_PEM)
        .with_pre_order_id(TEST_PRE_ORDER_ID)
}

/// Session built from [`test_config`].
///
/// # Panics
///
/// Panics if the fixture keys fail to import.
pub fn test_session() -> SessionContext {
    SessionContext::from_config(&test_config()).expect("fixture keys import")
}
