//! One signed, encrypted request/response cycle.
//!
//! [`RequestOrchestrator::call_api`] runs, in order:
//!
//! 1. sign the payload with the session's signing key
//! 2. store the signature under [`SIGNATURE_KEY`] and on the session
//! 3. encrypt the payload under a fresh AES key wrapped for the gateway
//! 4. send the envelope with the session headers
//! 5. decrypt the reply with the request's AES key
//! 6. deserialize the plaintext JSON
//!
//! The first failing step aborts the cycle and its error is returned as is.
//! Nothing is retried here; a retry is a new `call_api` with a new key and IV.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::Language;
use crate::envelope::{self, ResponseEnvelope};
use crate::session::SessionContext;
use crate::store::{SessionStore, BEARER_TOKEN_KEY, LANGUAGE_KEY, SIGNATURE_KEY};
use crate::transport::{RequestHeaders, Transport};
use crate::{now_millis, RedotError, Result};

/// Drives request cycles over a transport and a session store.
pub struct RequestOrchestrator<T, S> {
    transport: T,
    store: S,
    default_language: Language,
}

impl<T: Transport, S: SessionStore> RequestOrchestrator<T, S> {
    /// Create an orchestrator.
    pub fn new(transport: T, store: S) -> Self {
        Self {
            transport,
            store,
            default_language: Language::default(),
        }
    }

    /// Language used while the store holds no preference.
    pub fn with_default_language(mut self, language: Language) -> Self {
        self.default_language = language;
        self
    }

    /// The transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The session store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Sign, encrypt and send `payload` to `url`, then decrypt the reply.
    ///
    /// Taking the session mutably serializes calls on one session: the
    /// stored signature always belongs to the request in flight.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            skip(self, payload, session),
            fields(pre_order_id = %session.pre_order_id())
        )
    )]
    pub async fn call_api<P, R>(
        &self,
        url: &str,
        payload: &P,
        session: &mut SessionContext,
    ) -> Result<R>
    where
        P: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let signature = envelope::sign(payload, session.signing_key()?)?;
        self.store.set(SIGNATURE_KEY, &signature).await?;
        session.record_signature(signature);

        let sealed = envelope::encrypt(payload, session.wrapping_key())?;
        let body = serde_json::to_value(&sealed.envelope)
            .map_err(|e| RedotError::Encryption(format!("envelope serialization failed: {}", e)))?;

        let headers = self.headers(session).await?;
        let reply = self.transport.send(url, body, &headers).await?;

        let response: ResponseEnvelope = serde_json::from_value(reply)
            .map_err(|e| RedotError::ResponseFormat(format!("not a response envelope: {}", e)))?;
        let plaintext = sealed.open(&response)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(len = plaintext.len(), "response decrypted");

        serde_json::from_str(&plaintext)
            .map_err(|e| RedotError::ResponseFormat(format!("unexpected response payload: {}", e)))
    }

    /// Headers for the next request.
    ///
    /// The signature is read back from the store so the header always
    /// reflects what was persisted. The session's bearer token wins over a
    /// stored one.
    async fn headers(&self, session: &SessionContext) -> Result<RequestHeaders> {
        let stored_token = match session.bearer_token() {
            Some(_) => None,
            None => self.store.get(BEARER_TOKEN_KEY).await?,
        };
        let bearer = session.bearer_token().or(stored_token.as_deref());
        let signature = self.store.get(SIGNATURE_KEY).await?;
        let language = match self.store.get(LANGUAGE_KEY).await? {
            Some(stored) if !stored.is_empty() => Language::from_stored(Some(&stored)),
            _ => self.default_language,
        };

        Ok(RequestHeaders::build(
            bearer,
            signature.as_deref(),
            language,
            now_millis(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemorySessionStore;
    use crate::test_utils::{fixtures, EchoTransport};
    use serde_json::{json, Value};

    #[tokio::test]
    async fn test_echo_cycle_returns_payload() {
        let orchestrator =
            RequestOrchestrator::new(EchoTransport::new(), InMemorySessionStore::new());
        let mut session = fixtures::test_session();

        let reply: Value = orchestrator
            .call_api("/echo", &json!({"sn": "X1"}), &mut session)
            .await
            .unwrap();

        assert_eq!(reply, json!({"sn": "X1"}));
    }

    #[tokio::test]
    async fn test_missing_signing_key_aborts_before_send() {
        let transport = EchoTransport::new();
        let orchestrator = RequestOrchestrator::new(transport, InMemorySessionStore::new());
        let mut session = SessionContext::new("P-1", fixtures::GATEWAY_PUBLIC_PEM).unwrap();

        let err = orchestrator
            .call_api::<_, Value>("/echo", &json!({"sn": "X1"}), &mut session)
            .await
            .unwrap_err();

        assert!(matches!(err, RedotError::Signing(_)));
        assert_eq!(orchestrator.transport().calls(), 0);
        assert!(orchestrator.store().is_empty());
    }
}
