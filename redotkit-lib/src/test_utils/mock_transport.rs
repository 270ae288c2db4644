//! In-process transports for exercising the request cycle.

use std::collections::VecDeque;
use std::sync::{Mutex, RwLock};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use rsa::pkcs8::DecodePrivateKey;
use rsa::{Oaep, RsaPrivateKey};
use serde_json::{json, Value};
use sha2::Sha256;
use zeroize::Zeroizing;

use super::fixtures;
use crate::envelope::{self, RequestEnvelope};
use crate::keys::{pem_to_der, SymmetricKey, VerifyingKey};
use crate::transport::{RequestHeaders, Transport};
use crate::{RedotError, Result};

/// A request as seen by a mock transport.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Target URL.
    pub url: String,
    /// Headers sent with the request.
    pub headers: RequestHeaders,
    /// Raw JSON body (the request envelope).
    pub body: Value,
    /// Decrypted payload, when the transport could decrypt it.
    pub payload: Option<Value>,
    /// Whether `X-R-Signature` verified over the decrypted payload.
    /// `None` if no signature header was sent or nothing was decrypted.
    pub signature_valid: Option<bool>,
}

fn lock_error(context: &str) -> RedotError {
    RedotError::Transport(format!("mock transport: lock poisoned during {}", context))
}

#[derive(Debug, Default)]
struct Recorder {
    requests: RwLock<Vec<RecordedRequest>>,
}

impl Recorder {
    fn push(&self, request: RecordedRequest) -> Result<()> {
        self.requests
            .write()
            .map_err(|_| lock_error("record"))?
            .push(request);
        Ok(())
    }

    fn all(&self) -> Vec<RecordedRequest> {
        self.requests.read().map(|r| r.clone()).unwrap_or_default()
    }

    fn last(&self) -> Option<RecordedRequest> {
        self.requests.read().ok().and_then(|r| r.last().cloned())
    }

    fn len(&self) -> usize {
        self.requests.read().map(|r| r.len()).unwrap_or(0)
    }
}

/// Replies with the request's own ciphertext.
///
/// The response envelope is the request envelope minus `encryptedAesKey`,
/// so it decrypts under the request's AES key to the original payload.
#[derive(Debug, Default)]
pub struct EchoTransport {
    recorder: Recorder,
    tag_edit: Option<TagEdit>,
}

#[derive(Debug, Clone, Copy)]
enum TagEdit {
    FlipBit,
    ReplaceChar(usize),
}

impl EchoTransport {
    /// Echo transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Echo transport that flips one bit of the tag in every reply.
    pub fn corrupting_tag() -> Self {
        Self {
            tag_edit: Some(TagEdit::FlipBit),
            ..Self::default()
        }
    }

    /// Echo transport that swaps the base64 character at `position` of the
    /// reply tag for another alphabet character.
    pub fn replacing_tag_char(position: usize) -> Self {
        Self {
            tag_edit: Some(TagEdit::ReplaceChar(position)),
            ..Self::default()
        }
    }

    /// Number of requests received.
    pub fn calls(&self) -> usize {
        self.recorder.len()
    }

    /// All requests received, oldest first.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.recorder.all()
    }

    /// Headers of the most recent request.
    pub fn last_headers(&self) -> Option<RequestHeaders> {
        self.recorder.last().map(|r| r.headers)
    }

    /// URL of the most recent request.
    pub fn last_url(&self) -> Option<String> {
        self.recorder.last().map(|r| r.url)
    }

    /// Body of the most recent request.
    pub fn last_body(&self) -> Option<Value> {
        self.recorder.last().map(|r| r.body)
    }
}

#[async_trait]
impl Transport for EchoTransport {
    async fn send(&self, url: &str, body: Value, headers: &RequestHeaders) -> Result<Value> {
        let request: RequestEnvelope = serde_json::from_value(body.clone())
            .map_err(|e| RedotError::Transport(format!("echo: not a request envelope: {}", e)))?;

        let mut response = request.to_response();
        match self.tag_edit {
            Some(TagEdit::FlipBit) => {
                let mut tag = BASE64
                    .decode(&response.tag)
                    .map_err(|e| RedotError::Transport(format!("echo: bad tag: {}", e)))?;
                if let Some(first) = tag.first_mut() {
                    *first ^= 0x01;
                }
                response.tag = BASE64.encode(tag);
            }
            Some(TagEdit::ReplaceChar(position)) => {
                response.tag = response
                    .tag
                    .char_indices()
                    .map(|(i, c)| match (i == position, c) {
                        (true, 'A') => 'B',
                        (true, _) => 'A',
                        (false, c) => c,
                    })
                    .collect();
            }
            None => {}
        }

        self.recorder.push(RecordedRequest {
            url: url.to_string(),
            headers: headers.clone(),
            body,
            payload: None,
            signature_valid: None,
        })?;

        serde_json::to_value(response)
            .map_err(|e| RedotError::Transport(format!("echo: {}", e)))
    }
}

type Handler = Box<dyn Fn(&Value) -> Value + Send + Sync>;

/// Plays the gateway's side of the envelope.
///
/// Unwraps the AES key with the gateway private key, decrypts the payload,
/// checks `X-R-Signature` against the merchant public key, then encrypts the
/// handler's reply under the same AES key.
pub struct GatewaySimulator {
    private_key: RsaPrivateKey,
    client_key: VerifyingKey,
    handler: Handler,
    recorder: Recorder,
}

impl GatewaySimulator {
    /// Simulator with the fixture gateway and client keys that echoes the
    /// decrypted payload.
    ///
    /// # Panics
    ///
    /// Panics if the fixture keys fail to import.
    pub fn new() -> Self {
        Self::from_pems(fixtures::GATEWAY_PRIVATE_PEM, fixtures::CLIENT_PUBLIC_PEM)
            .expect("fixture keys import")
    }

    /// Simulator with explicit keys.
    pub fn from_pems(gateway_private_pem: &str, client_public_pem: &str) -> Result<Self> {
        let der = pem_to_der(gateway_private_pem, "gateway private key")?;
        let private_key = RsaPrivateKey::from_pkcs8_der(&der)
            .map_err(|e| RedotError::key_import("gateway private key", e.to_string()))?;
        Ok(Self {
            private_key,
            client_key: VerifyingKey::from_pem(client_public_pem)?,
            handler: Box::new(|payload| payload.clone()),
            recorder: Recorder::default(),
        })
    }

    /// Reply with `handler(payload)` instead of echoing.
    pub fn with_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.handler = Box::new(handler);
        self
    }

    /// Number of requests received.
    pub fn calls(&self) -> usize {
        self.recorder.len()
    }

    /// All requests received, oldest first.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.recorder.all()
    }

    /// The most recent request.
    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.recorder.last()
    }

    fn unwrap_key(&self, envelope: &RequestEnvelope) -> Result<SymmetricKey> {
        let wrapped = BASE64
            .decode(&envelope.encrypted_aes_key)
            .map_err(|e| RedotError::Transport(format!("gateway: bad wrapped key: {}", e)))?;
        let raw = Zeroizing::new(
            self.private_key
                .decrypt(Oaep::new::<Sha256>(), &wrapped)
                .map_err(|e| RedotError::Transport(format!("gateway: unwrap failed: {}", e)))?,
        );
        SymmetricKey::from_bytes(&raw)
    }

    fn check_signature(&self, plaintext: &str, headers: &RequestHeaders) -> Option<bool> {
        let signature = headers.get(RequestHeaders::SIGNATURE)?;
        let valid = BASE64
            .decode(signature)
            .map(|raw| self.client_key.verify_bytes(plaintext.as_bytes(), &raw).is_ok())
            .unwrap_or(false);
        Some(valid)
    }
}

impl Default for GatewaySimulator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for GatewaySimulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewaySimulator")
            .field("calls", &self.calls())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Transport for GatewaySimulator {
    async fn send(&self, url: &str, body: Value, headers: &RequestHeaders) -> Result<Value> {
        let request: RequestEnvelope = serde_json::from_value(body.clone())
            .map_err(|e| RedotError::Transport(format!("gateway: not a request envelope: {}", e)))?;
        let key = self.unwrap_key(&request)?;

        let plaintext = envelope::decrypt(&request.to_response(), &key)?;
        let signature_valid = self.check_signature(&plaintext, headers);
        let payload: Value = serde_json::from_str(&plaintext)
            .map_err(|e| RedotError::Transport(format!("gateway: payload is not JSON: {}", e)))?;

        let reply = (self.handler)(&payload);
        let reply_text = serde_json::to_string(&reply)
            .map_err(|e| RedotError::Transport(format!("gateway: {}", e)))?;
        let (iv, encrypted_data, tag) = envelope::seal_with_key(reply_text.as_bytes(), &key)?;

        self.recorder.push(RecordedRequest {
            url: url.to_string(),
            headers: headers.clone(),
            body,
            payload: Some(payload),
            signature_valid,
        })?;

        Ok(json!({
            "encryptedData": BASE64.encode(encrypted_data),
            "iv": BASE64.encode(iv),
            "tag": BASE64.encode(tag),
        }))
    }
}

/// Returns canned replies in order.
///
/// Once the script is exhausted every call fails with a transport error.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<Value>>>,
    recorder: Recorder,
}

impl ScriptedTransport {
    /// Empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a successful reply.
    pub fn reply(self, body: Value) -> Self {
        self.push(Ok(body))
    }

    /// Append a failure.
    pub fn fail(self, error: RedotError) -> Self {
        self.push(Err(error))
    }

    fn push(self, entry: Result<Value>) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(entry);
        }
        self
    }

    /// Number of requests received.
    pub fn calls(&self) -> usize {
        self.recorder.len()
    }

    /// The most recent request.
    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.recorder.last()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, url: &str, body: Value, headers: &RequestHeaders) -> Result<Value> {
        self.recorder.push(RecordedRequest {
            url: url.to_string(),
            headers: headers.clone(),
            body,
            payload: None,
            signature_valid: None,
        })?;
        let next = self
            .script
            .lock()
            .map_err(|_| lock_error("send"))?
            .pop_front();
        next.unwrap_or_else(|| Err(RedotError::Transport("script exhausted".to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::encrypt;
    use crate::keys::WrappingKey;

    #[tokio::test]
    async fn test_gateway_simulator_round_trip() {
        let gateway = GatewaySimulator::new()
            .with_handler(|payload| json!({"received": payload["sn"].clone()}));
        let wrapping = WrappingKey::from_pem(fixtures::GATEWAY_PUBLIC_PEM).unwrap();
        let sealed = encrypt(&json!({"sn": "X1"}), &wrapping).unwrap();
        let body = serde_json::to_value(&sealed.envelope).unwrap();

        let reply = gateway
            .send("/order", body, &RequestHeaders::new())
            .await
            .unwrap();
        let response = serde_json::from_value(reply).unwrap();

        assert_eq!(sealed.open(&response).unwrap(), r#"{"received":"X1"}"#);
        let recorded = gateway.last_request().unwrap();
        assert_eq!(recorded.payload, Some(json!({"sn": "X1"})));
        assert_eq!(recorded.signature_valid, None);
    }

    #[tokio::test]
    async fn test_scripted_transport_order() {
        let transport = ScriptedTransport::new()
            .reply(json!({"a": 1}))
            .fail(RedotError::Transport("down".into()));
        let headers = RequestHeaders::new();

        assert_eq!(transport.send("/", json!({}), &headers).await.unwrap(), json!({"a": 1}));
        assert!(transport.send("/", json!({}), &headers).await.is_err());
        assert!(transport.send("/", json!({}), &headers).await.is_err());
        assert_eq!(transport.calls(), 3);
    }
}
