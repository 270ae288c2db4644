//! Signed, hybrid-encrypted payload envelopes.
//!
//! # Wire Format
//!
//! Request body (all fields standard base64 with padding):
//!
//! ```text
//! { "encryptedAesKey": RSA-OAEP-SHA256(aes_key),
//!   "encryptedData":   AES-128-GCM ciphertext without tag,
//!   "iv":              12 random bytes,
//!   "tag":             16-byte GCM authentication tag }
//! ```
//!
//! The response carries the same fields minus `encryptedAesKey`; it is
//! encrypted under the AES key the client generated for the request.
//!
//! # Canonical payload text
//!
//! Payloads are serialized with `serde_json` in field declaration order. A
//! payload that serializes to a JSON string is used verbatim, so signing
//! `"abc"` signs the three bytes `abc`, not `"abc"` with quotes.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::keys::{SigningKey, SymmetricKey, VerifyingKey, WrappingKey, IV_SIZE};
use crate::{RedotError, Result};

/// Size of the AES-GCM authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

/// Envelope sent to the gateway.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestEnvelope {
    /// AES key wrapped under the gateway's RSA-OAEP key.
    pub encrypted_aes_key: String,
    /// Ciphertext without the trailing tag.
    pub encrypted_data: String,
    /// AES-GCM nonce.
    pub iv: String,
    /// AES-GCM authentication tag.
    pub tag: String,
}

impl RequestEnvelope {
    /// The same ciphertext viewed as a response envelope (key field dropped).
    pub fn to_response(&self) -> ResponseEnvelope {
        ResponseEnvelope {
            encrypted_data: self.encrypted_data.clone(),
            iv: self.iv.clone(),
            tag: self.tag.clone(),
        }
    }
}

/// Envelope returned by the gateway.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    /// Ciphertext without the trailing tag.
    pub encrypted_data: String,
    /// AES-GCM nonce.
    pub iv: String,
    /// AES-GCM authentication tag.
    pub tag: String,
}

/// Result of [`encrypt`]: the wire envelope plus the unwrapped AES key.
///
/// The key must be kept until the response is decrypted and then dropped
/// with this value. It is never serialized.
#[derive(Debug)]
pub struct SealedRequest {
    /// Envelope to send.
    pub envelope: RequestEnvelope,
    key: SymmetricKey,
}

impl SealedRequest {
    /// The ephemeral AES key of this request.
    pub fn key(&self) -> &SymmetricKey {
        &self.key
    }

    /// Decrypt the gateway's reply to this request.
    pub fn open(&self, response: &ResponseEnvelope) -> Result<String> {
        decrypt(response, &self.key)
    }
}

/// Serialize a payload to its canonical UTF-8 JSON text.
pub fn canonicalize<P: Serialize + ?Sized>(payload: &P) -> serde_json::Result<String> {
    let text = serde_json::to_string(payload)?;
    if text.starts_with('"') {
        serde_json::from_str(&text)
    } else {
        Ok(text)
    }
}

/// Sign the canonical payload text with RSA PKCS#1 v1.5 / SHA-256.
///
/// Returns the base64 signature. PKCS#1 v1.5 is deterministic: the same key
/// and payload always give the same signature.
pub fn sign<P: Serialize + ?Sized>(payload: &P, key: &SigningKey) -> Result<String> {
    let message = canonicalize(payload)
        .map_err(|e| RedotError::Signing(format!("payload serialization failed: {}", e)))?;
    let signature = key.sign_bytes(message.as_bytes())?;
    Ok(BASE64.encode(signature))
}

/// Verify a base64 signature over the canonical payload text.
pub fn verify_signature<P: Serialize + ?Sized>(
    payload: &P,
    signature: &str,
    key: &VerifyingKey,
) -> Result<()> {
    let message = canonicalize(payload).map_err(|_| RedotError::SignatureInvalid)?;
    let raw = BASE64
        .decode(signature.trim())
        .map_err(|_| RedotError::SignatureInvalid)?;
    key.verify_bytes(message.as_bytes(), &raw)
}

/// Encrypt a payload for the gateway.
///
/// A fresh AES-128 key and a fresh 12-byte IV are drawn for every call. The
/// AES key is wrapped under `wrapping_key` and also returned unwrapped in the
/// [`SealedRequest`] so the caller can decrypt the reply.
#[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
pub fn encrypt<P: Serialize + ?Sized>(
    payload: &P,
    wrapping_key: &WrappingKey,
) -> Result<SealedRequest> {
    let plaintext = Zeroizing::new(
        canonicalize(payload)
            .map_err(|e| RedotError::Encryption(format!("payload serialization failed: {}", e)))?,
    );

    let key = SymmetricKey::generate();
    let (iv, encrypted_data, tag) = seal_with_key(plaintext.as_bytes(), &key)?;
    let wrapped = wrapping_key.wrap(&key)?;

    #[cfg(feature = "tracing")]
    tracing::debug!(
        plaintext_len = plaintext.len(),
        ciphertext_len = encrypted_data.len(),
        "sealed request envelope"
    );

    Ok(SealedRequest {
        envelope: RequestEnvelope {
            encrypted_aes_key: BASE64.encode(wrapped),
            encrypted_data: BASE64.encode(encrypted_data),
            iv: BASE64.encode(iv),
            tag: BASE64.encode(tag),
        },
        key,
    })
}

/// AES-GCM encrypt under a random IV and split the output into
/// `(iv, ciphertext, tag)`.
pub(crate) fn seal_with_key(
    plaintext: &[u8],
    key: &SymmetricKey,
) -> Result<([u8; IV_SIZE], Vec<u8>, Vec<u8>)> {
    let mut iv = [0u8; IV_SIZE];
    rand::thread_rng().fill_bytes(&mut iv);

    let mut ciphertext = key.seal(&iv, plaintext)?;
    if ciphertext.len() < TAG_SIZE {
        return Err(RedotError::Encryption(
            "AES-GCM output shorter than tag".to_string(),
        ));
    }
    let tag = ciphertext.split_off(ciphertext.len() - TAG_SIZE);
    Ok((iv, ciphertext, tag))
}

/// Decrypt a response envelope with the AES key retained from the request.
///
/// Fails with [`RedotError::Decryption`] on any malformed field, tag mismatch,
/// wrong key or wrong IV. Nothing derived from a failed verification is
/// returned.
#[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
pub fn decrypt(envelope: &ResponseEnvelope, key: &SymmetricKey) -> Result<String> {
    let ciphertext = decode_field(&envelope.encrypted_data)?;
    let iv = decode_field(&envelope.iv)?;
    let tag = decode_field(&envelope.tag)?;
    if iv.len() != IV_SIZE || tag.len() != TAG_SIZE {
        return Err(RedotError::Decryption);
    }

    let mut sealed = Vec::with_capacity(ciphertext.len() + TAG_SIZE);
    sealed.extend_from_slice(&ciphertext);
    sealed.extend_from_slice(&tag);

    let plaintext = key.open(&iv, &sealed)?;
    String::from_utf8(plaintext).map_err(|_| RedotError::Decryption)
}

/// [`decrypt`] taking the raw 16 AES key bytes.
pub fn decrypt_with_raw_key(envelope: &ResponseEnvelope, raw_key: &[u8]) -> Result<String> {
    let key = SymmetricKey::from_bytes(raw_key).map_err(|_| RedotError::Decryption)?;
    decrypt(envelope, &key)
}

fn decode_field(value: &str) -> Result<Vec<u8>> {
    BASE64.decode(value).map_err(|_| RedotError::Decryption)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures;
    use serde_json::json;

    fn wrapping_key() -> WrappingKey {
        WrappingKey::from_pem(fixtures::GATEWAY_PUBLIC_PEM).unwrap()
    }

    #[test]
    fn test_canonicalize_string_verbatim() {
        assert_eq!(canonicalize("abc").unwrap(), "abc");
        assert_eq!(canonicalize(&"{\"a\":1}".to_string()).unwrap(), "{\"a\":1}");
    }

    #[test]
    fn test_canonicalize_keeps_field_order() {
        #[derive(Serialize)]
        struct Order {
            sn: &'static str,
            amount: u32,
        }
        let text = canonicalize(&Order { sn: "X1", amount: 5 }).unwrap();
        assert_eq!(text, r#"{"sn":"X1","amount":5}"#);
    }

    #[test]
    fn test_envelope_field_lengths() {
        let sealed = encrypt(&json!({"preSn": "ABC123"}), &wrapping_key()).unwrap();
        let env = &sealed.envelope;

        assert_eq!(BASE64.decode(&env.iv).unwrap().len(), IV_SIZE);
        assert_eq!(BASE64.decode(&env.tag).unwrap().len(), TAG_SIZE);
        assert_eq!(BASE64.decode(&env.encrypted_aes_key).unwrap().len(), 256);
        assert_eq!(
            BASE64.decode(&env.encrypted_data).unwrap().len(),
            r#"{"preSn":"ABC123"}"#.len()
        );
    }

    #[test]
    fn test_wire_field_names() {
        let sealed = encrypt(&json!({"sn": "X1"}), &wrapping_key()).unwrap();
        let value = serde_json::to_value(&sealed.envelope).unwrap();
        let obj = value.as_object().unwrap();
        let mut keys: Vec<_> = obj.keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["encryptedAesKey", "encryptedData", "iv", "tag"]);
    }

    #[test]
    fn test_decrypt_roundtrip() {
        let sealed = encrypt(&json!({"sn": "X1"}), &wrapping_key()).unwrap();
        let plaintext = sealed.open(&sealed.envelope.to_response()).unwrap();
        assert_eq!(plaintext, r#"{"sn":"X1"}"#);
    }

    #[test]
    fn test_decrypt_with_raw_key() {
        let sealed = encrypt("plain text", &wrapping_key()).unwrap();
        let raw = sealed.key().to_bytes();
        let plaintext =
            decrypt_with_raw_key(&sealed.envelope.to_response(), raw.as_slice()).unwrap();
        assert_eq!(plaintext, "plain text");
    }

    #[test]
    fn test_empty_payload_string() {
        let sealed = encrypt("", &wrapping_key()).unwrap();
        assert!(BASE64.decode(&sealed.envelope.encrypted_data).unwrap().is_empty());
        assert_eq!(sealed.open(&sealed.envelope.to_response()).unwrap(), "");
    }

    #[test]
    fn test_short_tag_rejected() {
        let sealed = encrypt(&json!({"a": 1}), &wrapping_key()).unwrap();
        let mut response = sealed.envelope.to_response();
        let tag = BASE64.decode(&response.tag).unwrap();
        response.tag = BASE64.encode(&tag[..12]);
        assert!(matches!(sealed.open(&response), Err(RedotError::Decryption)));
    }

    #[test]
    fn test_invalid_base64_rejected() {
        let sealed = encrypt(&json!({"a": 1}), &wrapping_key()).unwrap();
        let mut response = sealed.envelope.to_response();
        response.iv = "***".to_string();
        assert!(matches!(sealed.open(&response), Err(RedotError::Decryption)));
    }

    #[test]
    fn test_sign_deterministic() {
        let key = SigningKey::from_pem(fixtures::CLIENT_PRIVATE_PEM).unwrap();
        let payload = json!({"sn": "X1"});
        assert_eq!(sign(&payload, &key).unwrap(), sign(&payload, &key).unwrap());
    }

    #[test]
    fn test_string_payload_signed_verbatim() {
        let key = SigningKey::from_pem(fixtures::CLIENT_PRIVATE_PEM).unwrap();
        let verifier = key.verifying_key();
        let signature = sign("hello", &key).unwrap();
        verify_signature("hello", &signature, &verifier).unwrap();
        // A double-encoded string is a different message.
        assert!(verify_signature(&json!("\"hello\""), &signature, &verifier).is_err());
    }

    #[test]
    fn test_garbage_signature_rejected() {
        let key = SigningKey::from_pem(fixtures::CLIENT_PRIVATE_PEM).unwrap();
        let result = verify_signature(&json!({}), "not base64!", &key.verifying_key());
        assert!(matches!(result, Err(RedotError::SignatureInvalid)));
    }
}
