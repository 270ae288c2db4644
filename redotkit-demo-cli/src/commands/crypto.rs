//! Offline envelope commands: sign, verify, encrypt, decrypt, inspect-key
//!
//! Results go to stdout, status lines to stderr.

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use redotkit_lib::envelope::{decrypt_with_raw_key, encrypt, sign, verify_signature};
use redotkit_lib::{ResponseEnvelope, SigningKey, VerifyingKey, WrappingKey};
use serde_json::json;
use std::path::Path;

use super::{read_payload, read_pem};
use crate::ui;

pub fn sign_payload(key_path: &Path, payload: &str, verbose: bool) -> Result<()> {
    let key = SigningKey::from_pem(&read_pem(key_path)?)?;
    let payload = read_payload(payload)?;

    let signature = sign(&payload, &key)?;
    if verbose {
        ui::info(&format!("Signed with {}-bit RSA key", key.bits()));
    }
    println!("{}", signature);
    Ok(())
}

pub fn verify_payload(key_path: &Path, signature: &str, payload: &str) -> Result<()> {
    let key = VerifyingKey::from_pem(&read_pem(key_path)?)?;
    let payload = read_payload(payload)?;

    verify_signature(&payload, signature, &key)?;
    ui::success("Signature is valid");
    Ok(())
}

pub fn encrypt_payload(key_path: &Path, payload: &str, verbose: bool) -> Result<()> {
    let key = WrappingKey::from_pem(&read_pem(key_path)?)?;
    let payload = read_payload(payload)?;

    let sealed = encrypt(&payload, &key)?;
    let aes_key = BASE64.encode(sealed.key().to_bytes().as_slice());
    if verbose {
        ui::info(&format!("Wrapped AES key for {}-bit RSA recipient", key.bits()));
    }
    ui::warning("aesKey decrypts the reply; keep it secret");
    ui::json(&json!({
        "envelope": sealed.envelope,
        "aesKey": aes_key,
    }));
    Ok(())
}

pub fn decrypt_envelope(aes_key: &str, envelope: &str) -> Result<()> {
    let raw_key = BASE64
        .decode(aes_key.trim())
        .context("AES key is not valid base64")?;
    let envelope: ResponseEnvelope = serde_json::from_value(read_payload(envelope)?)
        .context("Envelope must have encryptedData, iv and tag")?;

    let plaintext = decrypt_with_raw_key(&envelope, &raw_key)?;
    println!("{}", plaintext);
    Ok(())
}

pub fn inspect_key(key_path: &Path) -> Result<()> {
    let pem = read_pem(key_path)?;

    if let Ok(key) = SigningKey::from_pem(&pem) {
        ui::header("Signing Key");
        ui::key_value("Type", "RSA private key (PKCS#8)");
        ui::key_value("Bits", &key.bits().to_string());
        ui::key_value("Scheme", "PKCS#1 v1.5 / SHA-256");
        return Ok(());
    }

    let key = WrappingKey::from_pem(&pem).with_context(|| {
        format!(
            "{} is neither an RSA private nor public key",
            key_path.display()
        )
    })?;
    ui::header("Wrapping Key");
    ui::key_value("Type", "RSA public key (SPKI)");
    ui::key_value("Bits", &key.bits().to_string());
    ui::key_value("Scheme", "RSA-OAEP / SHA-256");
    ui::key_value("Max wrap length", &format!("{} bytes", key.max_wrap_len()));
    ui::key_value("SPKI", &key.to_spki_base64()?);
    Ok(())
}
