//! Smoke tests for redotkit-demo-cli
//!
//! These tests drive the built binary without network access, using the
//! library's fixture keys.

use std::path::PathBuf;
use std::process::{Command, Output};

use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../redotkit-lib/src/test_utils/keys")
        .join(name)
}

fn demo(storage: &TempDir, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_redotkit-demo"))
        .arg("--storage-dir")
        .arg(storage.path())
        .args(args)
        .env_remove("REDOTKIT_DEMO_DIR")
        .env_remove("REDOT_PUBLIC_KEY")
        .env_remove("REDOT_PRIVATE_KEY")
        .output()
        .expect("Failed to execute command")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Test that the CLI can show help
#[test]
fn test_cli_help() {
    let dir = TempDir::new().unwrap();
    let output = demo(&dir, &["--help"]);

    assert!(output.status.success());
    let help = stdout(&output);
    for command in ["sign", "encrypt", "decrypt", "pre-order", "bind-tx"] {
        assert!(help.contains(command), "help should mention '{command}'");
    }
}

/// Test sign then verify with the matching public key
#[test]
fn test_sign_and_verify() {
    let dir = TempDir::new().unwrap();
    let private = fixture("client_private.pem");
    let public = fixture("client_public.pem");
    let payload = r#"{"preSn":"ABC123"}"#;

    let output = demo(&dir, &["sign", "--key", private.to_str().unwrap(), payload]);
    assert!(output.status.success(), "{:?}", output);
    let signature = stdout(&output);
    assert!(!signature.is_empty());

    let output = demo(
        &dir,
        &["verify", "--key", public.to_str().unwrap(), "--signature", &signature, payload],
    );
    assert!(output.status.success(), "{:?}", output);

    let other = fixture("other_public.pem");
    let output = demo(
        &dir,
        &["verify", "--key", other.to_str().unwrap(), "--signature", &signature, payload],
    );
    assert!(!output.status.success());
}

/// Test encrypt output decrypts with the reported AES key
#[test]
fn test_encrypt_then_decrypt() {
    let dir = TempDir::new().unwrap();
    let gateway = fixture("gateway_public.pem");

    let output = demo(&dir, &["encrypt", "--key", gateway.to_str().unwrap(), r#"{"sn":"X1"}"#]);
    assert!(output.status.success(), "{:?}", output);
    let sealed: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let aes_key = sealed["aesKey"].as_str().unwrap();
    let envelope = sealed["envelope"].to_string();

    let output = demo(&dir, &["decrypt", "--aes-key", aes_key, &envelope]);
    assert!(output.status.success(), "{:?}", output);
    assert_eq!(stdout(&output), r#"{"sn":"X1"}"#);
}

/// Test that the language preference persists in the storage directory
#[test]
fn test_language_persists() {
    let dir = TempDir::new().unwrap();

    assert_eq!(stdout(&demo(&dir, &["lang"])), "en");
    assert!(demo(&dir, &["lang", "zh"]).status.success());
    assert_eq!(stdout(&demo(&dir, &["lang"])), "zh");
    assert!(!demo(&dir, &["lang", "fr"]).status.success());
}

/// Test that token and logout work on the store without gateway configuration
#[test]
fn test_token_and_logout_without_config() {
    let dir = TempDir::new().unwrap();

    let output = demo(&dir, &["token", "jwt-123"]);
    assert!(output.status.success(), "{:?}", output);
    let stored = std::fs::read_to_string(dir.path().join("session.json")).unwrap();
    assert!(stored.contains("jwt-123"));

    assert!(!demo(&dir, &["token", " "]).status.success());

    assert!(demo(&dir, &["logout"]).status.success());
    let stored = std::fs::read_to_string(dir.path().join("session.json")).unwrap();
    assert!(!stored.contains("jwt-123"));
}

/// Test that key inspection recognises both key kinds
#[test]
fn test_inspect_key() {
    let dir = TempDir::new().unwrap();

    let output = demo(&dir, &["inspect-key", fixture("client_private.pem").to_str().unwrap()]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("2048"));

    let output = demo(&dir, &["inspect-key", fixture("gateway_public.pem").to_str().unwrap()]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("OAEP"));

    let output = demo(&dir, &["inspect-key", fixture("ec_private.pem").to_str().unwrap()]);
    assert!(!output.status.success());
}

/// Test that gateway commands fail cleanly without configuration
#[test]
fn test_gateway_command_requires_config() {
    let dir = TempDir::new().unwrap();
    let output = demo(&dir, &["order-status", "SN-1"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("REDOT_PUBLIC_KEY"), "stderr: {stderr}");
}
