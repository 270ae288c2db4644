//! CLI command implementations

pub mod crypto;
pub mod gateway;
pub mod session;

use anyhow::{Context, Result};
use redotkit_lib::{HttpTransport, RedotClient, RedotConfig};
use serde_json::Value;
use std::path::Path;

use crate::store::FileSessionStore;

/// Client type used by the gateway commands.
pub type DemoClient = RedotClient<HttpTransport, FileSessionStore>;

/// Read a payload argument.
///
/// `@path` reads the file. Text that parses as JSON is used as JSON,
/// anything else is signed/encrypted as a plain string.
pub fn read_payload(arg: &str) -> Result<Value> {
    let text = match arg.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read payload file {}", path))?,
        None => arg.to_string(),
    };
    Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
}

/// Read a PEM file.
pub fn read_pem(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read key file {}", path.display()))
}

/// Load gateway configuration from a JSON file or the `REDOT_*` environment.
pub fn load_config(config_path: Option<&Path>) -> Result<RedotConfig> {
    match config_path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("Invalid config file {}", path.display()))
        }
        None => RedotConfig::from_env().context("Failed to load configuration from environment"),
    }
}

/// Build a gateway client over HTTP with the file-backed session store.
pub fn build_client(storage_dir: &Path, config: RedotConfig) -> Result<DemoClient> {
    let transport = HttpTransport::new(&config).context("Failed to create HTTP transport")?;
    let store = FileSessionStore::new(storage_dir);
    RedotClient::new(config, transport, store).context("Failed to import keys")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_read_payload_json_and_text() {
        assert_eq!(read_payload(r#"{"sn":"X1"}"#).unwrap(), json!({"sn": "X1"}));
        assert_eq!(read_payload("plain").unwrap(), json!("plain"));
    }

    #[test]
    fn test_read_payload_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("payload.json");
        std::fs::write(&path, r#"{"preSn":"ABC123"}"#).unwrap();

        let payload = read_payload(&format!("@{}", path.display())).unwrap();
        assert_eq!(payload, json!({"preSn": "ABC123"}));
    }
}
