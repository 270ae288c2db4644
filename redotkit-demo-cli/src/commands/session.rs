//! Session commands: language, bearer token, logout

use anyhow::Result;
use redotkit_lib::store::{BEARER_TOKEN_KEY, LANGUAGE_KEY, SIGNATURE_KEY};
use redotkit_lib::{Language, SessionStore};

use crate::store::FileSessionStore;
use crate::ui;

/// Show or set the stored language. Works without gateway configuration.
pub async fn language(store: &FileSessionStore, set: Option<Language>) -> Result<()> {
    if let Some(language) = set {
        store.set(LANGUAGE_KEY, language.as_str()).await?;
        ui::success(&format!("Language set to {}", language));
        return Ok(());
    }

    let stored = store.get(LANGUAGE_KEY).await?;
    println!("{}", Language::from_stored(stored.as_deref()));
    Ok(())
}

/// Store the bearer token sent with later gateway requests.
pub async fn set_token(store: &FileSessionStore, token: &str) -> Result<()> {
    let token = token.trim();
    if token.is_empty() {
        anyhow::bail!("refusing to store an empty token");
    }
    store.set(BEARER_TOKEN_KEY, token).await?;
    ui::success("Bearer token stored");
    Ok(())
}

/// Remove the stored bearer token and last signature.
pub async fn logout(store: &FileSessionStore) -> Result<()> {
    store.remove(BEARER_TOKEN_KEY).await?;
    store.remove(SIGNATURE_KEY).await?;
    ui::success("Session cleared");
    Ok(())
}

/// Print what the file store holds, without revealing secrets.
pub async fn status(store: &FileSessionStore) -> Result<()> {
    ui::header("Session");
    ui::key_value("File", &store.path().display().to_string());
    let token = store.get(BEARER_TOKEN_KEY).await?;
    ui::key_value("Bearer token", if token.is_some() { "set" } else { "not set" });
    let signature = store.get(SIGNATURE_KEY).await?;
    ui::key_value("Last signature", if signature.is_some() { "set" } else { "none" });
    let stored = store.get(LANGUAGE_KEY).await?;
    ui::key_value("Language", Language::from_stored(stored.as_deref()).as_str());
    Ok(())
}
