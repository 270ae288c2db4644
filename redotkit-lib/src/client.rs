//! Client facade over one gateway session.
//!
//! [`RedotClient`] bundles a [`SessionContext`] built from a
//! [`RedotConfig`] with a [`RequestOrchestrator`], and manages the bearer
//! token lifecycle in the session store.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::{Language, RedotConfig};
use crate::orchestrator::RequestOrchestrator;
use crate::session::SessionContext;
use crate::store::{SessionStore, BEARER_TOKEN_KEY, LANGUAGE_KEY, SIGNATURE_KEY};
use crate::transport::Transport;
use crate::Result;

/// Gateway client for one merchant session.
pub struct RedotClient<T, S> {
    config: RedotConfig,
    session: SessionContext,
    orchestrator: RequestOrchestrator<T, S>,
}

impl<T: Transport, S: SessionStore> RedotClient<T, S> {
    /// Create a client, importing the configured keys once.
    ///
    /// # Errors
    ///
    /// `KeyImport` if either PEM cannot be imported.
    pub fn new(config: RedotConfig, transport: T, store: S) -> Result<Self> {
        let session = SessionContext::from_config(&config)?;
        let orchestrator =
            RequestOrchestrator::new(transport, store).with_default_language(config.language);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            pre_order_id = %session.pre_order_id(),
            signing = session.has_signing_key(),
            "client initialized"
        );

        Ok(Self {
            config,
            session,
            orchestrator,
        })
    }

    /// Run one request cycle against `route`.
    ///
    /// Relative routes are resolved against the configured base URL.
    pub async fn request_api<P, R>(&mut self, route: &str, payload: &P) -> Result<R>
    where
        P: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let url = self.config.url(route);
        self.orchestrator
            .call_api(&url, payload, &mut self.session)
            .await
    }

    /// Replace the bearer token and persist it.
    ///
    /// Returns `false` and changes nothing if `token` is empty.
    pub async fn refresh_bearer_token(&mut self, token: &str) -> Result<bool> {
        if token.is_empty() {
            return Ok(false);
        }
        let store = self.orchestrator.store();
        store.remove(BEARER_TOKEN_KEY).await?;
        store.set(BEARER_TOKEN_KEY, token).await?;
        self.session.set_bearer_token(token);
        Ok(true)
    }

    /// End the session: drop the bearer token and the last signature.
    pub async fn destroy(&mut self) -> Result<()> {
        let store = self.orchestrator.store();
        store.remove(BEARER_TOKEN_KEY).await?;
        store.remove(SIGNATURE_KEY).await?;
        self.session.clear_bearer_token();
        Ok(())
    }

    /// Persist the language preference sent in the `Lang` header.
    pub async fn set_language(&self, language: Language) -> Result<()> {
        self.orchestrator
            .store()
            .set(LANGUAGE_KEY, language.as_str())
            .await
    }

    /// The language the next request will carry.
    pub async fn language(&self) -> Result<Language> {
        Ok(match self.orchestrator.store().get(LANGUAGE_KEY).await? {
            Some(stored) if !stored.is_empty() => Language::from_stored(Some(&stored)),
            _ => self.config.language,
        })
    }

    /// The session state.
    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// The configuration.
    pub fn config(&self) -> &RedotConfig {
        &self.config
    }

    /// The orchestrator (transport and store access).
    pub fn orchestrator(&self) -> &RequestOrchestrator<T, S> {
        &self.orchestrator
    }
}

impl<T, S> std::fmt::Debug for RedotClient<T, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedotClient")
            .field("config", &self.config)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}
