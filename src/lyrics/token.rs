//! Session token for the lyrics provider.
//!
//! A `TokenManager` is created once per process and shared by reference
//! (`Arc`) with every client that needs it. The stored token is only ever
//! replaced by a successful acquisition; `invalidate` marks it unusable but
//! keeps the value until then.

use crate::lyrics::LyricsError;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Returned by the provider instead of a real token when it throttles the
/// client.
const PLACEHOLDER_TOKEN: &str = "UpgradeOnlyUpgradeOnlyUpgradeOnlyUpgradeOnly";

/// Where tokens survive restarts.
pub trait TokenPersistence: Send + Sync {
    fn load_token(&self) -> anyhow::Result<Option<String>>;
    fn save_token(&self, token: &str) -> anyhow::Result<()>;
}

#[derive(Debug, Default)]
struct TokenState {
    token: String,
    valid: bool,
}

pub struct TokenManager {
    state: RwLock<TokenState>,
    // held for the whole acquisition round-trip
    refresh: Mutex<()>,
    persistence: Option<Arc<dyn TokenPersistence>>,
}

pub fn is_usable(token: &str) -> bool {
    !token.trim().is_empty() && token != PLACEHOLDER_TOKEN
}

impl TokenManager {
    pub fn new(persistence: Option<Arc<dyn TokenPersistence>>) -> Self {
        Self {
            state: RwLock::new(TokenState::default()),
            refresh: Mutex::new(()),
            persistence,
        }
    }

    /// Startup path. Errors are for the caller to log; lyrics requests will
    /// acquire a fresh token on demand either way.
    pub async fn load_persisted(&self) -> anyhow::Result<bool> {
        let Some(p) = self.persistence.clone() else {
            return Ok(false);
        };
        let loaded = tokio::task::spawn_blocking(move || p.load_token()).await??;
        match loaded {
            Some(token) if is_usable(&token) => {
                let mut state = self.state.write().await;
                state.token = token;
                state.valid = true;
                tracing::info!("loaded persisted lyrics token");
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// The current token if it is usable.
    pub async fn current(&self) -> Option<String> {
        let state = self.state.read().await;
        (state.valid && is_usable(&state.token)).then(|| state.token.clone())
    }

    /// Marks `token` as rejected by the provider. A newer token stored in the
    /// meantime is left alone.
    pub async fn invalidate(&self, token: &str) {
        let mut state = self.state.write().await;
        if state.token == token {
            state.valid = false;
        }
    }

    /// Returns the current token or acquires one.
    pub async fn token_or_acquire<F, Fut>(&self, acquire: F) -> Result<String, LyricsError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, LyricsError>>,
    {
        if let Some(token) = self.current().await {
            return Ok(token);
        }
        self.refresh(acquire).await
    }

    /// Acquires a new token. Concurrent callers wait for one round-trip and
    /// share its result instead of each hitting the provider.
    pub async fn refresh<F, Fut>(&self, acquire: F) -> Result<String, LyricsError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, LyricsError>>,
    {
        let _guard = self.refresh.lock().await;
        if let Some(token) = self.current().await {
            return Ok(token);
        }

        let token = acquire().await?;
        if !is_usable(&token) {
            tracing::warn!("lyrics provider returned no usable token");
            return Err(LyricsError::Auth("provider returned no usable token".into()));
        }

        {
            let mut state = self.state.write().await;
            state.token = token.clone();
            state.valid = true;
        }
        tracing::info!("acquired lyrics token");

        if let Some(p) = self.persistence.clone() {
            let t = token.clone();
            match tokio::task::spawn_blocking(move || p.save_token(&t)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::warn!("persist lyrics token: {e:#}"),
                Err(e) => tracing::warn!("persist lyrics token task: {e}"),
            }
        }
        Ok(token)
    }
}
