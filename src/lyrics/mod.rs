//! Lyrics resolution.
//!
//! This module provides:
//! - Musixmatch client with session token management
//! - LRCLIB client as a token-free fallback
//! - Parsers producing line-based `Lyrics`
//! - `LyricsService`, which walks the configured providers and caches hits

pub mod lrclib;
pub mod musixmatch;
pub mod parser;
pub mod token;

pub use lrclib::LrclibClient;
pub use musixmatch::MusixmatchClient;
pub use parser::Lyrics;
pub use token::TokenManager;

use crate::storage::StorageHandle;
use lru::LruCache;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::sync::Mutex;

#[derive(Debug, thiserror::Error)]
pub enum LyricsError {
    /// Token acquisition failed or the provider rejected the token. Retrying
    /// later is expected to work.
    #[error("lyrics provider authentication failed: {0}")]
    Auth(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("lyrics provider error: {0}")]
    Api(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Musixmatch,
    Lrclib,
}

impl Provider {
    pub fn name(self) -> &'static str {
        match self {
            Provider::Musixmatch => "musixmatch",
            Provider::Lrclib => "lrclib",
        }
    }
}

/// Which track to look up.
#[derive(Debug, Clone)]
pub struct LyricsQuery {
    pub title: String,
    pub artist: String,
    pub duration_secs: Option<u32>,
}

impl LyricsQuery {
    /// Case-insensitive key shared by the memory and disk caches.
    pub fn cache_key(&self) -> String {
        format!(
            "{}\u{1f}{}",
            self.title.trim().to_lowercase(),
            self.artist.trim().to_lowercase()
        )
    }
}

pub struct LyricsService {
    musixmatch: MusixmatchClient,
    lrclib: LrclibClient,
    providers: Vec<Provider>,
    memory: Mutex<LruCache<String, Lyrics>>,
    storage: Option<StorageHandle>,
}

impl LyricsService {
    pub fn new(
        musixmatch: MusixmatchClient,
        lrclib: LrclibClient,
        providers: Vec<Provider>,
        cache_size: usize,
        storage: Option<StorageHandle>,
    ) -> Self {
        let capacity = NonZeroUsize::new(cache_size).unwrap_or(NonZeroUsize::MIN);
        Self {
            musixmatch,
            lrclib,
            providers,
            memory: Mutex::new(LruCache::new(capacity)),
            storage,
        }
    }

    /// `Ok(None)` means every provider answered and none had lyrics. An error
    /// is returned only when nothing was found and at least one provider
    /// failed.
    pub async fn get_lyrics(&self, query: &LyricsQuery) -> Result<Option<Lyrics>, LyricsError> {
        let key = query.cache_key();
        if let Some(hit) = self.cached(&key).await {
            return Ok(Some(hit));
        }

        let mut last_error = None;
        for provider in &self.providers {
            let result = match provider {
                Provider::Musixmatch => {
                    self.musixmatch
                        .get_lyrics(&query.title, &query.artist, query.duration_secs)
                        .await
                }
                Provider::Lrclib => {
                    self.lrclib
                        .get_lyrics(&query.title, &query.artist, query.duration_secs)
                        .await
                }
            };
            match result {
                Ok(Some(lyrics)) => {
                    tracing::debug!(provider = provider.name(), lines = lyrics.lines.len(), "lyrics found");
                    self.remember(key, &lyrics).await;
                    return Ok(Some(lyrics));
                }
                Ok(None) => {
                    tracing::debug!(provider = provider.name(), "no lyrics, trying next provider");
                }
                Err(e) => {
                    tracing::warn!(provider = provider.name(), "lyrics lookup failed: {e}");
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) => Err(e),
            None => Ok(None),
        }
    }

    async fn cached(&self, key: &str) -> Option<Lyrics> {
        if let Some(hit) = self.memory.lock().ok()?.get(key).cloned() {
            return Some(hit);
        }
        let storage = self.storage.clone()?;
        let k = key.to_string();
        let stored = tokio::task::spawn_blocking(move || storage.get_lyrics(&k))
            .await
            .ok()?
            .unwrap_or_else(|e| {
                tracing::debug!("read lyrics cache: {e:#}");
                None
            })?;
        if let Ok(mut memory) = self.memory.lock() {
            memory.put(key.to_string(), stored.clone());
        }
        Some(stored)
    }

    async fn remember(&self, key: String, lyrics: &Lyrics) {
        if let Ok(mut memory) = self.memory.lock() {
            memory.put(key.clone(), lyrics.clone());
        }
        let Some(storage) = self.storage.clone() else {
            return;
        };
        let lyrics = lyrics.clone();
        let now = time::OffsetDateTime::now_utc().unix_timestamp();
        match tokio::task::spawn_blocking(move || storage.cache_lyrics(&key, &lyrics, now)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::debug!("write lyrics cache: {e:#}"),
            Err(e) => tracing::debug!("write lyrics cache task: {e}"),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn cache_key_ignores_case_and_padding() {
        let a = LyricsQuery {
            title: " Hello ".into(),
            artist: "ADELE".into(),
            duration_secs: None,
        };
        let b = LyricsQuery {
            title: "hello".into(),
            artist: "adele ".into(),
            duration_secs: Some(295),
        };
        assert_eq!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn provider_names_match_config_values() {
        let parsed: Vec<Provider> = serde_json::from_str(r#"["lrclib","musixmatch"]"#).unwrap();
        assert_eq!(parsed, [Provider::Lrclib, Provider::Musixmatch]);
        assert_eq!(Provider::Musixmatch.name(), "musixmatch");
    }

    #[tokio::test]
    async fn empty_provider_list_finds_nothing() {
        let tokens = Arc::new(TokenManager::new(None));
        let service = LyricsService::new(
            MusixmatchClient::new(musixmatch::DEFAULT_APP_ID, tokens).unwrap(),
            LrclibClient::new().unwrap(),
            Vec::new(),
            0,
            None,
        );
        let q = LyricsQuery {
            title: "t".into(),
            artist: "a".into(),
            duration_secs: None,
        };
        assert!(service.get_lyrics(&q).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn memory_cache_answers_without_providers() {
        let tokens = Arc::new(TokenManager::new(None));
        let service = LyricsService::new(
            MusixmatchClient::new(musixmatch::DEFAULT_APP_ID, tokens).unwrap(),
            LrclibClient::new().unwrap(),
            Vec::new(),
            4,
            None,
        );
        let q = LyricsQuery {
            title: "t".into(),
            artist: "a".into(),
            duration_secs: None,
        };
        let lyrics = parser::parse_unsynced_lyrics("la la");
        service.remember(q.cache_key(), &lyrics).await;
        assert_eq!(service.get_lyrics(&q).await.unwrap(), Some(lyrics));
    }
}
