//! LRCLIB API client
//!
//! LRCLIB is a free lyrics API that provides synchronized (LRC format) lyrics.
//! It needs no token, which makes it the fallback when Musixmatch refuses us.
//! API Documentation: https://lrclib.net/docs

use crate::lyrics::LyricsError;
use crate::lyrics::parser::{self, Lyrics};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LrclibResponse {
    #[serde(default)]
    pub plain_lyrics: Option<String>,
    #[serde(default)]
    pub synced_lyrics: Option<String>,
}

impl LrclibResponse {
    /// Synced lyrics first, plain as fallback.
    pub fn into_lyrics(self) -> Option<Lyrics> {
        let lyrics = match (self.synced_lyrics, self.plain_lyrics) {
            (Some(synced), _) if !synced.trim().is_empty() => parser::parse_lrc(&synced),
            (_, Some(plain)) if !plain.trim().is_empty() => parser::parse_unsynced_lyrics(&plain),
            _ => return None,
        };
        (!lyrics.is_empty()).then_some(lyrics)
    }
}

#[derive(Debug, Clone)]
pub struct LrclibClient {
    client: reqwest::Client,
    base_url: String,
}

impl LrclibClient {
    const DEFAULT_BASE_URL: &'static str = "https://lrclib.net/api";
    const USER_AGENT: &'static str = concat!("tunefeed/", env!("CARGO_PKG_VERSION"));

    pub fn new() -> anyhow::Result<Self> {
        Self::with_base_url(Self::DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> anyhow::Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder()
                .user_agent(Self::USER_AGENT)
                .timeout(std::time::Duration::from_secs(10))
                .build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Exact match first, then free-text search.
    pub async fn get_lyrics(
        &self,
        title: &str,
        artist: &str,
        duration_secs: Option<u32>,
    ) -> Result<Option<Lyrics>, LyricsError> {
        if let Some(found) = self.get_exact(title, artist, duration_secs).await?
            && let Some(lyrics) = found.into_lyrics()
        {
            return Ok(Some(lyrics));
        }
        Ok(self.search(title, artist).await?.and_then(LrclibResponse::into_lyrics))
    }

    async fn get_exact(
        &self,
        title: &str,
        artist: &str,
        duration_secs: Option<u32>,
    ) -> Result<Option<LrclibResponse>, LyricsError> {
        let mut url = format!(
            "{}/get?track_name={}&artist_name={}",
            self.base_url,
            urlencoding::encode(title),
            urlencoding::encode(artist)
        );
        if let Some(duration) = duration_secs {
            url.push_str(&format!("&duration={duration}"));
        }

        let response = self.client.get(&url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(LyricsError::Api(format!("LRCLIB get: {}", response.status())));
        }
        Ok(Some(response.json().await?))
    }

    async fn search(
        &self,
        title: &str,
        artist: &str,
    ) -> Result<Option<LrclibResponse>, LyricsError> {
        let url = format!(
            "{}/search?track_name={}&artist_name={}",
            self.base_url,
            urlencoding::encode(title),
            urlencoding::encode(artist)
        );

        let response = self.client.get(&url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(LyricsError::Api(format!("LRCLIB search: {}", response.status())));
        }
        let results: Vec<LrclibResponse> = response.json().await?;
        Ok(pick_best(results))
    }
}

/// The first result with synced lyrics, or else the first result.
fn pick_best(results: Vec<LrclibResponse>) -> Option<LrclibResponse> {
    let synced = results
        .iter()
        .position(|r| r.synced_lyrics.as_deref().is_some_and(|s| !s.trim().is_empty()));
    results.into_iter().nth(synced.unwrap_or(0))
}
