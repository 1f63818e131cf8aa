//! Musixmatch desktop API.
//!
//! Response decoding is split into pure functions (`get_token`,
//! `get_first_track_id`, `parse_lyrics`) that never fail; the client around
//! them handles the token lifecycle and HTTP.

use crate::lyrics::LyricsError;
use crate::lyrics::parser::{self, Lyrics};
use crate::lyrics::token::TokenManager;
use reqwest::header::{COOKIE, HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;
use std::sync::Arc;

const BASE_URL: &str = "https://apic-desktop.musixmatch.com/ws/1.1/";
pub const DEFAULT_APP_ID: &str = "web-desktop-app-v1.0";

const SYNCED_BODY_PATHS: &[&str] = &[
    "/message/body/subtitle/subtitle_body",
    "/message/body/macro_calls/track.subtitles.get/message/body/subtitle_list/0/subtitle/subtitle_body",
];
const UNSYNCED_BODY_PATHS: &[&str] = &[
    "/message/body/lyrics/lyrics_body",
    "/message/body/macro_calls/track.lyrics.get/message/body/lyrics/lyrics_body",
];

fn parse_json(response: &str) -> Option<Value> {
    serde_json::from_str(response).ok()
}

fn non_blank(v: Option<&Value>) -> Option<&str> {
    v?.as_str().filter(|s| !s.trim().is_empty())
}

/// Reads the user token from a `token.get` response. Newer responses carry it
/// in the body, older ones in the header. Empty string when absent.
pub fn get_token(response: &str) -> String {
    let Some(v) = parse_json(response) else {
        return String::new();
    };
    non_blank(v.pointer("/message/body/user_token"))
        .or_else(|| non_blank(v.pointer("/message/header/user_token")))
        .unwrap_or_default()
        .to_string()
}

/// Track id of the first search hit, accepting both numeric and string ids.
pub fn get_first_track_id(response: &str) -> Option<u64> {
    let v = parse_json(response)?;
    let message = v.get("message")?;
    let body = message.get("body")?;
    let results = body.get("macro_result_list")?;
    let first = index(results, 0)?;
    let tracks = first.get("message")?.get("body")?.get("track_list")?;
    let track_id = index(tracks, 0)?.get("track")?.get("track_id")?;
    match track_id {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Lists sometimes come back as objects keyed "0", "1", ...
fn index(v: &Value, i: usize) -> Option<&Value> {
    match v {
        Value::Array(a) => a.get(i),
        Value::Object(o) => o.get(&i.to_string()),
        _ => None,
    }
}

/// Synced body if present, otherwise the unsynced one.
fn extract_lyrics(v: &Value) -> Option<&str> {
    first_non_blank(v, SYNCED_BODY_PATHS).or_else(|| first_non_blank(v, UNSYNCED_BODY_PATHS))
}

fn first_non_blank<'a>(v: &'a Value, paths: &[&str]) -> Option<&'a str> {
    paths.iter().find_map(|p| non_blank(v.pointer(p)))
}

/// Raw lyric text of a subtitles/lyrics response; empty when there is none.
pub fn parse_lyrics(response: &str) -> String {
    parse_json(response)
        .as_ref()
        .and_then(extract_lyrics)
        .map(str::to_string)
        .unwrap_or_default()
}

fn status_code(v: &Value) -> Option<i64> {
    v.pointer("/message/header/status_code")?.as_i64()
}

#[derive(Clone)]
pub struct MusixmatchClient {
    http: reqwest::Client,
    base_url: String,
    app_id: String,
    tokens: Arc<TokenManager>,
}

impl MusixmatchClient {
    pub fn new(app_id: &str, tokens: Arc<TokenManager>) -> anyhow::Result<Self> {
        Self::with_base_url(BASE_URL, app_id, tokens)
    }

    /// `base_url` ends with a slash; method names are appended to it.
    pub fn with_base_url(
        base_url: &str,
        app_id: &str,
        tokens: Arc<TokenManager>,
    ) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Musixmatch/0.19.4 Chrome/58.0.3029.110 Electron/1.7.6 Safari/537.36"),
        );
        headers.insert(COOKIE, HeaderValue::from_static("AWSELB=0; AWSELBCORS=0"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(10))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.to_string(),
            app_id: app_id.to_string(),
            tokens,
        })
    }

    /// Synced lyrics when available, unsynced otherwise.
    pub async fn get_lyrics(
        &self,
        title: &str,
        artist: &str,
        duration_secs: Option<u32>,
    ) -> Result<Option<Lyrics>, LyricsError> {
        let Some(track_id) = self.search_track_id(title, artist).await? else {
            tracing::debug!(title, artist, "musixmatch: no matching track");
            return Ok(None);
        };
        self.lyrics_for_track(track_id, duration_secs).await
    }

    pub async fn search_track_id(
        &self,
        title: &str,
        artist: &str,
    ) -> Result<Option<u64>, LyricsError> {
        let body = self
            .call(
                "macro.search",
                &[
                    ("q_track", title),
                    ("q_artist", artist),
                    ("page_size", "1"),
                    ("s_track_rating", "desc"),
                ],
            )
            .await?;
        Ok(get_first_track_id(&body))
    }

    pub async fn lyrics_for_track(
        &self,
        track_id: u64,
        duration_secs: Option<u32>,
    ) -> Result<Option<Lyrics>, LyricsError> {
        let track_id = track_id.to_string();
        let duration = duration_secs.map(|d| d.to_string()).unwrap_or_default();
        let mut params = vec![
            ("track_id", track_id.as_str()),
            ("subtitle_format", "lrc"),
            ("namespace", "lyrics_synched"),
        ];
        if !duration.is_empty() {
            params.push(("f_subtitle_length", duration.as_str()));
        }
        let body = self.call("macro.subtitles.get", &params).await?;

        let text = parse_lyrics(&body);
        if text.is_empty() {
            return Ok(None);
        }
        // plain lyrics have no timestamped lines
        let synced = parser::parse_musixmatch_lyrics(&text);
        let lyrics = if synced.is_empty() {
            parser::parse_unsynced_lyrics(&text)
        } else {
            synced
        };
        Ok((!lyrics.is_empty()).then_some(lyrics))
    }

    /// `token.get` round-trip.
    pub async fn request_token(&self) -> Result<String, LyricsError> {
        let ts = time::OffsetDateTime::now_utc().unix_timestamp().to_string();
        let url = self.url("token.get", &[("user_language", "en"), ("t", ts.as_str())], None);
        let body = self.http.get(&url).send().await?.text().await?;
        let token = get_token(&body);
        if token.is_empty() {
            let code = parse_json(&body).as_ref().and_then(status_code);
            return Err(LyricsError::Auth(format!(
                "token.get returned no token (status {})",
                code.map(|c| c.to_string()).unwrap_or_else(|| "unknown".into())
            )));
        }
        Ok(token)
    }

    /// Authenticated GET. A 401 in the envelope invalidates the token and the
    /// call is retried once with a fresh one.
    async fn call(&self, method: &str, params: &[(&str, &str)]) -> Result<String, LyricsError> {
        let mut retried = false;
        loop {
            let token = self
                .tokens
                .token_or_acquire(|| self.request_token())
                .await?;
            let url = self.url(method, params, Some(&token));
            let response = self.http.get(&url).send().await?;
            if !response.status().is_success() {
                return Err(LyricsError::Api(format!(
                    "musixmatch {method}: {}",
                    response.status()
                )));
            }
            let body = response.text().await?;

            if parse_json(&body).as_ref().and_then(status_code) != Some(401) {
                return Ok(body);
            }
            self.tokens.invalidate(&token).await;
            if retried {
                return Err(LyricsError::Auth(format!("{method} rejected a fresh token")));
            }
            tracing::info!(method, "musixmatch token rejected, reacquiring");
            retried = true;
        }
    }

    fn url(&self, method: &str, params: &[(&str, &str)], token: Option<&str>) -> String {
        let mut url = format!(
            "{}{method}?format=json&app_id={}",
            self.base_url,
            urlencoding::encode(&self.app_id)
        );
        for (k, v) in params {
            url.push_str(&format!("&{k}={}", urlencoding::encode(v)));
        }
        if let Some(t) = token {
            url.push_str(&format!("&usertoken={}", urlencoding::encode(t)));
        }
        url
    }
}
