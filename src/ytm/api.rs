use crate::ytm::auth::AuthState;
use crate::ytm::pages::{
    ArtistItemsContinuationPage, HomePage, LibraryContinuationPage, LibraryPage,
    PlaylistContinuationPage,
};
use anyhow::Context;
use reqwest::header::{
    AUTHORIZATION, CONTENT_TYPE, COOKIE, HeaderMap, HeaderValue, ORIGIN, REFERER, USER_AGENT,
};
use serde_json::json;
use sha1::{Digest, Sha1};
use std::sync::Arc;
use tokio::sync::OnceCell;

const ORIGIN_URL: &str = "https://music.youtube.com";
const HOME_BROWSE_ID: &str = "FEmusic_home";

#[derive(Debug)]
struct Inner {
    http: reqwest::Client,
    auth: Option<AuthState>,
    bootstrap: OnceCell<Bootstrap>,
}

/// InnerTube client. Fetches raw responses and hands them to the page
/// assemblers; it never interprets renderer trees itself.
#[derive(Debug, Clone)]
pub struct YtmClient {
    inner: Arc<Inner>,
}

#[derive(Debug, Clone)]
struct Bootstrap {
    api_key: String,
    client_version: String,
    visitor_data: Option<String>,
}

impl YtmClient {
    pub fn new(auth: Option<AuthState>) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36"),
        );
        headers.insert(ORIGIN, HeaderValue::from_static(ORIGIN_URL));
        headers.insert(REFERER, HeaderValue::from_static("https://music.youtube.com/"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(a) = &auth
            && !a.cookie_header.is_empty()
        {
            headers.insert(COOKIE, HeaderValue::from_str(&a.cookie_header)?);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("build reqwest client")?;

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                auth,
                bootstrap: OnceCell::new(),
            }),
        })
    }

    pub async fn home(&self) -> anyhow::Result<HomePage> {
        let v = self.browse_raw(HOME_BROWSE_ID).await?;
        Ok(HomePage::from_response(&v))
    }

    pub async fn home_continuation(&self, continuation: &str) -> anyhow::Result<HomePage> {
        let v = self.continuation_raw(continuation).await?;
        Ok(HomePage::from_response(&v))
    }

    /// First page of a library tab, e.g. `FEmusic_liked_albums`.
    pub async fn library(&self, browse_id: &str) -> anyhow::Result<LibraryPage> {
        if !self.is_logged_in() {
            tracing::warn!(browse_id, "library requested without SAPISID cookie");
        }
        let v = self.browse_raw(browse_id).await?;
        Ok(LibraryPage::from_response(&v))
    }

    pub async fn library_continuation(
        &self,
        continuation: &str,
    ) -> anyhow::Result<LibraryContinuationPage> {
        let v = self.continuation_raw(continuation).await?;
        Ok(LibraryContinuationPage::from_response(&v))
    }

    pub async fn artist_items_continuation(
        &self,
        continuation: &str,
    ) -> anyhow::Result<ArtistItemsContinuationPage> {
        let v = self.continuation_raw(continuation).await?;
        Ok(ArtistItemsContinuationPage::from_response(&v))
    }

    pub async fn playlist_continuation(
        &self,
        continuation: &str,
    ) -> anyhow::Result<PlaylistContinuationPage> {
        let v = self.continuation_raw(continuation).await?;
        Ok(PlaylistContinuationPage::from_response(&v))
    }

    pub async fn browse_raw(&self, browse_id: &str) -> anyhow::Result<serde_json::Value> {
        let b = self.bootstrap().await?;
        let body = json!({
            "context": client_context(&b),
            "browseId": browse_id
        });
        self.post_json("browse", &b, &body)
            .await
            .with_context(|| format!("browse {browse_id}"))
    }

    pub async fn continuation_raw(&self, continuation: &str) -> anyhow::Result<serde_json::Value> {
        let b = self.bootstrap().await?;
        let body = json!({
            "context": client_context(&b),
            "continuation": continuation
        });
        self.post_json("browse", &b, &body)
            .await
            .context("browse continuation")
    }

    fn is_logged_in(&self) -> bool {
        self.inner.auth.as_ref().is_some_and(AuthState::is_logged_in)
    }

    async fn post_json(
        &self,
        path: &str,
        b: &Bootstrap,
        body: &serde_json::Value,
    ) -> anyhow::Result<serde_json::Value> {
        let started = std::time::Instant::now();
        let v: serde_json::Value = self
            .innertube_post(path, b)
            .json(body)
            .send()
            .await
            .context("send request")?
            .error_for_status()
            .context("http status")?
            .json()
            .await
            .context("parse json")?;
        tracing::debug!(path, elapsed_ms = started.elapsed().as_millis() as u64, "innertube response");
        Ok(v)
    }

    async fn bootstrap(&self) -> anyhow::Result<Bootstrap> {
        self.inner
            .bootstrap
            .get_or_try_init(|| async {
                let html = self
                    .inner
                    .http
                    .get("https://music.youtube.com/")
                    .send()
                    .await
                    .context("fetch music.youtube.com for bootstrap")?
                    .error_for_status()
                    .context("bootstrap http status")?
                    .text()
                    .await
                    .context("read bootstrap html")?;

                let api_key = parse_ytcfg_value(&html, "INNERTUBE_API_KEY")
                    .context("parse INNERTUBE_API_KEY")?;
                let client_version = parse_ytcfg_value(&html, "INNERTUBE_CLIENT_VERSION")
                    .context("parse INNERTUBE_CLIENT_VERSION")?;
                let visitor_data = parse_ytcfg_value(&html, "VISITOR_DATA");
                tracing::debug!(%client_version, "innertube bootstrap complete");

                Ok(Bootstrap {
                    api_key,
                    client_version,
                    visitor_data,
                })
            })
            .await
            .cloned()
    }

    fn innertube_post(&self, path: &str, b: &Bootstrap) -> reqwest::RequestBuilder {
        let url = format!(
            "{ORIGIN_URL}/youtubei/v1/{path}?key={}&prettyPrint=false",
            b.api_key
        );

        let mut rb = self
            .inner
            .http
            .post(url)
            .header("X-Youtube-Client-Name", "67")
            .header("X-Youtube-Client-Version", b.client_version.as_str())
            .header(
                "X-Youtube-Bootstrap-Logged-In",
                if self.is_logged_in() { "true" } else { "false" },
            );

        // The hash embeds a timestamp, so it is computed per request.
        if let Some(sapisid) = self.inner.auth.as_ref().and_then(|a| a.sapisid.as_deref()) {
            rb = rb.header(AUTHORIZATION, make_sapisid_hash_auth(ORIGIN_URL, sapisid));
        }
        if let Some(v) = b.visitor_data.as_deref() {
            rb = rb.header("X-Goog-Visitor-Id", v);
        }

        rb
    }
}

fn client_context(b: &Bootstrap) -> serde_json::Value {
    json!({
        "client": {
            "clientName": "WEB_REMIX",
            "clientVersion": b.client_version,
        }
    })
}

fn make_sapisid_hash_auth(origin: &str, sapisid: &str) -> String {
    let ts = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    sapisid_hash(ts, origin, sapisid)
}

fn sapisid_hash(ts: u64, origin: &str, sapisid: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(format!("{ts} {sapisid} {origin}").as_bytes());
    format!("SAPISIDHASH {ts}_{}", hex::encode(hasher.finalize()))
}

fn parse_ytcfg_value(html: &str, key: &str) -> Option<String> {
    // We look for `"KEY":"value"` occurrences in the initial HTML ytcfg payload.
    let needle = format!("{key}\":\"");
    let idx = html.find(&needle)?;
    let rest = &html[idx + needle.len()..];
    let end = rest.find('"')?;
    Some(rest[..end].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ytcfg_values_are_read_from_html() {
        let html = r#"<script>ytcfg.set({"INNERTUBE_API_KEY":"AIzaKey","INNERTUBE_CLIENT_VERSION":"1.20240101.01.00"});</script>"#;
        assert_eq!(parse_ytcfg_value(html, "INNERTUBE_API_KEY").as_deref(), Some("AIzaKey"));
        assert_eq!(
            parse_ytcfg_value(html, "INNERTUBE_CLIENT_VERSION").as_deref(),
            Some("1.20240101.01.00")
        );
        assert_eq!(parse_ytcfg_value(html, "VISITOR_DATA"), None);
    }

    #[test]
    fn sapisid_hash_format() {
        let h = sapisid_hash(1700000000, ORIGIN_URL, "abc");
        let (prefix, digest) = h.split_once('_').unwrap();
        assert_eq!(prefix, "SAPISIDHASH 1700000000");
        assert_eq!(digest.len(), 40);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
