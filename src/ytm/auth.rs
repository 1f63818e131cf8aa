use anyhow::Context;
use std::path::Path;

/// Cookie credentials used to sign InnerTube requests. Library pages need
/// these; the home feed works anonymously.
#[derive(Debug, Clone)]
pub struct AuthState {
    pub cookie_header: String,
    pub sapisid: Option<String>,
}

impl AuthState {
    /// From a raw `Cookie:` header value copied out of a browser session.
    pub fn from_cookie_header(header: &str) -> Self {
        let pairs: Vec<(String, String)> = header
            .split(';')
            .filter_map(|kv| {
                let (k, v) = kv.split_once('=')?;
                Some((k.trim().to_string(), v.trim().to_string()))
            })
            .collect();
        Self::from_pairs(pairs)
    }

    fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let cookie_header = pairs
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("; ");

        // Signed requests use SAPISID; __Secure-3PAPISID carries the same value.
        let find = |name: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
        };
        let sapisid = find("SAPISID").or_else(|| find("__Secure-3PAPISID"));

        Self {
            cookie_header,
            sapisid,
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.sapisid.is_some()
    }
}

/// Reads a Netscape cookie jar (the format yt-dlp and browser extensions export).
pub fn load_netscape_cookies(path: &Path) -> anyhow::Result<AuthState> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    Ok(parse_netscape_cookies(&raw))
}

fn parse_netscape_cookies(raw: &str) -> AuthState {
    let pairs = raw
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .filter_map(|line| {
            // domain \t flag \t path \t secure \t expiration \t name \t value
            let parts: Vec<&str> = line.split('\t').collect();
            if parts.len() < 7 || !parts[0].contains("youtube.com") {
                return None;
            }
            Some((parts[5].to_string(), parts[6].to_string()))
        })
        .collect();
    AuthState::from_pairs(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_string_picks_sapisid() {
        let a = AuthState::from_cookie_header("HSID=abc; SAPISID=xyz ; SID=1");
        assert_eq!(a.sapisid.as_deref(), Some("xyz"));
        assert_eq!(a.cookie_header, "HSID=abc; SAPISID=xyz; SID=1");
        assert!(a.is_logged_in());
    }

    #[test]
    fn secure_papisid_is_a_fallback() {
        let a = AuthState::from_cookie_header("__Secure-3PAPISID=sec");
        assert_eq!(a.sapisid.as_deref(), Some("sec"));
        assert!(!AuthState::from_cookie_header("PREF=f6=40").is_logged_in());
    }

    #[test]
    fn netscape_jar_keeps_youtube_cookies() {
        let raw = "# Netscape HTTP Cookie File\n\
                   .youtube.com\tTRUE\t/\tTRUE\t0\tSAPISID\tjar\n\
                   .google.com\tTRUE\t/\tTRUE\t0\tNID\tother\n\
                   broken line\n";
        let a = parse_netscape_cookies(raw);
        assert_eq!(a.cookie_header, "SAPISID=jar");
        assert_eq!(a.sapisid.as_deref(), Some("jar"));
    }
}
