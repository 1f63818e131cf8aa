use crate::lyrics::Lyrics;
use crate::lyrics::token::TokenPersistence;
use anyhow::Context;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::{Path, PathBuf};

pub struct Storage {
    conn: Connection,
}

impl Storage {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create dir {}", parent.display()))?;
        }

        let conn = Connection::open(path).with_context(|| format!("open {}", path.display()))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> anyhow::Result<Self> {
        let s = Self { conn };
        s.init_schema()?;
        Ok(s)
    }

    fn init_schema(&self) -> anyhow::Result<()> {
        self.conn
            .execute_batch(
                r#"
CREATE TABLE IF NOT EXISTS auth_tokens (
  provider TEXT PRIMARY KEY,
  token TEXT NOT NULL,
  updated_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS lyrics_cache (
  cache_key TEXT PRIMARY KEY,
  lyrics_json TEXT NOT NULL,
  synced INTEGER DEFAULT 0,
  fetched_at INTEGER NOT NULL
);
"#,
            )
            .context("init schema")?;
        Ok(())
    }

    pub fn get_token(&self, provider: &str) -> anyhow::Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT token FROM auth_tokens WHERE provider=?1",
                params![provider],
                |row| row.get(0),
            )
            .optional()
            .context("query auth token")
    }

    pub fn save_token(&self, provider: &str, token: &str, now_unix: i64) -> anyhow::Result<()> {
        self.conn
            .execute(
                r#"
INSERT INTO auth_tokens(provider, token, updated_at)
VALUES(?1, ?2, ?3)
ON CONFLICT(provider) DO UPDATE SET
  token=excluded.token,
  updated_at=excluded.updated_at
"#,
                params![provider, token, now_unix],
            )
            .context("save auth token")?;
        Ok(())
    }

    pub fn clear_token(&self, provider: &str) -> anyhow::Result<bool> {
        let n = self
            .conn
            .execute("DELETE FROM auth_tokens WHERE provider=?1", params![provider])
            .context("clear auth token")?;
        Ok(n > 0)
    }

    /// Cache lyrics for a track
    pub fn cache_lyrics(
        &self,
        cache_key: &str,
        lyrics: &Lyrics,
        now_unix: i64,
    ) -> anyhow::Result<()> {
        let json = serde_json::to_string(lyrics).context("serialize lyrics")?;
        self.conn
            .execute(
                r#"
INSERT INTO lyrics_cache(cache_key, lyrics_json, synced, fetched_at)
VALUES(?1, ?2, ?3, ?4)
ON CONFLICT(cache_key) DO UPDATE SET
  lyrics_json=excluded.lyrics_json,
  synced=excluded.synced,
  fetched_at=excluded.fetched_at
"#,
                params![cache_key, json, lyrics.is_synced() as i32, now_unix],
            )
            .context("cache lyrics")?;
        Ok(())
    }

    /// Get cached lyrics. Rows that no longer decode are treated as misses.
    pub fn get_lyrics(&self, cache_key: &str) -> anyhow::Result<Option<Lyrics>> {
        let json: Option<String> = self
            .conn
            .query_row(
                "SELECT lyrics_json FROM lyrics_cache WHERE cache_key=?1",
                params![cache_key],
                |row| row.get(0),
            )
            .optional()
            .context("query lyrics cache")?;
        Ok(json.and_then(|j| serde_json::from_str(&j).ok()))
    }
}

/// Cloneable, `Send` handle that opens the database per call, for use from
/// blocking tasks.
#[derive(Debug, Clone)]
pub struct StorageHandle {
    path: PathBuf,
}

impl StorageHandle {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn open(&self) -> anyhow::Result<Storage> {
        Storage::open(&self.path)
    }

    pub fn get_lyrics(&self, cache_key: &str) -> anyhow::Result<Option<Lyrics>> {
        self.open()?.get_lyrics(cache_key)
    }

    pub fn cache_lyrics(&self, cache_key: &str, lyrics: &Lyrics, now_unix: i64) -> anyhow::Result<()> {
        self.open()?.cache_lyrics(cache_key, lyrics, now_unix)
    }

    /// Binds this database to one provider's token row.
    pub fn token_store(&self, provider: &'static str) -> SqliteTokenStore {
        SqliteTokenStore {
            handle: self.clone(),
            provider,
        }
    }
}

pub struct SqliteTokenStore {
    handle: StorageHandle,
    provider: &'static str,
}

impl SqliteTokenStore {
    pub fn clear(&self) -> anyhow::Result<bool> {
        self.handle.open()?.clear_token(self.provider)
    }
}

impl TokenPersistence for SqliteTokenStore {
    fn load_token(&self) -> anyhow::Result<Option<String>> {
        self.handle.open()?.get_token(self.provider)
    }

    fn save_token(&self, token: &str) -> anyhow::Result<()> {
        let now = time::OffsetDateTime::now_utc().unix_timestamp();
        self.handle.open()?.save_token(self.provider, token, now)
    }
}
