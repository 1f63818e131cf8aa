mod config;
mod lyrics;
mod storage;
mod ytm;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use lyrics::{LyricsQuery, LyricsService, TokenManager};
use std::sync::Arc;
use storage::StorageHandle;
use tracing_subscriber::EnvFilter;
use ytm::pages::FilterExplicit;

#[derive(Debug, Parser)]
#[command(name = "tunefeed", version, about = "YouTube Music feeds and synced lyrics (headless)")]
struct Cli {
    /// Override config file path.
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    /// Print JSON instead of a listing.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the Home feed, or a later page of it.
    Home {
        #[arg(long)]
        continuation: Option<String>,
    },
    /// Print the first page of a library tab (e.g. FEmusic_liked_albums).
    Library { browse_id: String },
    /// Fetch the next page of a paged listing.
    Continuation {
        #[arg(value_enum)]
        kind: ContinuationKind,
        token: String,
    },
    /// Dump a raw browse response (headless).
    BrowseJson { browse_id: String },
    /// Look up lyrics for a track.
    Lyrics {
        title: String,
        artist: String,
        /// Track length in seconds; improves matching.
        #[arg(long)]
        duration: Option<u32>,
    },
    /// Parse a lyrics file offline.
    ParseLyrics {
        file: std::path::PathBuf,
        /// Treat the file as plain text instead of Musixmatch subtitles.
        #[arg(long)]
        unsynced: bool,
    },
    /// Manage the lyrics provider session token.
    Token {
        #[command(subcommand)]
        cmd: TokenCommand,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ContinuationKind {
    Library,
    ArtistItems,
    Playlist,
}

#[derive(Debug, Subcommand)]
enum TokenCommand {
    /// Show whether a usable token is stored.
    Show,
    /// Acquire a new token now.
    Refresh,
    /// Delete the stored token; a new one is acquired on the next lookup.
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries command output
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref()).context("load config")?;
    let hide_explicit = cfg.content.hide_explicit;

    match cli.command {
        Command::Home { continuation } => {
            let ytm = make_client(&cfg)?;
            let page = match continuation {
                Some(token) => ytm.home_continuation(&token).await?,
                None => ytm.home().await?,
            }
            .filter_explicit(hide_explicit);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&page)?);
            } else {
                for section in &page.sections {
                    println!("## {} ({:?})", section.title, section.section_type);
                    print_items(&section.items);
                }
                print_continuation(page.continuation.as_deref());
            }
        }
        Command::Library { browse_id } => {
            let ytm = make_client(&cfg)?;
            let page = ytm.library(&browse_id).await?.filter_explicit(hide_explicit);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&page)?);
            } else {
                print_items(&page.items);
                print_continuation(page.continuation.as_deref());
            }
        }
        Command::Continuation { kind, token } => {
            let ytm = make_client(&cfg)?;
            let (items, next, json) = match kind {
                ContinuationKind::Library => {
                    let p = ytm.library_continuation(&token).await?.filter_explicit(hide_explicit);
                    let json = serde_json::to_string_pretty(&p)?;
                    (p.items, p.continuation, json)
                }
                ContinuationKind::ArtistItems => {
                    let p = ytm
                        .artist_items_continuation(&token)
                        .await?
                        .filter_explicit(hide_explicit);
                    let json = serde_json::to_string_pretty(&p)?;
                    (p.items, p.continuation, json)
                }
                ContinuationKind::Playlist => {
                    let p = ytm.playlist_continuation(&token).await?.filter_explicit(hide_explicit);
                    let json = serde_json::to_string_pretty(&p)?;
                    let items = p.songs.into_iter().map(ytm::models::YtItem::Song).collect();
                    (items, p.continuation, json)
                }
            };
            if cli.json {
                println!("{json}");
            } else {
                print_items(&items);
                print_continuation(next.as_deref());
            }
        }
        Command::BrowseJson { browse_id } => {
            let ytm = make_client(&cfg)?;
            let v = ytm.browse_raw(&browse_id).await?;
            println!("{}", serde_json::to_string_pretty(&v)?);
        }
        Command::Lyrics {
            title,
            artist,
            duration,
        } => {
            let service = make_lyrics_service(&cfg).await?;
            let query = LyricsQuery {
                title,
                artist,
                duration_secs: duration,
            };
            match service.get_lyrics(&query).await {
                Ok(Some(lyrics)) => print_lyrics(&lyrics, cli.json)?,
                Ok(None) => println!("No lyrics found."),
                Err(e @ lyrics::LyricsError::Auth(_)) => {
                    anyhow::bail!("{e} (try again later or run `tunefeed token refresh`)")
                }
                Err(e) => return Err(e).context("lyrics lookup"),
            }
        }
        Command::ParseLyrics { file, unsynced } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("read {}", file.display()))?;
            let parsed = if unsynced {
                lyrics::parser::parse_unsynced_lyrics(&raw)
            } else {
                lyrics::parser::parse_musixmatch_lyrics(&raw)
            };
            print_lyrics(&parsed, cli.json)?;
        }
        Command::Token { cmd } => {
            let handle = StorageHandle::new(cfg.database_path());
            match cmd {
                TokenCommand::Show => {
                    let tokens = make_token_manager(&handle).await;
                    match tokens.current().await {
                        Some(t) => println!("Stored token: {}…", t.chars().take(8).collect::<String>()),
                        None => println!("No usable token stored."),
                    }
                }
                TokenCommand::Refresh => {
                    let tokens = make_token_manager(&handle).await;
                    let client = lyrics::MusixmatchClient::new(&cfg.lyrics.musixmatch_app_id, tokens.clone())?;
                    if let Some(old) = tokens.current().await {
                        tokens.invalidate(&old).await;
                    }
                    tokens
                        .refresh(|| client.request_token())
                        .await
                        .context("acquire lyrics token")?;
                    println!("Acquired a new token.");
                }
                TokenCommand::Clear => {
                    let removed = handle.token_store(lyrics::Provider::Musixmatch.name()).clear()?;
                    println!("{}", if removed { "Cleared stored token." } else { "No stored token." });
                }
            }
        }
    }

    Ok(())
}

fn make_client(cfg: &config::Config) -> anyhow::Result<ytm::api::YtmClient> {
    let auth = match (cfg.ytm.cookies.as_deref(), cfg.ytm.cookie_header.as_deref()) {
        (Some(p), _) if p.exists() => Some(ytm::auth::load_netscape_cookies(p)?),
        (_, Some(header)) if !header.trim().is_empty() => {
            Some(ytm::auth::AuthState::from_cookie_header(header))
        }
        _ => None,
    };
    ytm::api::YtmClient::new(auth)
}

/// Creates the process-wide token manager and tries the persisted token.
async fn make_token_manager(handle: &StorageHandle) -> Arc<TokenManager> {
    let store = handle.token_store(lyrics::Provider::Musixmatch.name());
    let tokens = Arc::new(TokenManager::new(Some(Arc::new(store))));
    if let Err(e) = tokens.load_persisted().await {
        tracing::warn!("load persisted lyrics token: {e:#}");
    }
    tokens
}

async fn make_lyrics_service(cfg: &config::Config) -> anyhow::Result<LyricsService> {
    let handle = StorageHandle::new(cfg.database_path());
    let tokens = make_token_manager(&handle).await;
    Ok(LyricsService::new(
        lyrics::MusixmatchClient::new(&cfg.lyrics.musixmatch_app_id, tokens)?,
        lyrics::LrclibClient::new()?,
        cfg.lyrics.providers.clone(),
        cfg.lyrics.cache_size,
        Some(handle),
    ))
}

fn print_items(items: &[ytm::models::YtItem]) {
    for (i, item) in items.iter().enumerate() {
        let explicit = if item.explicit() { " [E]" } else { "" };
        println!("{:02}. {}{}  (id={})", i + 1, item.describe(), explicit, item.id());
    }
}

fn print_continuation(token: Option<&str>) {
    if let Some(t) = token {
        println!("-- more: {t}");
    }
}

fn print_lyrics(lyrics: &lyrics::Lyrics, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(lyrics)?);
        return Ok(());
    }
    for line in &lyrics.lines {
        if lyrics.is_synced() {
            let ms = line.start_ms();
            println!("[{:02}:{:02}.{:03}] {}", ms / 60_000, (ms % 60_000) / 1000, ms % 1000, line.words);
        } else {
            println!("{}", line.words);
        }
    }
    Ok(())
}
