use serde::{Deserialize, Serialize};

pub use crate::ytm::renderers::{BrowseEndpoint, WatchPlaylistEndpoint};

/// Artist credit attached to a song, album or playlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistRef {
    pub name: String,
    pub id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumRef {
    pub name: String,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongItem {
    pub id: String,
    pub title: String,
    /// Never empty; songs without a resolvable artist are dropped.
    pub artists: Vec<ArtistRef>,
    pub album: Option<AlbumRef>,
    pub duration_seconds: Option<u32>,
    pub thumbnail: String,
    pub explicit: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumItem {
    pub browse_id: String,
    pub playlist_id: String,
    pub title: String,
    pub artists: Vec<ArtistRef>,
    pub year: Option<i32>,
    pub thumbnail: String,
    pub explicit: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistItem {
    pub id: String,
    pub title: String,
    pub author: ArtistRef,
    pub thumbnail: String,
    pub play_endpoint: Option<WatchPlaylistEndpoint>,
    pub shuffle_endpoint: WatchPlaylistEndpoint,
    pub radio_endpoint: Option<WatchPlaylistEndpoint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistItem {
    pub id: String,
    pub title: String,
    pub thumbnail: String,
    pub shuffle_endpoint: WatchPlaylistEndpoint,
    pub radio_endpoint: WatchPlaylistEndpoint,
}

/// A normalized entry of any page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum YtItem {
    Song(SongItem),
    Album(AlbumItem),
    Playlist(PlaylistItem),
    Artist(ArtistItem),
}

impl YtItem {
    pub fn id(&self) -> &str {
        match self {
            YtItem::Song(s) => &s.id,
            YtItem::Album(a) => &a.browse_id,
            YtItem::Playlist(p) => &p.id,
            YtItem::Artist(a) => &a.id,
        }
    }

    /// Playlists and artists never carry the explicit badge.
    pub fn explicit(&self) -> bool {
        match self {
            YtItem::Song(s) => s.explicit,
            YtItem::Album(a) => a.explicit,
            YtItem::Playlist(_) | YtItem::Artist(_) => false,
        }
    }

    /// One-line label used by the headless commands.
    pub fn describe(&self) -> String {
        let names = |artists: &[ArtistRef]| {
            artists
                .iter()
                .map(|a| a.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        };
        match self {
            YtItem::Song(s) => format!("[song] {} - {}", s.title, names(&s.artists)),
            YtItem::Album(a) => match a.year {
                Some(y) => format!("[album] {} - {} ({y})", a.title, names(&a.artists)),
                None => format!("[album] {} - {}", a.title, names(&a.artists)),
            },
            YtItem::Playlist(p) => format!("[playlist] {} by {}", p.title, p.author.name),
            YtItem::Artist(a) => format!("[artist] {}", a.title),
        }
    }
}
