//! Maps single renderer nodes to domain items.
//!
//! Every function here returns `None` when a required field cannot be
//! resolved. Callers drop such nodes; partial items never leave this module.

use crate::ytm::models::{
    AlbumItem, AlbumRef, ArtistItem, ArtistRef, PlaylistItem, SongItem, WatchPlaylistEndpoint,
    YtItem,
};
use crate::ytm::renderers::{
    Badge, Menu, MusicResponsiveListItemRenderer, MusicTwoRowItemRenderer, NavigationEndpoint,
    Run, Runs, ThumbnailOverlay, ThumbnailRenderer,
};

pub const EXPLICIT_BADGE: &str = "MUSIC_EXPLICIT_BADGE";
pub const SHUFFLE_ICON: &str = "MUSIC_SHUFFLE";
pub const RADIO_ICON: &str = "MIX";

const ARTIST_ID_PREFIX: &str = "UC";
const ALBUM_ID_PREFIX: &str = "MPREb_";
const PLAYLIST_ID_PREFIX: &str = "VL";

const PAGE_TYPE_ALBUM: &str = "MUSIC_PAGE_TYPE_ALBUM";
const PAGE_TYPE_AUDIOBOOK: &str = "MUSIC_PAGE_TYPE_AUDIOBOOK";
const PAGE_TYPE_PLAYLIST: &str = "MUSIC_PAGE_TYPE_PLAYLIST";
const PAGE_TYPE_ARTIST: &str = "MUSIC_PAGE_TYPE_ARTIST";
const PAGE_TYPE_USER_CHANNEL: &str = "MUSIC_PAGE_TYPE_USER_CHANNEL";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemKind {
    Song,
    Album,
    Playlist,
    Artist,
}

/// Decides what a node links to. Page types are preferred; browse id prefixes
/// are the fallback when the context config is missing.
fn classify(endpoint: &NavigationEndpoint) -> Option<ItemKind> {
    if endpoint.watch_endpoint.is_some() {
        return Some(ItemKind::Song);
    }
    let browse = endpoint.browse_endpoint.as_ref()?;
    let page_type = browse
        .browse_endpoint_context_supported_configs
        .as_ref()
        .and_then(|c| c.browse_endpoint_context_music_config.as_ref())
        .and_then(|c| c.page_type.as_deref());
    match page_type {
        Some(PAGE_TYPE_ALBUM | PAGE_TYPE_AUDIOBOOK) => Some(ItemKind::Album),
        Some(PAGE_TYPE_PLAYLIST) => Some(ItemKind::Playlist),
        Some(PAGE_TYPE_ARTIST | PAGE_TYPE_USER_CHANNEL) => Some(ItemKind::Artist),
        Some(_) => None,
        None => {
            let id = browse.browse_id.as_deref()?;
            if id.starts_with(ALBUM_ID_PREFIX) {
                Some(ItemKind::Album)
            } else if id.starts_with(PLAYLIST_ID_PREFIX) {
                Some(ItemKind::Playlist)
            } else if id.starts_with(ARTIST_ID_PREFIX) {
                Some(ItemKind::Artist)
            } else {
                None
            }
        }
    }
}

/// Normalizes a carousel/grid card.
pub fn from_two_row(r: &MusicTwoRowItemRenderer) -> Option<YtItem> {
    match classify(r.navigation_endpoint.as_ref()?)? {
        ItemKind::Song => song_from_two_row(r).map(YtItem::Song),
        ItemKind::Album => album_from_two_row(r).map(YtItem::Album),
        ItemKind::Playlist => playlist_from_two_row(r).map(YtItem::Playlist),
        ItemKind::Artist => artist_from_two_row(r).map(YtItem::Artist),
    }
}

/// Normalizes a list row. Rows without a navigation endpoint of their own are
/// songs when they carry a video id.
pub fn from_responsive(r: &MusicResponsiveListItemRenderer) -> Option<YtItem> {
    let kind = match r.navigation_endpoint.as_ref() {
        Some(endpoint) => classify(endpoint)?,
        None => ItemKind::Song,
    };
    match kind {
        ItemKind::Song => song_from_responsive(r).map(YtItem::Song),
        ItemKind::Album => album_from_responsive(r).map(YtItem::Album),
        ItemKind::Playlist => playlist_from_responsive(r).map(YtItem::Playlist),
        ItemKind::Artist => artist_from_responsive(r).map(YtItem::Artist),
    }
}

pub fn song_from_two_row(r: &MusicTwoRowItemRenderer) -> Option<SongItem> {
    let id = watch_video_id(r.navigation_endpoint.as_ref())?;
    let title = first_text(r.title.as_ref())?;
    let runs = runs_of(r.subtitle.as_ref());
    let artists = artist_refs(runs);
    if artists.is_empty() {
        return None;
    }
    let thumbnail = thumbnail_url(r.thumbnail_renderer.as_ref())?;

    Some(SongItem {
        id,
        title,
        artists,
        album: album_ref(runs),
        // Cards never show a duration.
        duration_seconds: None,
        thumbnail,
        explicit: is_explicit(&r.subtitle_badges),
    })
}

pub fn album_from_two_row(r: &MusicTwoRowItemRenderer) -> Option<AlbumItem> {
    let browse_id = browse_id(r.navigation_endpoint.as_ref())?;
    let playlist_id = play_endpoint(r.thumbnail_overlay.as_ref())?.playlist_id;
    let title = first_text(r.title.as_ref())?;
    let thumbnail = thumbnail_url(r.thumbnail_renderer.as_ref())?;
    let runs = runs_of(r.subtitle.as_ref());

    Some(AlbumItem {
        browse_id,
        playlist_id,
        title,
        artists: artist_refs(runs),
        year: year_of(runs),
        thumbnail,
        explicit: is_explicit(&r.subtitle_badges),
    })
}

pub fn playlist_from_two_row(r: &MusicTwoRowItemRenderer) -> Option<PlaylistItem> {
    let id = playlist_id(r.navigation_endpoint.as_ref())?;
    let title = first_text(r.title.as_ref())?;
    let author = runs_of(r.subtitle.as_ref()).last().and_then(artist_ref)?;
    let thumbnail = thumbnail_url(r.thumbnail_renderer.as_ref())?;
    let shuffle_endpoint = menu_endpoint(r.menu.as_ref(), SHUFFLE_ICON)?;

    Some(PlaylistItem {
        id,
        title,
        author,
        thumbnail,
        play_endpoint: play_endpoint(r.thumbnail_overlay.as_ref()),
        shuffle_endpoint,
        radio_endpoint: menu_endpoint(r.menu.as_ref(), RADIO_ICON),
    })
}

pub fn artist_from_two_row(r: &MusicTwoRowItemRenderer) -> Option<ArtistItem> {
    Some(ArtistItem {
        id: browse_id(r.navigation_endpoint.as_ref())?,
        title: first_text(r.title.as_ref())?,
        thumbnail: thumbnail_url(r.thumbnail_renderer.as_ref())?,
        shuffle_endpoint: menu_endpoint(r.menu.as_ref(), SHUFFLE_ICON)?,
        radio_endpoint: menu_endpoint(r.menu.as_ref(), RADIO_ICON)?,
    })
}

pub fn song_from_responsive(r: &MusicResponsiveListItemRenderer) -> Option<SongItem> {
    let id = r
        .playlist_item_data
        .as_ref()
        .and_then(|d| non_empty(d.video_id.as_deref()))
        .or_else(|| {
            flex_runs(r, 0)
                .first()
                .and_then(|run| watch_video_id(run.navigation_endpoint.as_ref()))
        })
        .or_else(|| watch_video_id(r.navigation_endpoint.as_ref()))?;
    let title = first_text(flex_column(r, 0))?;

    let detail_runs: Vec<&Run> = (1..r.flex_columns.len())
        .flat_map(|i| flex_runs(r, i).iter())
        .collect();
    let artists: Vec<ArtistRef> = detail_runs
        .iter()
        .filter(|run| links_to(run, ARTIST_ID_PREFIX))
        .filter_map(|run| artist_ref(run))
        .collect();
    if artists.is_empty() {
        return None;
    }
    let album = detail_runs
        .iter()
        .find(|run| links_to(run, ALBUM_ID_PREFIX))
        .and_then(|run| album_ref_from_run(run));
    let thumbnail = thumbnail_url(r.thumbnail.as_ref())?;

    Some(SongItem {
        id,
        title,
        artists,
        album,
        // Supplied by the caller from the player; column positions vary.
        duration_seconds: None,
        thumbnail,
        explicit: is_explicit(&r.badges),
    })
}

pub fn album_from_responsive(r: &MusicResponsiveListItemRenderer) -> Option<AlbumItem> {
    let browse_id = browse_id(r.navigation_endpoint.as_ref())?;
    let playlist_id = play_endpoint(r.overlay.as_ref())?.playlist_id;
    let title = first_text(flex_column(r, 0))?;
    let thumbnail = thumbnail_url(r.thumbnail.as_ref())?;
    let runs = flex_runs(r, 1);

    Some(AlbumItem {
        browse_id,
        playlist_id,
        title,
        artists: artist_refs(runs),
        year: year_of(runs),
        thumbnail,
        explicit: is_explicit(&r.badges),
    })
}

pub fn playlist_from_responsive(r: &MusicResponsiveListItemRenderer) -> Option<PlaylistItem> {
    let id = playlist_id(r.navigation_endpoint.as_ref())?;
    let title = first_text(flex_column(r, 0))?;
    let runs = flex_runs(r, 1);
    let author = runs
        .iter()
        .find(|run| links_to(run, ARTIST_ID_PREFIX))
        .or_else(|| runs.iter().find(|run| !is_separator(run)))
        .and_then(artist_ref)?;
    let thumbnail = thumbnail_url(r.thumbnail.as_ref())?;
    let shuffle_endpoint = menu_endpoint(r.menu.as_ref(), SHUFFLE_ICON)?;

    Some(PlaylistItem {
        id,
        title,
        author,
        thumbnail,
        play_endpoint: play_endpoint(r.overlay.as_ref()),
        shuffle_endpoint,
        radio_endpoint: menu_endpoint(r.menu.as_ref(), RADIO_ICON),
    })
}

pub fn artist_from_responsive(r: &MusicResponsiveListItemRenderer) -> Option<ArtistItem> {
    Some(ArtistItem {
        id: browse_id(r.navigation_endpoint.as_ref())?,
        title: first_text(flex_column(r, 0))?,
        thumbnail: thumbnail_url(r.thumbnail.as_ref())?,
        shuffle_endpoint: menu_endpoint(r.menu.as_ref(), SHUFFLE_ICON)?,
        radio_endpoint: menu_endpoint(r.menu.as_ref(), RADIO_ICON)?,
    })
}

fn non_empty(s: Option<&str>) -> Option<String> {
    s.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

fn runs_of(runs: Option<&Runs>) -> &[Run] {
    runs.map(|r| r.runs.as_slice()).unwrap_or_default()
}

fn first_text(runs: Option<&Runs>) -> Option<String> {
    non_empty(runs_of(runs).first()?.text.as_deref())
}

fn flex_column(r: &MusicResponsiveListItemRenderer, index: usize) -> Option<&Runs> {
    r.flex_columns
        .get(index)?
        .music_responsive_list_item_flex_column_renderer
        .as_ref()?
        .text
        .as_ref()
}

fn flex_runs(r: &MusicResponsiveListItemRenderer, index: usize) -> &[Run] {
    runs_of(flex_column(r, index))
}

fn watch_video_id(endpoint: Option<&NavigationEndpoint>) -> Option<String> {
    non_empty(endpoint?.watch_endpoint.as_ref()?.video_id.as_deref())
}

fn browse_id(endpoint: Option<&NavigationEndpoint>) -> Option<String> {
    non_empty(endpoint?.browse_endpoint.as_ref()?.browse_id.as_deref())
}

fn playlist_id(endpoint: Option<&NavigationEndpoint>) -> Option<String> {
    let id = browse_id(endpoint)?;
    let id = id.strip_prefix(PLAYLIST_ID_PREFIX).unwrap_or(&id);
    non_empty(Some(id))
}

fn run_browse_id(run: &Run) -> Option<&str> {
    run.navigation_endpoint
        .as_ref()?
        .browse_endpoint
        .as_ref()?
        .browse_id
        .as_deref()
}

fn links_to(run: &Run, prefix: &str) -> bool {
    run_browse_id(run).is_some_and(|id| id.starts_with(prefix))
}

fn is_separator(run: &Run) -> bool {
    matches!(
        run.text.as_deref().map(str::trim),
        None | Some("" | "•" | "&" | ",")
    )
}

fn artist_ref(run: &Run) -> Option<ArtistRef> {
    Some(ArtistRef {
        name: non_empty(run.text.as_deref())?,
        id: run_browse_id(run).map(str::to_string),
    })
}

fn album_ref_from_run(run: &Run) -> Option<AlbumRef> {
    Some(AlbumRef {
        name: non_empty(run.text.as_deref())?,
        id: run_browse_id(run)?.to_string(),
    })
}

/// Subtitle runs that navigate to a channel.
fn artist_refs(runs: &[Run]) -> Vec<ArtistRef> {
    runs.iter()
        .filter(|run| links_to(run, ARTIST_ID_PREFIX))
        .filter_map(artist_ref)
        .collect()
}

fn album_ref(runs: &[Run]) -> Option<AlbumRef> {
    runs.iter()
        .find(|run| links_to(run, ALBUM_ID_PREFIX))
        .and_then(album_ref_from_run)
}

fn year_of(runs: &[Run]) -> Option<i32> {
    runs.last()?.text.as_deref()?.trim().parse().ok()
}

fn is_explicit(badges: &[Badge]) -> bool {
    badges.iter().any(|b| {
        b.music_inline_badge_renderer
            .as_ref()
            .and_then(|r| r.icon.as_ref())
            .and_then(|i| i.icon_type.as_deref())
            == Some(EXPLICIT_BADGE)
    })
}

/// Largest thumbnail; YouTube lists them in ascending size.
fn thumbnail_url(r: Option<&ThumbnailRenderer>) -> Option<String> {
    let thumbnails = &r?.music_thumbnail_renderer.as_ref()?.thumbnail.as_ref()?.thumbnails;
    non_empty(Some(thumbnails.last()?.url.as_str()))
}

fn play_endpoint(overlay: Option<&ThumbnailOverlay>) -> Option<WatchPlaylistEndpoint> {
    overlay?
        .music_item_thumbnail_overlay_renderer
        .as_ref()?
        .content
        .as_ref()?
        .music_play_button_renderer
        .as_ref()?
        .play_navigation_endpoint
        .as_ref()?
        .watch_playlist_endpoint
        .clone()
        .filter(|e| !e.playlist_id.is_empty())
}

fn menu_endpoint(menu: Option<&Menu>, icon_type: &str) -> Option<WatchPlaylistEndpoint> {
    menu?
        .menu_renderer
        .as_ref()?
        .items
        .iter()
        .filter_map(|item| item.menu_navigation_item_renderer.as_ref())
        .find(|item| {
            item.icon.as_ref().and_then(|i| i.icon_type.as_deref()) == Some(icon_type)
        })?
        .navigation_endpoint
        .as_ref()?
        .watch_playlist_endpoint
        .clone()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use serde_json::{Value, json};

    pub fn artist_run(name: &str, id: &str) -> Value {
        json!({ "text": name, "navigationEndpoint": { "browseEndpoint": { "browseId": id } } })
    }

    pub fn thumbnail(url: &str) -> Value {
        json!({ "musicThumbnailRenderer": { "thumbnail": { "thumbnails": [
            { "url": format!("{url}?s=60"), "width": 60, "height": 60 },
            { "url": url, "width": 226, "height": 226 }
        ] } } })
    }

    fn menu(items: &[(&str, &str)]) -> Value {
        let items: Vec<Value> = items
            .iter()
            .map(|(icon, playlist)| {
                json!({ "menuNavigationItemRenderer": {
                    "icon": { "iconType": icon },
                    "navigationEndpoint": { "watchPlaylistEndpoint": { "playlistId": playlist } }
                } })
            })
            .collect();
        json!({ "menuRenderer": { "items": items } })
    }

    fn play_overlay(playlist_id: &str) -> Value {
        json!({ "musicItemThumbnailOverlayRenderer": { "content": { "musicPlayButtonRenderer": {
            "playNavigationEndpoint": { "watchPlaylistEndpoint": { "playlistId": playlist_id } }
        } } } })
    }

    fn browse(id: &str, page_type: &str) -> Value {
        json!({ "browseEndpoint": {
            "browseId": id,
            "browseEndpointContextSupportedConfigs": {
                "browseEndpointContextMusicConfig": { "pageType": page_type }
            }
        } })
    }

    pub fn song_card(video_id: &str, title: &str, explicit: bool) -> Value {
        let badges = if explicit {
            json!([{ "musicInlineBadgeRenderer": { "icon": { "iconType": "MUSIC_EXPLICIT_BADGE" } } }])
        } else {
            json!([])
        };
        json!({ "musicTwoRowItemRenderer": {
            "title": { "runs": [{ "text": title }] },
            "subtitle": { "runs": [
                { "text": "Song" },
                { "text": " • " },
                artist_run("Artist", "UCartist"),
                { "text": " • " },
                artist_run("Record", "MPREb_record")
            ] },
            "subtitleBadges": badges,
            "thumbnailRenderer": thumbnail(&format!("https://img/{video_id}")),
            "navigationEndpoint": { "watchEndpoint": { "videoId": video_id } }
        } })
    }

    pub fn album_card(browse_id: &str, with_overlay: bool) -> Value {
        let mut node = json!({ "musicTwoRowItemRenderer": {
            "title": { "runs": [{ "text": "Record" }] },
            "subtitle": { "runs": [
                { "text": "Album" },
                { "text": " • " },
                artist_run("Artist", "UCartist"),
                { "text": " • " },
                { "text": "2019" }
            ] },
            "thumbnailRenderer": thumbnail("https://img/record"),
            "navigationEndpoint": browse(browse_id, "MUSIC_PAGE_TYPE_ALBUM")
        } });
        if with_overlay {
            node["musicTwoRowItemRenderer"]["thumbnailOverlay"] = play_overlay("OLAK5uy_record");
        }
        node
    }

    pub fn playlist_card(browse_id: &str, menu_items: &[(&str, &str)]) -> Value {
        json!({ "musicTwoRowItemRenderer": {
            "title": { "runs": [{ "text": "Mix" }] },
            "subtitle": { "runs": [
                { "text": "Playlist" },
                { "text": " • " },
                artist_run("Curator", "UCcurator")
            ] },
            "thumbnailRenderer": thumbnail("https://img/mix"),
            "thumbnailOverlay": play_overlay("PLmix"),
            "menu": menu(menu_items),
            "navigationEndpoint": browse(browse_id, "MUSIC_PAGE_TYPE_PLAYLIST")
        } })
    }

    pub fn artist_card(browse_id: &str, menu_items: &[(&str, &str)]) -> Value {
        json!({ "musicTwoRowItemRenderer": {
            "title": { "runs": [{ "text": "Artist" }] },
            "subtitle": { "runs": [{ "text": "1.2M subscribers" }] },
            "thumbnailRenderer": thumbnail("https://img/artist"),
            "menu": menu(menu_items),
            "navigationEndpoint": browse(browse_id, "MUSIC_PAGE_TYPE_ARTIST")
        } })
    }

    fn row(title: &str, detail_runs: Value, navigation: Value) -> Value {
        json!({ "musicResponsiveListItemRenderer": {
            "flexColumns": [
                { "musicResponsiveListItemFlexColumnRenderer": { "text": { "runs": [{ "text": title }] } } },
                { "musicResponsiveListItemFlexColumnRenderer": { "text": { "runs": detail_runs } } }
            ],
            "thumbnail": thumbnail(&format!("https://img/{title}")),
            "navigationEndpoint": navigation
        } })
    }

    pub fn album_row(browse_id: &str, with_overlay: bool) -> Value {
        let mut node = row(
            "Record",
            json!([artist_run("Artist", "UCartist"), { "text": " • " }, { "text": "2021" }]),
            browse(browse_id, "MUSIC_PAGE_TYPE_ALBUM"),
        );
        if with_overlay {
            node["musicResponsiveListItemRenderer"]["overlay"] = play_overlay("OLAK5uy_row");
        }
        node
    }

    pub fn playlist_row(browse_id: &str, detail_runs: Value, menu_items: &[(&str, &str)]) -> Value {
        let mut node = row("Mix", detail_runs, browse(browse_id, "MUSIC_PAGE_TYPE_PLAYLIST"));
        node["musicResponsiveListItemRenderer"]["menu"] = menu(menu_items);
        node
    }

    pub fn artist_row(browse_id: &str, menu_items: &[(&str, &str)]) -> Value {
        let mut node = row(
            "Artist",
            json!([{ "text": "Artist" }, { "text": " • " }, { "text": "3M subscribers" }]),
            browse(browse_id, "MUSIC_PAGE_TYPE_ARTIST"),
        );
        node["musicResponsiveListItemRenderer"]["menu"] = menu(menu_items);
        node
    }

    pub fn song_row(video_id: &str, title: &str) -> Value {
        json!({ "musicResponsiveListItemRenderer": {
            "flexColumns": [
                { "musicResponsiveListItemFlexColumnRenderer": { "text": { "runs": [{
                    "text": title,
                    "navigationEndpoint": { "watchEndpoint": { "videoId": video_id } }
                }] } } },
                { "musicResponsiveListItemFlexColumnRenderer": { "text": { "runs": [
                    artist_run("Artist", "UCartist"),
                    { "text": " • " },
                    artist_run("Record", "MPREb_record")
                ] } } }
            ],
            "fixedColumns": [
                { "musicResponsiveListItemFixedColumnRenderer": { "text": { "runs": [{ "text": "3:45" }] } } }
            ],
            "thumbnail": thumbnail(&format!("https://img/{video_id}")),
            "playlistItemData": { "videoId": video_id }
        } })
    }
}
