//! Typed views over the InnerTube renderer trees.
//!
//! YouTube changes these shapes without notice, so every field is optional and
//! decoded leniently: a field holding an unexpected type decodes as `None` (or
//! an empty list) instead of failing the surrounding node. List elements are
//! decoded one by one and malformed elements are skipped.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

fn lenient<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let v = serde_json::Value::deserialize(d)?;
    Ok(serde_json::from_value(v).ok())
}

fn lenient_vec<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let v = serde_json::Value::deserialize(d)?;
    Ok(match v {
        serde_json::Value::Array(items) => items
            .into_iter()
            .filter_map(|x| serde_json::from_value(x).ok())
            .collect(),
        _ => Vec::new(),
    })
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Runs {
    #[serde(default, deserialize_with = "lenient_vec")]
    pub runs: Vec<Run>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Run {
    #[serde(default, deserialize_with = "lenient")]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub navigation_endpoint: Option<NavigationEndpoint>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationEndpoint {
    #[serde(default, deserialize_with = "lenient")]
    pub watch_endpoint: Option<WatchEndpoint>,
    #[serde(default, deserialize_with = "lenient")]
    pub watch_playlist_endpoint: Option<WatchPlaylistEndpoint>,
    #[serde(default, deserialize_with = "lenient")]
    pub browse_endpoint: Option<BrowseEndpoint>,
}

/// Starts playback of a single video, optionally inside a playlist context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchEndpoint {
    #[serde(default, deserialize_with = "lenient")]
    pub video_id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub playlist_id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub params: Option<String>,
}

/// Starts playback of a whole playlist (play, shuffle and radio buttons).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchPlaylistEndpoint {
    pub playlist_id: String,
    #[serde(default, deserialize_with = "lenient")]
    pub params: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowseEndpoint {
    #[serde(default, deserialize_with = "lenient")]
    pub browse_id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub params: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing)]
    pub browse_endpoint_context_supported_configs: Option<BrowseEndpointContextConfigs>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowseEndpointContextConfigs {
    #[serde(default, deserialize_with = "lenient")]
    pub browse_endpoint_context_music_config: Option<BrowseEndpointMusicConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowseEndpointMusicConfig {
    #[serde(default, deserialize_with = "lenient")]
    pub page_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThumbnailRenderer {
    #[serde(default, deserialize_with = "lenient")]
    pub music_thumbnail_renderer: Option<MusicThumbnailRenderer>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MusicThumbnailRenderer {
    #[serde(default, deserialize_with = "lenient")]
    pub thumbnail: Option<Thumbnails>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Thumbnails {
    #[serde(default, deserialize_with = "lenient_vec")]
    pub thumbnails: Vec<Thumbnail>,
}

/// Only the URL is kept; entries are ordered by ascending size.
#[derive(Debug, Clone, Deserialize)]
pub struct Thumbnail {
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    #[serde(default, deserialize_with = "lenient")]
    pub music_inline_badge_renderer: Option<InlineBadgeRenderer>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InlineBadgeRenderer {
    #[serde(default, deserialize_with = "lenient")]
    pub icon: Option<Icon>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Icon {
    #[serde(default, deserialize_with = "lenient")]
    pub icon_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Menu {
    #[serde(default, deserialize_with = "lenient")]
    pub menu_renderer: Option<MenuRenderer>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MenuRenderer {
    #[serde(default, deserialize_with = "lenient_vec")]
    pub items: Vec<MenuItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    #[serde(default, deserialize_with = "lenient")]
    pub menu_navigation_item_renderer: Option<MenuNavigationItemRenderer>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuNavigationItemRenderer {
    #[serde(default, deserialize_with = "lenient")]
    pub icon: Option<Icon>,
    #[serde(default, deserialize_with = "lenient")]
    pub navigation_endpoint: Option<NavigationEndpoint>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThumbnailOverlay {
    #[serde(default, deserialize_with = "lenient")]
    pub music_item_thumbnail_overlay_renderer: Option<ThumbnailOverlayRenderer>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ThumbnailOverlayRenderer {
    #[serde(default, deserialize_with = "lenient")]
    pub content: Option<ThumbnailOverlayContent>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThumbnailOverlayContent {
    #[serde(default, deserialize_with = "lenient")]
    pub music_play_button_renderer: Option<PlayButtonRenderer>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayButtonRenderer {
    #[serde(default, deserialize_with = "lenient")]
    pub play_navigation_endpoint: Option<NavigationEndpoint>,
}

/// Card-style item used by carousels and grids.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MusicTwoRowItemRenderer {
    #[serde(default, deserialize_with = "lenient")]
    pub title: Option<Runs>,
    #[serde(default, deserialize_with = "lenient")]
    pub subtitle: Option<Runs>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub subtitle_badges: Vec<Badge>,
    #[serde(default, deserialize_with = "lenient")]
    pub menu: Option<Menu>,
    #[serde(default, deserialize_with = "lenient")]
    pub thumbnail_renderer: Option<ThumbnailRenderer>,
    #[serde(default, deserialize_with = "lenient")]
    pub navigation_endpoint: Option<NavigationEndpoint>,
    #[serde(default, deserialize_with = "lenient")]
    pub thumbnail_overlay: Option<ThumbnailOverlay>,
}

/// Row-style item used by shelves, playlists and "quick picks" grids.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MusicResponsiveListItemRenderer {
    #[serde(default, deserialize_with = "lenient_vec")]
    pub badges: Vec<Badge>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub flex_columns: Vec<FlexColumn>,
    #[serde(default, deserialize_with = "lenient")]
    pub thumbnail: Option<ThumbnailRenderer>,
    #[serde(default, deserialize_with = "lenient")]
    pub menu: Option<Menu>,
    #[serde(default, deserialize_with = "lenient")]
    pub playlist_item_data: Option<PlaylistItemData>,
    #[serde(default, deserialize_with = "lenient")]
    pub navigation_endpoint: Option<NavigationEndpoint>,
    #[serde(default, deserialize_with = "lenient")]
    pub overlay: Option<ThumbnailOverlay>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlexColumn {
    #[serde(default, deserialize_with = "lenient")]
    pub music_responsive_list_item_flex_column_renderer: Option<ColumnRenderer>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ColumnRenderer {
    #[serde(default, deserialize_with = "lenient")]
    pub text: Option<Runs>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItemData {
    #[serde(default, deserialize_with = "lenient")]
    pub video_id: Option<String>,
}

/// One entry of a shelf, grid or continuation list.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShelfItem {
    #[serde(default, deserialize_with = "lenient")]
    pub music_two_row_item_renderer: Option<MusicTwoRowItemRenderer>,
    #[serde(default, deserialize_with = "lenient")]
    pub music_responsive_list_item_renderer: Option<MusicResponsiveListItemRenderer>,
    #[serde(default, deserialize_with = "lenient")]
    pub continuation_item_renderer: Option<ContinuationItemRenderer>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContinuationItemRenderer {
    #[serde(default, deserialize_with = "lenient")]
    pub continuation_endpoint: Option<ContinuationEndpoint>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContinuationEndpoint {
    #[serde(default, deserialize_with = "lenient")]
    pub continuation_command: Option<ContinuationCommand>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContinuationCommand {
    #[serde(default, deserialize_with = "lenient")]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Continuation {
    #[serde(default, deserialize_with = "lenient")]
    pub next_continuation_data: Option<NextContinuationData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NextContinuationData {
    #[serde(default, deserialize_with = "lenient")]
    pub continuation: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MusicCarouselShelfRenderer {
    #[serde(default, deserialize_with = "lenient")]
    pub header: Option<CarouselHeader>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub contents: Vec<ShelfItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarouselHeader {
    #[serde(default, deserialize_with = "lenient")]
    pub music_carousel_shelf_basic_header_renderer: Option<CarouselBasicHeader>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarouselBasicHeader {
    #[serde(default, deserialize_with = "lenient")]
    pub title: Option<Runs>,
    #[serde(default, deserialize_with = "lenient")]
    pub strapline: Option<Runs>,
    #[serde(default, deserialize_with = "lenient")]
    pub thumbnail: Option<ThumbnailRenderer>,
    #[serde(default, deserialize_with = "lenient")]
    pub more_content_button: Option<Button>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Button {
    #[serde(default, deserialize_with = "lenient")]
    pub button_renderer: Option<ButtonRenderer>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonRenderer {
    #[serde(default, deserialize_with = "lenient")]
    pub navigation_endpoint: Option<NavigationEndpoint>,
}

/// Vertical list of rows (`musicShelfRenderer`, `musicPlaylistShelfRenderer`
/// and their continuation counterparts share this shape).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MusicShelfRenderer {
    #[serde(default, deserialize_with = "lenient_vec")]
    pub contents: Vec<ShelfItem>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub continuations: Vec<Continuation>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridRenderer {
    #[serde(default, deserialize_with = "lenient_vec")]
    pub items: Vec<ShelfItem>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub continuations: Vec<Continuation>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionListRenderer {
    #[serde(default, deserialize_with = "lenient_vec")]
    pub contents: Vec<SectionContent>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub continuations: Vec<Continuation>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionContent {
    #[serde(default, deserialize_with = "lenient")]
    pub music_carousel_shelf_renderer: Option<MusicCarouselShelfRenderer>,
    #[serde(default, deserialize_with = "lenient")]
    pub music_shelf_renderer: Option<MusicShelfRenderer>,
    #[serde(default, deserialize_with = "lenient")]
    pub music_playlist_shelf_renderer: Option<MusicShelfRenderer>,
    #[serde(default, deserialize_with = "lenient")]
    pub grid_renderer: Option<GridRenderer>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    #[serde(default, deserialize_with = "lenient")]
    pub tab_renderer: Option<TabRenderer>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TabRenderer {
    #[serde(default, deserialize_with = "lenient")]
    pub content: Option<TabContent>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabContent {
    #[serde(default, deserialize_with = "lenient")]
    pub section_list_renderer: Option<SectionListRenderer>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowseContents {
    #[serde(default, deserialize_with = "lenient")]
    pub single_column_browse_results_renderer: Option<TabsRenderer>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TabsRenderer {
    #[serde(default, deserialize_with = "lenient_vec")]
    pub tabs: Vec<Tab>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContinuationContents {
    #[serde(default, deserialize_with = "lenient")]
    pub section_list_continuation: Option<SectionListRenderer>,
    #[serde(default, deserialize_with = "lenient")]
    pub music_shelf_continuation: Option<MusicShelfRenderer>,
    #[serde(default, deserialize_with = "lenient")]
    pub music_playlist_shelf_continuation: Option<MusicShelfRenderer>,
    #[serde(default, deserialize_with = "lenient")]
    pub grid_continuation: Option<GridRenderer>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseAction {
    #[serde(default, deserialize_with = "lenient")]
    pub append_continuation_items_action: Option<AppendContinuationItems>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendContinuationItems {
    #[serde(default, deserialize_with = "lenient_vec")]
    pub continuation_items: Vec<ShelfItem>,
}

/// Top-level envelope of `browse` responses, both first pages and
/// continuations.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowseResponse {
    #[serde(default, deserialize_with = "lenient")]
    pub contents: Option<BrowseContents>,
    #[serde(default, deserialize_with = "lenient")]
    pub continuation_contents: Option<ContinuationContents>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub on_response_received_actions: Vec<ResponseAction>,
}

impl BrowseResponse {
    /// Decodes an envelope; anything that is not an object yields an empty one.
    pub fn from_value(v: &serde_json::Value) -> Self {
        Self::deserialize(v).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn mistyped_fields_decode_as_absent() {
        let r: MusicTwoRowItemRenderer = serde_json::from_value(json!({
            "title": "not runs",
            "subtitle": { "runs": [{ "text": 5 }, { "text": "Artist" }] },
            "subtitleBadges": 12,
        }))
        .unwrap();
        assert!(r.title.is_none());
        assert!(r.subtitle_badges.is_empty());
        let runs = r.subtitle.unwrap().runs;
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].text, None);
        assert_eq!(runs[1].text.as_deref(), Some("Artist"));
    }

    #[test]
    fn malformed_list_elements_are_skipped() {
        let t: Thumbnails = serde_json::from_value(json!({
            "thumbnails": [{ "width": 60 }, { "url": "https://a/b.jpg", "width": 120 }]
        }))
        .unwrap();
        assert_eq!(t.thumbnails.len(), 1);
        assert_eq!(t.thumbnails[0].url, "https://a/b.jpg");
    }

    #[test]
    fn non_object_envelope_is_empty() {
        let r = BrowseResponse::from_value(&json!([1, 2, 3]));
        assert!(r.contents.is_none());
        assert!(r.continuation_contents.is_none());
        assert!(r.on_response_received_actions.is_empty());
    }
}
