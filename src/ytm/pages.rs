//! Assembles normalized items and continuation tokens into pages.

use crate::ytm::models::{BrowseEndpoint, SongItem, YtItem};
use crate::ytm::normalize;
use crate::ytm::renderers::{
    BrowseResponse, Continuation, MusicCarouselShelfRenderer, Runs, SectionListRenderer,
    ShelfItem,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SectionType {
    List,
    Grid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub label: Option<String>,
    pub thumbnail: Option<String>,
    pub endpoint: Option<BrowseEndpoint>,
    pub items: Vec<YtItem>,
    pub section_type: SectionType,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomePage {
    pub sections: Vec<Section>,
    pub continuation: Option<String>,
}

/// First page of a library tab (grid of cards or shelf of rows).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryPage {
    pub items: Vec<YtItem>,
    pub continuation: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryContinuationPage {
    pub items: Vec<YtItem>,
    pub continuation: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistItemsContinuationPage {
    pub items: Vec<YtItem>,
    pub continuation: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistContinuationPage {
    pub songs: Vec<SongItem>,
    pub continuation: Option<String>,
}

/// Which renderer shape produced an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    TwoRow,
    ResponsiveList,
}

fn normalize_shelf_item(item: &ShelfItem) -> Option<(Shape, YtItem)> {
    if let Some(r) = &item.music_two_row_item_renderer {
        return normalize::from_two_row(r).map(|i| (Shape::TwoRow, i));
    }
    if let Some(r) = &item.music_responsive_list_item_renderer {
        return normalize::from_responsive(r).map(|i| (Shape::ResponsiveList, i));
    }
    None
}

fn normalize_items(items: &[ShelfItem]) -> Vec<YtItem> {
    items
        .iter()
        .filter_map(normalize_shelf_item)
        .map(|(_, item)| item)
        .collect()
}

fn first_text(runs: Option<&Runs>) -> Option<String> {
    runs?
        .runs
        .first()?
        .text
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Reads `continuations[].nextContinuationData.continuation`.
fn next_continuation(continuations: &[Continuation]) -> Option<String> {
    continuations
        .iter()
        .filter_map(|c| c.next_continuation_data.as_ref()?.continuation.clone())
        .find(|t| !t.is_empty())
}

/// Reads the token of a trailing `continuationItemRenderer` entry.
fn trailing_continuation(items: &[ShelfItem]) -> Option<String> {
    items
        .iter()
        .rev()
        .filter_map(|i| i.continuation_item_renderer.as_ref())
        .filter_map(|r| r.continuation_endpoint.as_ref()?.continuation_command.as_ref())
        .filter_map(|c| c.token.clone())
        .find(|t| !t.is_empty())
}

fn first_section_list(response: &BrowseResponse) -> Option<&SectionListRenderer> {
    response
        .contents
        .as_ref()?
        .single_column_browse_results_renderer
        .as_ref()?
        .tabs
        .first()?
        .tab_renderer
        .as_ref()?
        .content
        .as_ref()?
        .section_list_renderer
        .as_ref()
}

/// Items plus continuation token from any continuation envelope. Containers
/// are visited in document order; the first token found wins.
fn continuation_items(response: &BrowseResponse) -> (Vec<&ShelfItem>, Option<String>) {
    let mut items = Vec::new();
    let mut continuation = None;

    if let Some(cc) = &response.continuation_contents {
        for shelf in [
            cc.music_shelf_continuation.as_ref(),
            cc.music_playlist_shelf_continuation.as_ref(),
        ]
        .into_iter()
        .flatten()
        {
            items.extend(shelf.contents.iter());
            continuation = continuation.or_else(|| next_continuation(&shelf.continuations));
        }
        if let Some(grid) = &cc.grid_continuation {
            items.extend(grid.items.iter());
            continuation = continuation.or_else(|| next_continuation(&grid.continuations));
        }
    }
    for action in &response.on_response_received_actions {
        if let Some(append) = &action.append_continuation_items_action {
            items.extend(append.continuation_items.iter());
            continuation =
                continuation.or_else(|| trailing_continuation(&append.continuation_items));
        }
    }
    (items, continuation)
}

impl Section {
    pub fn from_carousel(r: &MusicCarouselShelfRenderer) -> Option<Self> {
        let header = r
            .header
            .as_ref()?
            .music_carousel_shelf_basic_header_renderer
            .as_ref()?;
        let title = first_text(header.title.as_ref())?;

        let normalized: Vec<(Shape, YtItem)> =
            r.contents.iter().filter_map(normalize_shelf_item).collect();
        if normalized.is_empty() {
            tracing::debug!(%title, "dropping shelf without valid items");
            return None;
        }
        let section_type = if normalized
            .iter()
            .any(|(shape, _)| *shape == Shape::ResponsiveList)
        {
            SectionType::Grid
        } else {
            SectionType::List
        };

        Some(Self {
            title,
            label: first_text(header.strapline.as_ref()),
            thumbnail: header
                .thumbnail
                .as_ref()
                .and_then(|t| t.music_thumbnail_renderer.as_ref())
                .and_then(|t| t.thumbnail.as_ref())
                .and_then(|t| t.thumbnails.last())
                .map(|t| t.url.clone()),
            endpoint: header
                .more_content_button
                .as_ref()
                .and_then(|b| b.button_renderer.as_ref())
                .and_then(|b| b.navigation_endpoint.as_ref())
                .and_then(|e| e.browse_endpoint.clone()),
            items: normalized.into_iter().map(|(_, item)| item).collect(),
            section_type,
        })
    }
}

impl HomePage {
    /// Builds the home feed from either the first `FEmusic_home` response or a
    /// `sectionListContinuation`.
    pub fn from_response(v: &serde_json::Value) -> Self {
        let response = BrowseResponse::from_value(v);
        let list = first_section_list(&response).or_else(|| {
            response
                .continuation_contents
                .as_ref()
                .and_then(|c| c.section_list_continuation.as_ref())
        });
        let Some(list) = list else {
            return Self::default();
        };

        Self {
            sections: list
                .contents
                .iter()
                .filter_map(|c| c.music_carousel_shelf_renderer.as_ref())
                .filter_map(Section::from_carousel)
                .collect(),
            continuation: next_continuation(&list.continuations),
        }
    }
}

impl LibraryPage {
    pub fn from_response(v: &serde_json::Value) -> Self {
        let response = BrowseResponse::from_value(v);
        let Some(list) = first_section_list(&response) else {
            return Self::default();
        };

        let mut items = Vec::new();
        let mut continuation = None;
        for content in &list.contents {
            if let Some(grid) = &content.grid_renderer {
                items.extend(normalize_items(&grid.items));
                continuation = continuation.or_else(|| next_continuation(&grid.continuations));
            }
            for shelf in [
                content.music_shelf_renderer.as_ref(),
                content.music_playlist_shelf_renderer.as_ref(),
            ]
            .into_iter()
            .flatten()
            {
                items.extend(normalize_items(&shelf.contents));
                continuation = continuation
                    .or_else(|| next_continuation(&shelf.continuations))
                    .or_else(|| trailing_continuation(&shelf.contents));
            }
        }
        Self {
            items,
            continuation: continuation.or_else(|| next_continuation(&list.continuations)),
        }
    }
}

impl LibraryContinuationPage {
    pub fn from_response(v: &serde_json::Value) -> Self {
        let response = BrowseResponse::from_value(v);
        let (items, continuation) = continuation_items(&response);
        Self {
            items: items.into_iter().filter_map(normalize_shelf_item).map(|(_, i)| i).collect(),
            continuation,
        }
    }
}

impl ArtistItemsContinuationPage {
    pub fn from_response(v: &serde_json::Value) -> Self {
        let response = BrowseResponse::from_value(v);
        let (items, continuation) = continuation_items(&response);
        Self {
            items: items.into_iter().filter_map(normalize_shelf_item).map(|(_, i)| i).collect(),
            continuation,
        }
    }
}

impl PlaylistContinuationPage {
    pub fn from_response(v: &serde_json::Value) -> Self {
        let response = BrowseResponse::from_value(v);
        let (items, continuation) = continuation_items(&response);
        Self {
            songs: items
                .into_iter()
                .filter_map(|i| i.music_responsive_list_item_renderer.as_ref())
                .filter_map(normalize::song_from_responsive)
                .collect(),
            continuation,
        }
    }
}

/// Hides explicit items. With `enabled == false` the page is returned as is.
pub trait FilterExplicit: Clone {
    fn filter_explicit(&self, enabled: bool) -> Self;
}

fn without_explicit(items: &[YtItem]) -> Vec<YtItem> {
    items.iter().filter(|i| !i.explicit()).cloned().collect()
}

impl FilterExplicit for HomePage {
    fn filter_explicit(&self, enabled: bool) -> Self {
        if !enabled {
            return self.clone();
        }
        Self {
            sections: self
                .sections
                .iter()
                .map(|s| Section {
                    items: without_explicit(&s.items),
                    ..s.clone()
                })
                .collect(),
            continuation: self.continuation.clone(),
        }
    }
}

macro_rules! impl_filter_explicit_for_item_page {
    ($($page:ty),*) => {
        $(
            impl FilterExplicit for $page {
                fn filter_explicit(&self, enabled: bool) -> Self {
                    if !enabled {
                        return self.clone();
                    }
                    Self {
                        items: without_explicit(&self.items),
                        continuation: self.continuation.clone(),
                    }
                }
            }
        )*
    };
}

impl_filter_explicit_for_item_page!(LibraryPage, LibraryContinuationPage, ArtistItemsContinuationPage);

impl FilterExplicit for PlaylistContinuationPage {
    fn filter_explicit(&self, enabled: bool) -> Self {
        if !enabled {
            return self.clone();
        }
        Self {
            songs: self.songs.iter().filter(|s| !s.explicit).cloned().collect(),
            continuation: self.continuation.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ytm::normalize::fixtures::*;
    use serde_json::{Value, json};

    fn carousel(title: &str, contents: Vec<Value>) -> Value {
        json!({ "musicCarouselShelfRenderer": {
            "header": { "musicCarouselShelfBasicHeaderRenderer": {
                "title": { "runs": [{ "text": title }] },
                "strapline": { "runs": [{ "text": "For you" }] },
                "moreContentButton": { "buttonRenderer": { "navigationEndpoint": {
                    "browseEndpoint": { "browseId": "FEmusic_more" }
                } } }
            } },
            "contents": contents
        } })
    }

    fn home(shelves: Vec<Value>, continuation: Option<&str>) -> Value {
        let mut list = json!({ "contents": shelves });
        if let Some(token) = continuation {
            list["continuations"] = json!([{ "nextContinuationData": { "continuation": token } }]);
        }
        json!({ "contents": { "singleColumnBrowseResultsRenderer": { "tabs": [
            { "tabRenderer": { "content": { "sectionListRenderer": list } } }
        ] } } })
    }

    #[test]
    fn home_sections_keep_document_order() {
        let v = home(
            vec![
                carousel("First", vec![song_card("a", "A", false), song_card("b", "B", true)]),
                carousel("Second", vec![album_card("MPREb_x", true)]),
            ],
            Some("CONT1"),
        );
        let page = HomePage::from_response(&v);
        assert_eq!(page.continuation.as_deref(), Some("CONT1"));
        assert_eq!(page.sections.len(), 2);
        let first = &page.sections[0];
        assert_eq!(first.title, "First");
        assert_eq!(first.label.as_deref(), Some("For you"));
        assert_eq!(
            first.endpoint.as_ref().and_then(|e| e.browse_id.as_deref()),
            Some("FEmusic_more")
        );
        let ids: Vec<&str> = first.items.iter().map(|i| i.id()).collect();
        assert_eq!(ids, ["a", "b"]);
        assert_eq!(page.sections[1].title, "Second");
    }

    #[test]
    fn missing_continuation_is_terminal() {
        let page = HomePage::from_response(&home(vec![carousel("Only", vec![song_card("a", "A", false)])], None));
        assert!(page.continuation.is_none());
    }

    #[test]
    fn shelf_without_valid_items_is_dropped() {
        let v = home(
            vec![
                carousel("Broken", vec![album_card("MPREb_x", false), json!({ "unknown": {} })]),
                carousel("Fine", vec![song_card("a", "A", false)]),
            ],
            None,
        );
        let page = HomePage::from_response(&v);
        assert_eq!(page.sections.len(), 1);
        assert_eq!(page.sections[0].title, "Fine");
    }

    #[test]
    fn shelf_without_title_is_dropped() {
        let mut shelf = carousel("x", vec![song_card("a", "A", false)]);
        shelf["musicCarouselShelfRenderer"]["header"] = json!({});
        let page = HomePage::from_response(&home(vec![shelf], None));
        assert!(page.sections.is_empty());
    }

    #[test]
    fn section_type_follows_renderer_shape() {
        let v = home(
            vec![
                carousel("Cards", vec![song_card("a", "A", false), song_card("b", "B", false)]),
                carousel("Quick picks", vec![song_card("c", "C", false), song_row("d", "D")]),
            ],
            None,
        );
        let page = HomePage::from_response(&v);
        assert_eq!(page.sections[0].section_type, SectionType::List);
        assert_eq!(page.sections[1].section_type, SectionType::Grid);
    }

    #[test]
    fn unparseable_rows_do_not_make_a_grid() {
        let mut row = song_row("d", "D");
        row["musicResponsiveListItemRenderer"]["flexColumns"] = json!([]);
        let v = home(vec![carousel("Cards", vec![song_card("a", "A", false), row])], None);
        let page = HomePage::from_response(&v);
        assert_eq!(page.sections[0].items.len(), 1);
        assert_eq!(page.sections[0].section_type, SectionType::List);
    }

    #[test]
    fn home_continuation_envelope() {
        let v = json!({ "continuationContents": { "sectionListContinuation": {
            "contents": [carousel("More", vec![song_card("z", "Z", false)])],
            "continuations": [{ "nextContinuationData": { "continuation": "CONT2" } }]
        } } });
        let page = HomePage::from_response(&v);
        assert_eq!(page.sections[0].items[0].id(), "z");
        assert_eq!(page.continuation.as_deref(), Some("CONT2"));
    }

    #[test]
    fn garbage_response_is_an_empty_page() {
        assert_eq!(HomePage::from_response(&json!("nope")), HomePage::default());
        assert_eq!(HomePage::from_response(&json!({ "contents": 3 })), HomePage::default());
    }

    #[test]
    fn filter_explicit_is_idempotent_and_optional() {
        let v = home(
            vec![carousel(
                "Mixed",
                vec![song_card("a", "A", true), song_card("b", "B", false), song_card("c", "C", true)],
            )],
            Some("CONT"),
        );
        let page = HomePage::from_response(&v);

        assert_eq!(page.filter_explicit(false), page);

        let once = page.filter_explicit(true);
        let ids: Vec<&str> = once.sections[0].items.iter().map(|i| i.id()).collect();
        assert_eq!(ids, ["b"]);
        assert_eq!(once.continuation.as_deref(), Some("CONT"));
        assert_eq!(once.filter_explicit(true), once);

        // original untouched
        assert_eq!(page.sections[0].items.len(), 3);
    }

    #[test]
    fn library_page_concatenates_grid_and_shelf() {
        let v = json!({ "contents": { "singleColumnBrowseResultsRenderer": { "tabs": [
            { "tabRenderer": { "content": { "sectionListRenderer": { "contents": [
                { "gridRenderer": {
                    "items": [album_card("MPREb_1", true), album_card("MPREb_2", true)],
                    "continuations": [{ "nextContinuationData": { "continuation": "LIB" } }]
                } },
                { "musicShelfRenderer": { "contents": [song_row("s1", "S1")] } }
            ] } } } }
        ] } } });
        let page = LibraryPage::from_response(&v);
        let ids: Vec<&str> = page.items.iter().map(|i| i.id()).collect();
        assert_eq!(ids, ["MPREb_1", "MPREb_2", "s1"]);
        assert_eq!(page.continuation.as_deref(), Some("LIB"));
    }

    #[test]
    fn library_page_reads_playlist_shelf() {
        let v = json!({ "contents": { "singleColumnBrowseResultsRenderer": { "tabs": [
            { "tabRenderer": { "content": { "sectionListRenderer": { "contents": [
                { "musicPlaylistShelfRenderer": { "contents": [
                    song_row("l1", "Liked 1"),
                    song_row("l2", "Liked 2"),
                    { "continuationItemRenderer": { "continuationEndpoint": {
                        "continuationCommand": { "token": "LIKED" }
                    } } }
                ] } }
            ] } } } }
        ] } } });
        let page = LibraryPage::from_response(&v);
        let ids: Vec<&str> = page.items.iter().map(|i| i.id()).collect();
        assert_eq!(ids, ["l1", "l2"]);
        assert_eq!(page.continuation.as_deref(), Some("LIKED"));
    }

    #[test]
    fn library_continuation_from_grid() {
        let v = json!({ "continuationContents": { "gridContinuation": {
            "items": [album_card("MPREb_1", true), album_card("MPREb_bad", false)],
            "continuations": [{ "nextContinuationData": { "continuation": "NEXT" } }]
        } } });
        let page = LibraryContinuationPage::from_response(&v);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.continuation.as_deref(), Some("NEXT"));
    }

    #[test]
    fn artist_items_continuation_from_append_action() {
        let v = json!({ "onResponseReceivedActions": [{ "appendContinuationItemsAction": {
            "continuationItems": [
                song_card("a", "A", false),
                { "continuationItemRenderer": { "continuationEndpoint": {
                    "continuationCommand": { "token": "TAIL" }
                } } }
            ]
        } }] });
        let page = ArtistItemsContinuationPage::from_response(&v);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.continuation.as_deref(), Some("TAIL"));
    }

    #[test]
    fn playlist_continuation_keeps_only_songs() {
        let v = json!({ "continuationContents": { "musicPlaylistShelfContinuation": {
            "contents": [song_row("p1", "P1"), song_card("c1", "C1", false), song_row("p2", "P2")]
        } } });
        let page = PlaylistContinuationPage::from_response(&v);
        let ids: Vec<&str> = page.songs.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["p1", "p2"]);
        assert!(page.continuation.is_none());
    }
}
