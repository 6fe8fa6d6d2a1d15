//! Remote catalog access.
//!
//! [`Catalog`] is the surface the engine needs: the liked-songs listing and
//! the two-step lyrics lookup. [`YtMusicClient`] implements it against the
//! YouTube Music InnerTube API with an already-issued OAuth access token.

use log::debug;
use serde_json::{json, Value};

use crate::error::CatalogError;
use crate::models::Track;

const API_BASE: &str = "https://music.youtube.com/youtubei/v1/";
const ORIGIN: &str = "https://music.youtube.com";
const CLIENT_NAME: &str = "WEB_REMIX";
const CLIENT_VERSION: &str = "1.20241127.01.00";
const LIKED_SONGS_BROWSE_ID: &str = "FEmusic_liked_videos";
const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

pub trait Catalog {
    /// Up to `limit` liked tracks, in the catalog's listing order.
    fn liked_tracks(&self, limit: usize) -> Result<Vec<Track>, CatalogError>;

    /// Browse token for a track's lyrics, `None` when it has none.
    fn lyrics_browse_id(&self, video_id: &str) -> Result<Option<String>, CatalogError>;

    fn lyrics_text(&self, browse_id: &str) -> Result<Option<String>, CatalogError>;
}

pub struct YtMusicClient {
    agent: ureq::Agent,
    authorization: String,
}

impl YtMusicClient {
    pub fn new(token_type: &str, access_token: &str) -> Self {
        let agent = ureq::AgentBuilder::new().user_agent(USER_AGENT).build();
        Self {
            agent,
            authorization: format!("{} {}", token_type, access_token),
        }
    }

    fn post(&self, endpoint: &str, mut body: Value) -> Result<Value, CatalogError> {
        body["context"] = json!({
            "client": {
                "clientName": CLIENT_NAME,
                "clientVersion": CLIENT_VERSION,
                "hl": "en",
            },
            "user": {},
        });

        let response = self
            .agent
            .post(&format!("{}{}", API_BASE, endpoint))
            .query("alt", "json")
            .set("Authorization", &self.authorization)
            .set("Origin", ORIGIN)
            .set("X-Goog-AuthUser", "0")
            .send_json(body)?;
        Ok(response.into_json()?)
    }
}

impl Catalog for YtMusicClient {
    fn liked_tracks(&self, limit: usize) -> Result<Vec<Track>, CatalogError> {
        let first = self.post("browse", json!({ "browseId": LIKED_SONGS_BROWSE_ID }))?;
        let items = liked_shelf_items(&first).ok_or(CatalogError::Shape("liked songs shelf"))?;
        let (mut tracks, mut continuation) = parse_shelf_items(items);

        while tracks.len() < limit {
            let Some(token) = continuation.take() else {
                break;
            };
            debug!("Fetching liked songs continuation after {} tracks", tracks.len());
            let page = self.post("browse", json!({ "continuation": token }))?;
            let Some(items) = continuation_items(&page) else {
                break;
            };
            let (more, next) = parse_shelf_items(items);
            if more.is_empty() && next.is_none() {
                break;
            }
            tracks.extend(more);
            continuation = next;
        }

        tracks.truncate(limit);
        Ok(tracks)
    }

    fn lyrics_browse_id(&self, video_id: &str) -> Result<Option<String>, CatalogError> {
        let response = self.post(
            "next",
            json!({
                "videoId": video_id,
                "playlistId": format!("RDAMVM{}", video_id),
                "isAudioOnly": true,
                "enablePersistentPlaylistPanel": true,
                "tunerSettingValue": "AUTOMIX_SETTING_NORMAL",
            }),
        )?;
        Ok(parse_lyrics_browse_id(&response))
    }

    fn lyrics_text(&self, browse_id: &str) -> Result<Option<String>, CatalogError> {
        let response = self.post("browse", json!({ "browseId": browse_id }))?;
        Ok(parse_lyrics_text(&response))
    }
}

// ============================================================================
// Response Parsing
// ============================================================================

fn liked_shelf_items(response: &Value) -> Option<&Vec<Value>> {
    let section = response.pointer(
        "/contents/singleColumnBrowseResultsRenderer/tabs/0/tabRenderer/content/sectionListRenderer/contents/0",
    )?;
    section
        .pointer("/musicPlaylistShelfRenderer/contents")
        .or_else(|| section.pointer("/musicShelfRenderer/contents"))
        .and_then(Value::as_array)
}

fn continuation_items(response: &Value) -> Option<&Vec<Value>> {
    response
        .pointer("/onResponseReceivedActions/0/appendContinuationItemsAction/continuationItems")
        .and_then(Value::as_array)
}

/// Tracks in a shelf page plus the token for the next page, if any.
pub fn parse_shelf_items(items: &[Value]) -> (Vec<Track>, Option<String>) {
    let mut tracks = Vec::with_capacity(items.len());
    let mut continuation = None;

    for item in items {
        if let Some(token) = item
            .pointer("/continuationItemRenderer/continuationEndpoint/continuationCommand/token")
            .and_then(Value::as_str)
        {
            continuation = Some(token.to_string());
            continue;
        }
        if let Some(renderer) = item.get("musicResponsiveListItemRenderer") {
            if let Some(track) = parse_list_item(renderer) {
                tracks.push(track);
            }
        }
    }

    (tracks, continuation)
}

fn parse_list_item(renderer: &Value) -> Option<Track> {
    let video_id = renderer
        .pointer("/playlistItemData/videoId")
        .or_else(|| {
            renderer.pointer(
                "/overlay/musicItemThumbnailOverlayRenderer/content/musicPlayButtonRenderer/playNavigationEndpoint/watchEndpoint/videoId",
            )
        })
        .and_then(Value::as_str)?;

    let column_runs = |index: usize| {
        renderer
            .pointer(&format!(
                "/flexColumns/{}/musicResponsiveListItemFlexColumnRenderer/text/runs",
                index
            ))
            .and_then(Value::as_array)
    };
    let run_text = |run: &Value| run.get("text").and_then(Value::as_str).map(str::to_string);

    let title = column_runs(0).and_then(|runs| runs.first()).and_then(run_text);
    let artist = column_runs(1).and_then(|runs| {
        let linked: Vec<&str> = runs
            .iter()
            .filter(|run| run.get("navigationEndpoint").is_some())
            .filter_map(|run| run.get("text").and_then(Value::as_str))
            .collect();
        if linked.is_empty() {
            runs.first().and_then(run_text)
        } else {
            Some(linked.join(", "))
        }
    });
    let album = column_runs(2).and_then(|runs| runs.first()).and_then(run_text);

    Some(Track {
        video_id: video_id.to_string(),
        title,
        artist,
        album,
    })
}

pub fn parse_lyrics_browse_id(response: &Value) -> Option<String> {
    let tab = response.pointer(
        "/contents/singleColumnMusicWatchNextResultsRenderer/tabbedRenderer/watchNextTabbedResultsRenderer/tabs/1/tabRenderer",
    )?;
    if tab.get("unselectable").is_some() {
        return None;
    }
    tab.pointer("/endpoint/browseEndpoint/browseId")
        .and_then(Value::as_str)
        .map(str::to_string)
}

pub fn parse_lyrics_text(response: &Value) -> Option<String> {
    response
        .pointer("/contents/sectionListRenderer/contents/0/musicDescriptionShelfRenderer/description/runs/0/text")
        .and_then(Value::as_str)
        .map(str::to_string)
}
