//! Lyrics lookup from the two providers.
//!
//! Each provider answers `Ok(Some(text))`, `Ok(None)` (explicitly nothing)
//! or an error. [`attempt`] turns that into a [`LyricsOutcome`] so one
//! provider failing never prevents the other from being asked.

use log::debug;
use serde::Deserialize;

use crate::catalog::Catalog;
use crate::error::LyricsError;
use crate::models::{LyricsKind, LyricsOutcome, ALBUM_TAG, ARTIST_TAG, TITLE_TAG};
use crate::tags::TrackFile;

const LRCLIB_GET_URL: &str = "https://lrclib.net/api/get";

pub trait LyricsProvider {
    fn kind(&self) -> LyricsKind;

    fn fetch(&self, video_id: &str, file: &TrackFile) -> Result<Option<String>, LyricsError>;
}

/// Queries `provider` once and folds the answer into an outcome.
pub fn attempt(provider: &dyn LyricsProvider, video_id: &str, file: &TrackFile) -> LyricsOutcome {
    match provider.fetch(video_id, file) {
        Ok(Some(text)) => LyricsOutcome::Found(text),
        Ok(None) => {
            debug!("No {} lyrics for {}", provider.kind().as_str(), file.file_name());
            LyricsOutcome::Absent
        }
        Err(err) => LyricsOutcome::Failed(err),
    }
}

// ============================================================================
// Unsynced: catalog lyrics
// ============================================================================

/// Plain lyrics from the catalog, keyed by the track identifier.
pub struct CatalogLyrics<'a> {
    catalog: &'a dyn Catalog,
}

impl<'a> CatalogLyrics<'a> {
    pub fn new(catalog: &'a dyn Catalog) -> Self {
        Self { catalog }
    }
}

impl LyricsProvider for CatalogLyrics<'_> {
    fn kind(&self) -> LyricsKind {
        LyricsKind::Unsynced
    }

    fn fetch(&self, video_id: &str, _file: &TrackFile) -> Result<Option<String>, LyricsError> {
        let Some(browse_id) = self.catalog.lyrics_browse_id(video_id)? else {
            return Ok(None);
        };
        Ok(self.catalog.lyrics_text(&browse_id)?)
    }
}

// ============================================================================
// Synced: LRCLIB
// ============================================================================

#[derive(Debug, Deserialize)]
struct LrclibRecord {
    #[serde(rename = "syncedLyrics")]
    synced_lyrics: Option<String>,
}

/// Timestamped lyrics from LRCLIB, matched on the file's own tags.
pub struct LrclibClient {
    agent: ureq::Agent,
    url: String,
}

impl LrclibClient {
    pub fn new() -> Self {
        Self::with_url(LRCLIB_GET_URL)
    }

    pub fn with_url(url: impl Into<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .user_agent(concat!("ytmlm/", env!("CARGO_PKG_VERSION")))
            .build();
        Self {
            agent,
            url: url.into(),
        }
    }
}

impl Default for LrclibClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Query parameters LRCLIB matches on. Missing tags are left out.
///
/// The duration is required: without it LRCLIB answers 400, which would
/// read as "no lyrics" and stop the file from ever being retried.
pub fn lrclib_query(file: &TrackFile) -> Result<Vec<(&'static str, String)>, LyricsError> {
    let duration = file.duration.ok_or(LyricsError::MissingDuration)?;
    let mut query = Vec::with_capacity(4);
    for (param, tag) in [
        ("artist_name", ARTIST_TAG),
        ("track_name", TITLE_TAG),
        ("album_name", ALBUM_TAG),
    ] {
        if let Some(value) = file.tags.first(tag) {
            query.push((param, value.to_string()));
        }
    }
    query.push(("duration", duration.as_secs().to_string()));
    Ok(query)
}

/// Maps an LRCLIB status and `syncedLyrics` field to a provider answer.
///
/// 200 with text is a hit; 200 without text, 400 and 404 mean LRCLIB has
/// nothing; any other status is a real failure.
pub fn interpret_lrclib(status: u16, synced: Option<String>) -> Result<Option<String>, LyricsError> {
    match status {
        200 => Ok(synced.filter(|text| !text.is_empty())),
        400 | 404 => Ok(None),
        other => Err(LyricsError::Status(other)),
    }
}

impl LyricsProvider for LrclibClient {
    fn kind(&self) -> LyricsKind {
        LyricsKind::Synced
    }

    fn fetch(&self, _video_id: &str, file: &TrackFile) -> Result<Option<String>, LyricsError> {
        let mut request = self.agent.get(&self.url);
        for (param, value) in lrclib_query(file)? {
            request = request.query(param, &value);
        }

        match request.call() {
            Ok(response) if response.status() == 200 => {
                let record: LrclibRecord = response.into_json()?;
                interpret_lrclib(200, record.synced_lyrics)
            }
            Ok(response) => interpret_lrclib(response.status(), None),
            Err(ureq::Error::Status(code, _)) => interpret_lrclib(code, None),
            Err(ureq::Error::Transport(transport)) => {
                Err(LyricsError::Transport(transport.to_string()))
            }
        }
    }
}
