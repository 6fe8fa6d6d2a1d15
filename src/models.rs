//! Core data models for the liked-songs mirror.
//!
//! Remote tracks, tag slot names, the lyrics sentinels written into tags,
//! and the per-file lyrics state used by the diff and the index store.

use crate::error::LyricsError;
use crate::tags::TagMap;

// ============================================================================
// Tag Slots
// ============================================================================

/// Embedded lyrics slot: `[unsynced, synced]` once fully enriched.
pub const LYRICS_TAG: &str = "lyrics";

/// Recording date slot, normalized to a four character year.
pub const YEAR_TAG: &str = "date";

pub const TITLE_TAG: &str = "title";
pub const ARTIST_TAG: &str = "artist";
pub const ALBUM_TAG: &str = "album";

// ============================================================================
// Sentinels
// ============================================================================

/// Written into slot 0 when the catalog has no lyrics for a track.
pub const NO_UNSYNCED_LYRICS: &str = "No unsynced lyrics found.";

/// Written into slot 1 when LRCLIB has no synced lyrics for a track.
pub const NO_SYNCED_LYRICS: &str = "[00:00.00] No synced lyrics found.";

/// Number of lyrics slots a fully enriched file carries.
pub const LYRICS_SLOTS: usize = 2;

// ============================================================================
// Catalog Models
// ============================================================================

/// A liked track as listed by the remote catalog.
///
/// Only `video_id` takes part in identity matching; the rest is used for
/// display and for the downloader's output template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Track {
    pub video_id: String,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
}

impl Track {
    pub fn new(video_id: impl Into<String>) -> Self {
        Self {
            video_id: video_id.into(),
            title: None,
            artist: None,
            album: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Label used in progress output and failure reports.
    pub fn label(&self) -> &str {
        match self.title.as_deref() {
            Some(title) if !title.is_empty() => title,
            _ if !self.video_id.is_empty() => &self.video_id,
            _ => "Unknown",
        }
    }
}

// ============================================================================
// Lyrics Models
// ============================================================================

/// Which of the two lyrics slots a provider fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LyricsKind {
    Unsynced,
    Synced,
}

impl LyricsKind {
    pub fn sentinel(self) -> &'static str {
        match self {
            LyricsKind::Unsynced => NO_UNSYNCED_LYRICS,
            LyricsKind::Synced => NO_SYNCED_LYRICS,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LyricsKind::Unsynced => "unsynced",
            LyricsKind::Synced => "synced",
        }
    }
}

/// Result of asking one provider for lyrics.
#[derive(Debug)]
pub enum LyricsOutcome {
    Found(String),
    /// The provider answered and has nothing for this track.
    Absent,
    /// The call failed; the slot is left out so the file is retried next run.
    Failed(LyricsError),
}

impl LyricsOutcome {
    /// Text to store in the tag slot, `None` when the slot must be omitted.
    pub fn slot_text(&self, kind: LyricsKind) -> Option<String> {
        match self {
            LyricsOutcome::Found(text) => Some(text.clone()),
            LyricsOutcome::Absent => Some(kind.sentinel().to_string()),
            LyricsOutcome::Failed(_) => None,
        }
    }

    pub fn found(&self) -> Option<&str> {
        match self {
            LyricsOutcome::Found(text) => Some(text.as_str()),
            _ => None,
        }
    }
}

/// Enrichment state of a local file, derived from its lyrics slot count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LyricsState {
    Missing,
    Partial,
    Complete,
}

impl LyricsState {
    pub fn from_slot_count(count: Option<usize>) -> Self {
        match count {
            None | Some(0) => LyricsState::Missing,
            Some(LYRICS_SLOTS) => LyricsState::Complete,
            Some(_) => LyricsState::Partial,
        }
    }

    pub fn of(tags: &TagMap) -> Self {
        Self::from_slot_count(tags.get(LYRICS_TAG).map(<[String]>::len))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LyricsState::Missing => "missing",
            LyricsState::Partial => "partial",
            LyricsState::Complete => "complete",
        }
    }
}
