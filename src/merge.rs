//! Combining provider answers into a file's tags.
//!
//! The lyrics slot is `[unsynced, synced]`. A provider that failed leaves
//! its position out, so the slot stays short and the file is picked up again
//! next run. Sentinels count as answers.

use std::path::{Path, PathBuf};

use crate::models::{LyricsKind, LyricsOutcome, LyricsState, LYRICS_TAG, YEAR_TAG};
use crate::tags::{TagMap, TrackFile};

/// Extension of the sidecar lyrics file written next to the audio file.
pub const SIDECAR_EXTENSION: &str = "lrc";

const YEAR_LEN: usize = 4;

pub fn lyrics_slots(unsynced: &LyricsOutcome, synced: &LyricsOutcome) -> Vec<String> {
    [
        unsynced.slot_text(LyricsKind::Unsynced),
        synced.slot_text(LyricsKind::Synced),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// Cuts a single over-long date value down to its first four characters.
///
/// Returns true when the tag was changed.
pub fn normalize_year(tags: &mut TagMap) -> bool {
    let Some(values) = tags.get_mut(YEAR_TAG) else {
        return false;
    };
    if values.len() != 1 || values[0].chars().count() <= YEAR_LEN {
        return false;
    }
    values[0] = values[0].chars().take(YEAR_LEN).collect();
    true
}

pub fn sidecar_path(audio: &Path) -> PathBuf {
    audio.with_extension(SIDECAR_EXTENSION)
}

#[derive(Debug, PartialEq, Eq)]
pub struct MergeResult {
    pub slots_written: usize,
    pub year_normalized: bool,
    /// Synced text to mirror into the sidecar file, when it was found.
    pub sidecar: Option<(PathBuf, String)>,
}

impl MergeResult {
    pub fn state(&self) -> LyricsState {
        LyricsState::from_slot_count(Some(self.slots_written))
    }
}

/// Applies both outcomes and the year fix to `file` in memory.
///
/// The lyrics slot is only replaced when at least one position was produced.
/// Persisting the file and the sidecar is left to the caller.
pub fn merge(file: &mut TrackFile, unsynced: &LyricsOutcome, synced: &LyricsOutcome) -> MergeResult {
    let year_normalized = normalize_year(&mut file.tags);

    let slots = lyrics_slots(unsynced, synced);
    let slots_written = slots.len();
    if slots_written > 0 {
        file.tags.set(LYRICS_TAG, slots);
    }

    let sidecar = synced
        .found()
        .map(|text| (sidecar_path(&file.path), text.to_string()));

    MergeResult {
        slots_written,
        year_normalized,
        sidecar,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LyricsError;
    use crate::models::{NO_SYNCED_LYRICS, NO_UNSYNCED_LYRICS};

    fn file(tags: TagMap) -> TrackFile {
        TrackFile {
            path: PathBuf::from("/music/A/B/Song - A [id].m4a"),
            tags,
            duration: None,
        }
    }

    #[test]
    fn test_year_normalization() {
        let mut tags = TagMap::new().with(YEAR_TAG, &["20231015"]);
        assert!(normalize_year(&mut tags));
        assert_eq!(tags.first(YEAR_TAG), Some("2023"));

        let mut tags = TagMap::new().with(YEAR_TAG, &["1999"]);
        assert!(!normalize_year(&mut tags));
        assert_eq!(tags.first(YEAR_TAG), Some("1999"));

        let mut tags = TagMap::new().with(YEAR_TAG, &["2020-01-01", "2021"]);
        assert!(!normalize_year(&mut tags));

        assert!(!normalize_year(&mut TagMap::new()));
    }

    #[test]
    fn test_both_sentinels_complete_the_file() {
        let mut f = file(TagMap::new());
        let result = merge(&mut f, &LyricsOutcome::Absent, &LyricsOutcome::Absent);
        assert_eq!(
            f.tags.get(LYRICS_TAG).unwrap(),
            &[NO_UNSYNCED_LYRICS.to_string(), NO_SYNCED_LYRICS.to_string()]
        );
        assert_eq!(result.state(), LyricsState::Complete);
        assert_eq!(result.sidecar, None);
    }

    #[test]
    fn test_failed_unsynced_leaves_short_slot() {
        let mut f = file(TagMap::new().with(YEAR_TAG, &["2001-05-05"]));
        let unsynced = LyricsOutcome::Failed(LyricsError::Status(502));
        let synced = LyricsOutcome::Found("text".to_string());

        let result = merge(&mut f, &unsynced, &synced);
        assert_eq!(f.tags.get(LYRICS_TAG).unwrap(), &["text".to_string()]);
        assert_eq!(result.state(), LyricsState::Partial);
        assert!(result.year_normalized);
        assert_eq!(f.tags.first(YEAR_TAG), Some("2001"));
        assert_eq!(
            result.sidecar,
            Some((PathBuf::from("/music/A/B/Song - A [id].lrc"), "text".to_string()))
        );
    }

    #[test]
    fn test_no_slots_keeps_existing_lyrics() {
        let mut f = file(TagMap::new().with(LYRICS_TAG, &["old"]));
        let result = merge(
            &mut f,
            &LyricsOutcome::Failed(LyricsError::Status(500)),
            &LyricsOutcome::Failed(LyricsError::Status(500)),
        );
        assert_eq!(result.slots_written, 0);
        assert_eq!(f.tags.get(LYRICS_TAG).unwrap(), &["old".to_string()]);
    }
}
