//! Embedded tag access for local audio files.
//!
//! The engine sees a file's tags as a [`TagMap`] (slot name to ordered
//! values). [`LoftyTags`] maps those slots onto lofty item keys; tests swap
//! in an in-memory [`TagIo`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use lofty::config::WriteOptions;
use lofty::file::{AudioFile, TaggedFileExt};
use lofty::tag::{ItemKey, ItemValue, Tag, TagItem};

use crate::error::TagError;
use crate::models::{ALBUM_TAG, ARTIST_TAG, LYRICS_TAG, TITLE_TAG, YEAR_TAG};

const SLOT_KEYS: [(&str, ItemKey); 5] = [
    (TITLE_TAG, ItemKey::TrackTitle),
    (ARTIST_TAG, ItemKey::TrackArtist),
    (ALBUM_TAG, ItemKey::AlbumTitle),
    (YEAR_TAG, ItemKey::RecordingDate),
    (LYRICS_TAG, ItemKey::Lyrics),
];

/// Slots written back on save. Everything else is read-only to the engine.
const WRITABLE_SLOTS: [&str; 2] = [LYRICS_TAG, YEAR_TAG];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagMap {
    slots: BTreeMap<String, Vec<String>>,
}

impl TagMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.slots.get(name).map(Vec::as_slice)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Vec<String>> {
        self.slots.get_mut(name)
    }

    pub fn first(&self, name: &str) -> Option<&str> {
        self.get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn set(&mut self, name: &str, values: Vec<String>) {
        self.slots.insert(name.to_string(), values);
    }

    pub fn with(mut self, name: &str, values: &[&str]) -> Self {
        self.set(name, values.iter().map(|v| v.to_string()).collect());
        self
    }
}

/// A local audio file with its tags loaded.
#[derive(Debug, Clone)]
pub struct TrackFile {
    pub path: PathBuf,
    pub tags: TagMap,
    pub duration: Option<Duration>,
}

impl TrackFile {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

pub trait TagIo {
    fn load(&self, path: &Path) -> Result<TrackFile, TagError>;

    /// Persists the writable slots of `file` in one write.
    fn save(&self, file: &TrackFile) -> Result<(), TagError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LoftyTags;

impl TagIo for LoftyTags {
    fn load(&self, path: &Path) -> Result<TrackFile, TagError> {
        let tagged_file = lofty::read_from_path(path).map_err(|source| TagError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let duration = tagged_file.properties().duration();
        let mut tags = TagMap::new();
        if let Some(tag) = tagged_file.primary_tag().or_else(|| tagged_file.first_tag()) {
            for (name, key) in SLOT_KEYS {
                let values: Vec<String> = tag.get_strings(key).map(str::to_string).collect();
                if !values.is_empty() {
                    tags.set(name, values);
                }
            }
        }

        Ok(TrackFile {
            path: path.to_path_buf(),
            tags,
            duration: (!duration.is_zero()).then_some(duration),
        })
    }

    fn save(&self, file: &TrackFile) -> Result<(), TagError> {
        let path = file.path.as_path();
        let mut tagged_file = lofty::read_from_path(path).map_err(|source| TagError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let tag_type = tagged_file.primary_tag_type();
        if tagged_file.tag(tag_type).is_none() {
            tagged_file.insert_tag(Tag::new(tag_type));
        }
        let tag = tagged_file
            .tag_mut(tag_type)
            .ok_or_else(|| TagError::NoTag(path.to_path_buf()))?;

        for (name, key) in SLOT_KEYS {
            if !WRITABLE_SLOTS.contains(&name) {
                continue;
            }
            let Some(values) = file.tags.get(name) else {
                continue;
            };
            tag.remove_key(key);
            for value in values {
                tag.push(TagItem::new(key, ItemValue::Text(value.clone())));
            }
        }

        tagged_file
            .save_to_path(path, WriteOptions::default())
            .map_err(|source| TagError::Write {
                path: path.to_path_buf(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::merge;
    use crate::models::{LyricsOutcome, LyricsState};
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_temp_flac_path(name: &str) -> PathBuf {
        let nonce = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("ytmlm_{name}_{nonce}.flac"))
    }

    /// Bare FLAC stream: marker, a last-block STREAMINFO, no tags.
    /// 88200 samples at 44.1 kHz, so two seconds long.
    fn write_untagged_flac(path: &Path) {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"fLaC");
        // Last-metadata-block flag, type 0 (STREAMINFO), length 34
        bytes.extend_from_slice(&[0x80, 0x00, 0x00, 0x22]);
        // Min/max block size 4096, unknown frame sizes
        bytes.extend_from_slice(&[0x10, 0x00, 0x10, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);
        // 44100 Hz, 2 channels, 16 bits, 88200 samples
        bytes.extend_from_slice(&[0x0A, 0xC4, 0x42, 0xF0, 0x00, 0x01, 0x58, 0x88]);
        // MD5 of the decoded audio, unset
        bytes.extend_from_slice(&[0x00; 16]);
        bytes.extend_from_slice(&[0x00; 16]);

        fs::write(path, bytes).unwrap();
    }

    #[test]
    fn test_tag_map_first_and_get() {
        let tags = TagMap::new()
            .with(LYRICS_TAG, &["plain", "[00:01.00] synced"])
            .with(YEAR_TAG, &["2023"]);
        assert_eq!(tags.get(LYRICS_TAG).map(<[String]>::len), Some(2));
        assert_eq!(tags.first(YEAR_TAG), Some("2023"));
        assert_eq!(tags.first(TITLE_TAG), None);
    }

    #[test]
    fn test_file_name_of_track_file() {
        let file = TrackFile {
            path: PathBuf::from("/music/A/B/Song - A [id].m4a"),
            tags: TagMap::new(),
            duration: None,
        };
        assert_eq!(file.file_name(), "Song - A [id].m4a");
    }

    #[test]
    fn test_only_lyrics_and_year_are_writable() {
        for (name, _) in SLOT_KEYS {
            let writable = WRITABLE_SLOTS.contains(&name);
            assert_eq!(writable, name == LYRICS_TAG || name == YEAR_TAG);
        }
    }

    #[test]
    fn test_lofty_round_trip_of_lyrics_and_year() {
        let path = unique_temp_flac_path("round_trip");
        write_untagged_flac(&path);

        let mut file = LoftyTags.load(&path).unwrap();
        assert_eq!(LyricsState::of(&file.tags), LyricsState::Missing);
        assert_eq!(file.duration.map(|d| d.as_secs()), Some(2));

        file.tags.set(YEAR_TAG, vec!["20231015".to_string()]);
        LoftyTags.save(&file).unwrap();
        let mut file = LoftyTags.load(&path).unwrap();
        assert_eq!(file.tags.first(YEAR_TAG), Some("20231015"));

        merge(
            &mut file,
            &LyricsOutcome::Found("plain words".to_string()),
            &LyricsOutcome::Found("[00:01.00] synced words".to_string()),
        );
        LoftyTags.save(&file).unwrap();

        let reloaded = LoftyTags.load(&path).unwrap();
        assert_eq!(
            reloaded.tags.get(LYRICS_TAG),
            Some(&["plain words".to_string(), "[00:01.00] synced words".to_string()][..])
        );
        assert_eq!(reloaded.tags.first(YEAR_TAG), Some("2023"));
        assert_eq!(LyricsState::of(&reloaded.tags), LyricsState::Complete);

        LoftyTags.save(&reloaded).unwrap();
        let again = LoftyTags.load(&path).unwrap();
        assert_eq!(again.tags, reloaded.tags);

        fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_lofty_load_reports_unreadable_file() {
        let path = unique_temp_flac_path("garbage");
        fs::write(&path, b"not audio at all").unwrap();
        assert!(matches!(LoftyTags.load(&path), Err(TagError::Read { .. })));
        fs::remove_file(path).unwrap();
    }
}
