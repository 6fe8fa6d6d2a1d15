//! Worklists derived from a remote listing and a local snapshot.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashSet;

use crate::error::TagError;
use crate::models::{LyricsState, Track};
use crate::scan::LibraryIndex;
use crate::tags::{TagMap, TrackFile};

/// A local file that still needs lyrics.
#[derive(Debug)]
pub struct AnnotationItem {
    pub video_id: String,
    pub file: TrackFile,
}

#[derive(Debug, Default)]
pub struct AnnotationPlan {
    pub items: Vec<AnnotationItem>,
    /// State of every file that was inspected, keyed by identifier.
    pub states: BTreeMap<String, LyricsState>,
    pub unreadable: Vec<(PathBuf, TagError)>,
}

pub fn needs_lyrics(tags: &TagMap) -> bool {
    LyricsState::of(tags) != LyricsState::Complete
}

/// Remote tracks with no local file, in remote listing order.
pub fn plan_downloads<'a>(remote: &'a [Track], index: &LibraryIndex) -> Vec<&'a Track> {
    let mut seen = FxHashSet::default();
    remote
        .iter()
        .filter(|track| !index.contains(&track.video_id))
        .filter(|track| seen.insert(track.video_id.as_str()))
        .collect()
}

/// Local files for remote tracks whose lyrics slot is not complete.
///
/// Tags are loaded through `load` only for files that belong to the remote
/// listing. Files that cannot be read are reported and left out.
pub fn plan_annotations<F>(remote: &[Track], index: &LibraryIndex, mut load: F) -> AnnotationPlan
where
    F: FnMut(&Path) -> Result<TrackFile, TagError>,
{
    let mut plan = AnnotationPlan::default();
    let mut seen = FxHashSet::default();

    for track in remote {
        if !seen.insert(track.video_id.as_str()) {
            continue;
        }
        let Some(entry) = index.get(&track.video_id) else {
            continue;
        };
        let file = match load(&entry.path) {
            Ok(file) => file,
            Err(err) => {
                plan.unreadable.push((entry.path.clone(), err));
                continue;
            }
        };

        plan.states.insert(track.video_id.clone(), LyricsState::of(&file.tags));
        if needs_lyrics(&file.tags) {
            plan.items.push(AnnotationItem {
                video_id: track.video_id.clone(),
                file,
            });
        }
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LYRICS_TAG;
    use std::collections::HashMap;

    fn index_of(ids: &[&str]) -> LibraryIndex {
        let mut index = LibraryIndex::default();
        for id in ids {
            index.insert(id, PathBuf::from(format!("/music/Song - X [{}].m4a", id)));
        }
        index
    }

    fn loader(tags: HashMap<&'static str, TagMap>) -> impl FnMut(&Path) -> Result<TrackFile, TagError> {
        move |path: &Path| {
            let name = path.file_name().unwrap().to_str().unwrap();
            let id = crate::identity::id_from_filename(name);
            Ok(TrackFile {
                path: path.to_path_buf(),
                tags: tags.get(id).cloned().unwrap_or_default(),
                duration: None,
            })
        }
    }

    #[test]
    fn test_nothing_to_download_when_all_present() {
        let remote = vec![Track::new("a"), Track::new("b")];
        let index = index_of(&["a", "b", "c"]);
        assert!(plan_downloads(&remote, &index).is_empty());
    }

    #[test]
    fn test_downloads_preserve_remote_order() {
        let remote = vec![Track::new("z"), Track::new("a"), Track::new("m"), Track::new("a")];
        let index = index_of(&["m"]);
        let ids: Vec<&str> = plan_downloads(&remote, &index)
            .iter()
            .map(|t| t.video_id.as_str())
            .collect();
        assert_eq!(ids, vec!["z", "a"]);
    }

    #[test]
    fn test_complete_files_are_never_annotated() {
        let remote = vec![Track::new("a"), Track::new("b"), Track::new("c")];
        let index = index_of(&["a", "b", "c"]);
        let mut tags = HashMap::new();
        tags.insert("a", TagMap::new().with(LYRICS_TAG, &["", ""]));
        tags.insert("b", TagMap::new().with(LYRICS_TAG, &["only one"]));

        let plan = plan_annotations(&remote, &index, loader(tags));
        let ids: Vec<&str> = plan.items.iter().map(|i| i.video_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
        assert_eq!(plan.states["a"], LyricsState::Complete);
        assert_eq!(plan.states["b"], LyricsState::Partial);
        assert_eq!(plan.states["c"], LyricsState::Missing);
    }

    #[test]
    fn test_files_outside_remote_listing_are_ignored() {
        let remote = vec![Track::new("a")];
        let index = index_of(&["a", "unliked"]);
        let plan = plan_annotations(&remote, &index, loader(HashMap::new()));
        assert_eq!(plan.items.len(), 1);
        assert!(!plan.states.contains_key("unliked"));
    }

    #[test]
    fn test_unreadable_files_are_reported() {
        let remote = vec![Track::new("a")];
        let index = index_of(&["a"]);
        let plan = plan_annotations(&remote, &index, |path: &Path| {
            Err(TagError::NoTag(path.to_path_buf()))
        });
        assert!(plan.items.is_empty());
        assert_eq!(plan.unreadable.len(), 1);
    }

    #[test]
    fn test_needs_lyrics_rule() {
        assert!(needs_lyrics(&TagMap::new()));
        assert!(needs_lyrics(&TagMap::new().with(LYRICS_TAG, &[])));
        assert!(!needs_lyrics(&TagMap::new().with(LYRICS_TAG, &["a", "b"])));
    }
}
