//! Local library snapshot.
//!
//! Walks the music directory and indexes audio files by the identifier in
//! their filename. A snapshot is never patched: callers take a fresh one
//! whenever the tree may have changed.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, warn};
use walkdir::WalkDir;

use crate::identity::id_from_path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryEntry {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Default)]
pub struct LibraryIndex {
    entries: BTreeMap<String, LibraryEntry>,
}

impl LibraryIndex {
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&LibraryEntry> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Adds a file; the first path seen for an identifier wins.
    pub fn insert(&mut self, id: &str, path: PathBuf) -> bool {
        if let Some(existing) = self.entries.get(id) {
            warn!(
                "Duplicate identifier {} at {} (keeping {})",
                id,
                path.display(),
                existing.path.display()
            );
            return false;
        }
        self.entries.insert(id.to_string(), LibraryEntry { path });
        true
    }
}

/// Indexes every `*.<extension>` file below `root`, in sorted walk order.
///
/// Only an unreadable `root` is an error. Entries below it that cannot be
/// read are logged and skipped.
pub fn scan_library(root: &Path, extension: &str) -> Result<LibraryIndex> {
    let mut index = LibraryIndex::default();

    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => {
                return Err(err).with_context(|| format!("Failed to read {}", root.display()));
            }
            Err(err) => {
                warn!("Skipping unreadable entry under {}: {}", root.display(), err);
                continue;
            }
        };
        if !entry.file_type().is_file() || !has_extension(entry.path(), extension) {
            continue;
        }
        match id_from_path(entry.path()) {
            Some(id) => {
                index.insert(id, entry.path().to_path_buf());
            }
            None => debug!("Skipping non UTF-8 file name {}", entry.path().display()),
        }
    }

    debug!("Indexed {} files under {}", index.len(), root.display());
    Ok(index)
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}
