//! Track identity carried in filenames.
//!
//! Downloaded files are named `<title> - <artist> [<id>].<ext>`, so the last
//! bracketed segment is the catalog identifier. Nothing validates its shape:
//! a name without brackets yields the text before the first `]` (or the
//! whole name), which simply never matches a catalog entry.

use std::path::Path;

pub fn id_from_filename(file_name: &str) -> &str {
    let tail = match file_name.rsplit_once('[') {
        Some((_, tail)) => tail,
        None => file_name,
    };
    match tail.split_once(']') {
        Some((id, _)) => id,
        None => tail,
    }
}

/// Identifier for a path, taken from its final component only.
pub fn id_from_path(path: &Path) -> Option<&str> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(id_from_filename)
}
