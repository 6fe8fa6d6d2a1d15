//! SQLite snapshot of the library index.
//!
//! Each run replaces the table with what the run observed: every remote
//! track, whether a local file exists for it, and its lyrics state. The
//! engine never reads this back; it is for operators and other tools.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{params, Connection};

use crate::models::{LyricsState, Track};
use crate::scan::LibraryIndex;

pub struct IndexStore {
    conn: Connection,
}

impl IndexStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open index database {}", path.display()))?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;

            CREATE TABLE IF NOT EXISTS tracks (
                id TEXT PRIMARY KEY,
                title TEXT,
                artist TEXT,
                album TEXT,
                path TEXT,
                downloaded INTEGER NOT NULL,
                lyrics_state TEXT
            );",
        )?;
        Ok(Self { conn })
    }

    /// Replaces the stored snapshot in a single transaction.
    pub fn replace_snapshot(
        &mut self,
        remote: &[Track],
        index: &LibraryIndex,
        states: &BTreeMap<String, LyricsState>,
    ) -> Result<usize> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM tracks", [])?;
        let mut written = 0;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT OR IGNORE INTO tracks (id, title, artist, album, path, downloaded, lyrics_state)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;

            for track in remote {
                let entry = index.get(&track.video_id);
                let path = entry.map(|e| e.path.display().to_string());
                let state = states.get(&track.video_id).map(|s| s.as_str());
                written += stmt.execute(params![
                    track.video_id,
                    track.title,
                    track.artist,
                    track.album,
                    path,
                    entry.is_some(),
                    state,
                ])?;
            }
        }
        tx.commit()?;
        Ok(written)
    }

    pub fn lyrics_state(&self, id: &str) -> Result<Option<String>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT lyrics_state FROM tracks WHERE id = ?1")?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(row.get(0)?),
            None => Ok(None),
        }
    }

    pub fn count_downloaded(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM tracks WHERE downloaded = 1", [], |row| row.get(0))?)
    }
}
