//! End-of-run failure report.
//!
//! Failures are collected per phase in the order they happen and only shown
//! once all work is done. Their presence never changes the exit status.

use std::fmt;
use std::io::{self, Write};

use log::warn;

pub struct FailureRecord {
    pub subject: String,
    pub error: anyhow::Error,
}

impl fmt::Display for FailureRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:#}", self.subject, self.error)
    }
}

impl fmt::Debug for FailureRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[derive(Debug, Default)]
pub struct FailureLog {
    downloads: Vec<FailureRecord>,
    lyrics: Vec<FailureRecord>,
}

impl FailureLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_download(&mut self, subject: impl Into<String>, error: impl Into<anyhow::Error>) {
        let record = FailureRecord {
            subject: subject.into(),
            error: error.into(),
        };
        warn!("Download failed: {}", record);
        self.downloads.push(record);
    }

    pub fn record_lyrics(&mut self, subject: impl Into<String>, error: impl Into<anyhow::Error>) {
        let record = FailureRecord {
            subject: subject.into(),
            error: error.into(),
        };
        warn!("Lyrics failed: {}", record);
        self.lyrics.push(record);
    }

    pub fn downloads(&self) -> &[FailureRecord] {
        &self.downloads
    }

    pub fn lyrics(&self) -> &[FailureRecord] {
        &self.lyrics
    }

    pub fn is_empty(&self) -> bool {
        self.downloads.is_empty() && self.lyrics.is_empty()
    }

    pub fn render<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "yt-dlp failures:")?;
        writeln!(out)?;
        for record in &self.downloads {
            writeln!(out, "{}", record)?;
        }
        writeln!(out)?;
        writeln!(out, "lyrics failures:")?;
        writeln!(out)?;
        for record in &self.lyrics {
            writeln!(out, "{}", record)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    fn rendered(log: &FailureLog) -> String {
        let mut out = Vec::new();
        log.render(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_empty_log_renders_headers_only() {
        let log = FailureLog::new();
        assert!(log.is_empty());
        assert_eq!(rendered(&log), "yt-dlp failures:\n\n\nlyrics failures:\n\n");
    }

    #[test]
    fn test_records_keep_phase_and_order() {
        let mut log = FailureLog::new();
        log.record_lyrics("b.m4a", anyhow!("second"));
        log.record_download("Song", anyhow!("boom"));
        log.record_lyrics("a.m4a", anyhow!("first"));

        assert_eq!(log.downloads().len(), 1);
        let subjects: Vec<&str> = log.lyrics().iter().map(|r| r.subject.as_str()).collect();
        assert_eq!(subjects, vec!["b.m4a", "a.m4a"]);

        let text = rendered(&log);
        assert!(text.contains("Song: boom\n"));
        let first = text.find("b.m4a: second").unwrap();
        let second = text.find("a.m4a: first").unwrap();
        assert!(first < second);
    }
}
