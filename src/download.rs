//! Media acquisition for tracks missing from the local library.
//!
//! Tracks are fetched one at a time through a [`Downloader`]. A failed track
//! is recorded and the batch moves on.

use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, info};

use crate::error::DownloadError;
use crate::failures::FailureLog;
use crate::models::Track;
use crate::progress::{create_progress_bar, log_progress};

const WATCH_URL: &str = "https://music.youtube.com/watch?v=";

/// Lines of downloader stderr kept in a failure message.
const STDERR_TAIL_LINES: usize = 5;

pub fn watch_url(video_id: &str) -> String {
    format!("{}{}", WATCH_URL, video_id)
}

/// Fixed downloader settings shared by every track of a run.
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    pub music_dir: PathBuf,
    pub extension: String,
    pub cookie_file: Option<PathBuf>,
}

impl DownloadConfig {
    pub fn new(music_dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            music_dir: music_dir.into(),
            extension: extension.into(),
            cookie_file: None,
        }
    }

    /// Uses `cookie_file` only when it points at an existing regular file.
    pub fn with_cookie_file(mut self, cookie_file: Option<&Path>) -> Self {
        self.cookie_file = cookie_file.filter(|path| path.is_file()).map(Path::to_path_buf);
        self
    }

    /// Best audio-only stream in the library's container.
    pub fn format_selector(&self) -> String {
        format!("ba[ext={}]", self.extension)
    }

    /// `<dir>/<artist>/<album>/<title> - <artist> [<id>].<ext>`; the bracketed
    /// id is what later scans match on.
    pub fn output_template(&self) -> String {
        format!(
            "{}/%(artist)s/%(album)s/%(title)s - %(artist)s [%(id)s].%(ext)s",
            self.music_dir.display()
        )
    }

    pub fn yt_dlp_args(&self, url: &str) -> Vec<String> {
        let mut args = vec![
            "--format".to_string(),
            self.format_selector(),
            "--output".to_string(),
            self.output_template(),
            "--output".to_string(),
            "pl_thumbnail:".to_string(),
            "--write-thumbnail".to_string(),
            "--embed-thumbnail".to_string(),
            "--embed-metadata".to_string(),
            "--embed-chapters".to_string(),
            "--embed-info-json".to_string(),
            "--no-progress".to_string(),
        ];
        if let Some(cookie_file) = &self.cookie_file {
            args.push("--cookies".to_string());
            args.push(cookie_file.display().to_string());
        }
        args.push("--".to_string());
        args.push(url.to_string());
        args
    }
}

pub trait Downloader {
    fn download(&self, url: &str, config: &DownloadConfig) -> Result<(), DownloadError>;
}

/// Runs the `yt-dlp` executable once per track.
#[derive(Debug, Clone)]
pub struct YtDlp {
    program: PathBuf,
}

impl YtDlp {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for YtDlp {
    fn default() -> Self {
        Self::new("yt-dlp")
    }
}

impl Downloader for YtDlp {
    fn download(&self, url: &str, config: &DownloadConfig) -> Result<(), DownloadError> {
        let args = config.yt_dlp_args(url);
        debug!("Running {} {}", self.program.display(), args.join(" "));

        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|source| DownloadError::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
        let tail = lines[lines.len().saturating_sub(STDERR_TAIL_LINES)..].join("\n");
        Err(DownloadError::Exit {
            status: output.status.to_string(),
            stderr: tail,
        })
    }
}

/// Downloads `tracks` in order, returning how many succeeded.
pub fn download_all(
    tracks: &[&Track],
    downloader: &dyn Downloader,
    config: &DownloadConfig,
    failures: &mut FailureLog,
) -> usize {
    let total = tracks.len() as u64;
    let pb = create_progress_bar(total, "Downloading songs");
    let mut downloaded = 0;

    for (i, track) in tracks.iter().enumerate() {
        pb.set_message(format!("Downloading song {}", track.label()));
        log_progress("download", i as u64 + 1, total, track.label());

        match downloader.download(&watch_url(&track.video_id), config) {
            Ok(()) => downloaded += 1,
            Err(err) => failures.record_download(track.label(), err),
        }
        pb.inc(1);
    }

    pb.finish_with_message(format!("Downloaded {}/{} songs", downloaded, tracks.len()));
    info!("Downloaded {} of {} new tracks", downloaded, tracks.len());
    downloaded
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct FakeDownloader {
        fail_on: &'static str,
        calls: RefCell<Vec<String>>,
    }

    impl Downloader for FakeDownloader {
        fn download(&self, url: &str, _config: &DownloadConfig) -> Result<(), DownloadError> {
            self.calls.borrow_mut().push(url.to_string());
            if url.ends_with(self.fail_on) {
                return Err(DownloadError::Exit {
                    status: "exit status: 1".to_string(),
                    stderr: "ERROR: unavailable".to_string(),
                });
            }
            Ok(())
        }
    }

    #[test]
    fn test_watch_url() {
        assert_eq!(watch_url("abc"), "https://music.youtube.com/watch?v=abc");
    }

    #[test]
    fn test_args_carry_template_and_post_processing() {
        let config = DownloadConfig::new("/music", "m4a");
        let args = config.yt_dlp_args("URL");
        assert_eq!(args[1], "ba[ext=m4a]");
        assert_eq!(
            args[3],
            "/music/%(artist)s/%(album)s/%(title)s - %(artist)s [%(id)s].%(ext)s"
        );
        assert!(args.contains(&"--embed-thumbnail".to_string()));
        assert!(args.contains(&"--embed-info-json".to_string()));
        assert!(!args.contains(&"--cookies".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("URL"));
    }

    #[test]
    fn test_missing_cookie_file_is_ignored() {
        let config = DownloadConfig::new("/music", "m4a")
            .with_cookie_file(Some(Path::new("/definitely/not/here/cookies.txt")));
        assert!(config.cookie_file.is_none());
    }

    #[test]
    fn test_failure_does_not_stop_batch() {
        let downloader = FakeDownloader {
            fail_on: "b",
            calls: RefCell::new(Vec::new()),
        };
        let a = Track::new("a").with_title("Song A");
        let b = Track::new("b").with_title("Song B");
        let c = Track::new("c");
        let mut failures = FailureLog::new();

        let config = DownloadConfig::new("/music", "m4a");
        let downloaded = download_all(&[&a, &b, &c], &downloader, &config, &mut failures);

        assert_eq!(downloaded, 2);
        assert_eq!(downloader.calls.borrow().len(), 3);
        assert_eq!(failures.downloads().len(), 1);
        assert_eq!(failures.downloads()[0].subject, "Song B");
    }
}
