//! One mirror run: snapshot, diff, download, re-snapshot, annotate.
//!
//! Every phase is sequential. The local index is rebuilt from disk after
//! downloading so new files take part in annotation. Running two instances
//! against the same directory at once is unsupported: tag updates are an
//! unguarded read-modify-write.

use std::collections::BTreeMap;
use std::time::Instant;

use anyhow::{Context, Result};
use log::{info, warn};

use crate::catalog::Catalog;
use crate::config::Config;
use crate::diff::{plan_annotations, plan_downloads, AnnotationItem};
use crate::download::{download_all, DownloadConfig, Downloader};
use crate::error::TagError;
use crate::failures::FailureLog;
use crate::index_store::IndexStore;
use crate::lyrics::{attempt, LyricsProvider};
use crate::merge::merge;
use crate::models::{LyricsOutcome, LyricsState};
use crate::progress::{create_progress_bar, create_spinner, format_duration, log_progress};
use crate::scan::scan_library;
use crate::tags::TagIo;

/// Remote collaborators for a run.
pub struct Services<'a> {
    pub catalog: &'a dyn Catalog,
    pub downloader: &'a dyn Downloader,
    pub tag_io: &'a dyn TagIo,
    pub unsynced: &'a dyn LyricsProvider,
    pub synced: &'a dyn LyricsProvider,
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub remote: usize,
    pub to_download: usize,
    pub downloaded: usize,
    pub annotated: usize,
    pub states: BTreeMap<String, LyricsState>,
    pub failures: FailureLog,
}

pub fn run(config: &Config, services: &Services<'_>, store: Option<&mut IndexStore>) -> Result<RunReport> {
    let start = Instant::now();
    let mut report = RunReport::default();

    let spinner = create_spinner("Getting liked music");
    let tracks = services
        .catalog
        .liked_tracks(config.limit)
        .context("Failed to fetch liked songs")?;
    spinner.finish_with_message(format!("Got {} liked tracks", tracks.len()));
    report.remote = tracks.len();

    let before = scan_library(&config.music_dir, &config.extension)?;
    let to_download = plan_downloads(&tracks, &before);
    report.to_download = to_download.len();
    println!(
        "Got {} tracks, {} new to download",
        tracks.len(),
        to_download.len()
    );

    let download_config = DownloadConfig::new(&config.music_dir, &config.extension)
        .with_cookie_file(config.cookie_file.as_deref());
    report.downloaded = download_all(
        &to_download,
        services.downloader,
        &download_config,
        &mut report.failures,
    );

    let after = match scan_library(&config.music_dir, &config.extension) {
        Ok(index) => index,
        Err(err) => {
            warn!("Rescan after downloads failed, annotating the earlier snapshot: {:#}", err);
            before
        }
    };
    let plan = plan_annotations(&tracks, &after, |path| services.tag_io.load(path));
    for (path, err) in plan.unreadable {
        let subject = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        report.failures.record_lyrics(subject, err);
    }
    report.states = plan.states;
    println!("Downloading lyrics: {} new to download", plan.items.len());

    let total = plan.items.len() as u64;
    let pb = create_progress_bar(total, "Downloading lyrics");
    for (i, item) in plan.items.into_iter().enumerate() {
        let subject = item.file.file_name();
        pb.set_message(format!("Downloading lyrics for {}", subject));
        log_progress("lyrics", i as u64 + 1, total, &subject);

        let video_id = item.video_id.clone();
        let state = annotate(item, services, &mut report.failures);
        report.states.insert(video_id, state);
        report.annotated += 1;
        pb.inc(1);
    }
    pb.finish_with_message(format!("Annotated {} files", report.annotated));

    if let Some(store) = store {
        match store.replace_snapshot(&tracks, &after, &report.states) {
            Ok(rows) => info!("Wrote {} rows to index database", rows),
            Err(err) => warn!("Failed to write index snapshot: {:#}", err),
        }
    }

    info!("Run finished in {}", format_duration(start.elapsed()));
    Ok(report)
}

/// Fetches both lyrics, merges them and saves the file once.
///
/// Returns the file's lyrics state after the attempt.
pub fn annotate(item: AnnotationItem, services: &Services<'_>, failures: &mut FailureLog) -> LyricsState {
    let AnnotationItem { video_id, mut file } = item;
    let subject = file.file_name();
    let before = LyricsState::of(&file.tags);

    let unsynced = attempt(services.unsynced, &video_id, &file);
    let synced = attempt(services.synced, &video_id, &file);
    let result = merge(&mut file, &unsynced, &synced);

    for outcome in [unsynced, synced] {
        if let LyricsOutcome::Failed(err) = outcome {
            failures.record_lyrics(subject.clone(), err);
        }
    }

    if let Some((path, text)) = &result.sidecar {
        if let Err(source) = std::fs::write(path, text) {
            let err = TagError::Sidecar {
                path: path.clone(),
                source,
            };
            failures.record_lyrics(subject.clone(), err);
        }
    }

    match services.tag_io.save(&file) {
        Ok(()) => LyricsState::of(&file.tags),
        Err(err) => {
            failures.record_lyrics(subject, err);
            before
        }
    }
}
