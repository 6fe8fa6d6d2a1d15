//! Typed errors returned across the library seams.
//!
//! Run orchestration wraps these in `anyhow` when it records or reports them.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("catalog rejected the OAuth token (HTTP {0}); refresh oauth.json")]
    Auth(u16),

    #[error("catalog request failed with HTTP {0}")]
    Status(u16),

    #[error("catalog transport error: {0}")]
    Transport(String),

    #[error("catalog response could not be decoded: {0}")]
    Decode(#[from] std::io::Error),

    #[error("unexpected catalog response: missing {0}")]
    Shape(&'static str),
}

impl From<ureq::Error> for CatalogError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(code @ (401 | 403), _) => CatalogError::Auth(code),
            ureq::Error::Status(code, _) => CatalogError::Status(code),
            ureq::Error::Transport(transport) => CatalogError::Transport(transport.to_string()),
        }
    }
}

#[derive(Error, Debug)]
pub enum LyricsError {
    #[error("lyrics provider returned HTTP {0}")]
    Status(u16),

    #[error("lyrics transport error: {0}")]
    Transport(String),

    #[error("lyrics response could not be decoded: {0}")]
    Decode(#[from] std::io::Error),

    #[error("file has no audio duration to match synced lyrics on")]
    MissingDuration,

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("downloader exited with {status}: {stderr}")]
    Exit { status: String, stderr: String },
}

#[derive(Error, Debug)]
pub enum TagError {
    #[error("failed to read tags from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: lofty::error::LoftyError,
    },

    #[error("failed to write tags to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: lofty::error::LoftyError,
    },

    #[error("no writable tag available for {0}")]
    NoTag(PathBuf),

    #[error("failed to write {path}: {source}")]
    Sidecar {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
