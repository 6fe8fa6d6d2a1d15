//! Run configuration and catalog credentials.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

pub const DEFAULT_LIMIT: usize = 999_999;
pub const DEFAULT_EXTENSION: &str = "m4a";

#[derive(Debug, Clone)]
pub struct Config {
    pub music_dir: PathBuf,
    pub limit: usize,
    pub extension: String,
    pub cookie_file: Option<PathBuf>,
    pub yt_dlp: PathBuf,
    pub index_db: Option<PathBuf>,
}

impl Config {
    pub fn new(music_dir: impl Into<PathBuf>) -> Self {
        Self {
            music_dir: music_dir.into(),
            limit: DEFAULT_LIMIT,
            extension: DEFAULT_EXTENSION.to_string(),
            cookie_file: None,
            yt_dlp: PathBuf::from("yt-dlp"),
            index_db: None,
        }
    }

    /// Creates the music directory if needed.
    pub fn prepare(&self) -> Result<()> {
        std::fs::create_dir_all(&self.music_dir).with_context(|| {
            format!("Failed to create music directory {}", self.music_dir.display())
        })
    }
}

/// Previously issued OAuth token, as stored in `oauth.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthToken {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// Reads the token from inline JSON if given, else from `file`.
pub fn load_token(content: Option<&str>, file: &Path) -> Result<OAuthToken> {
    let raw = match content {
        Some(content) => content.to_string(),
        None => {
            if !file.is_file() {
                bail!(
                    "OAuth file {} not found; create it with your catalog OAuth setup or pass --oauth-content",
                    file.display()
                );
            }
            std::fs::read_to_string(file)
                .with_context(|| format!("Failed to read OAuth file {}", file.display()))?
        }
    };
    let token: OAuthToken = serde_json::from_str(&raw).context("Failed to parse OAuth token JSON")?;
    if token.access_token.is_empty() {
        bail!("OAuth token has an empty access_token");
    }
    Ok(token)
}
