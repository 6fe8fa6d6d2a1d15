use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, LevelFilter};

use ytmlm::catalog::YtMusicClient;
use ytmlm::config::{load_token, Config, DEFAULT_EXTENSION, DEFAULT_LIMIT};
use ytmlm::download::YtDlp;
use ytmlm::index_store::IndexStore;
use ytmlm::lyrics::{CatalogLyrics, LrclibClient};
use ytmlm::progress::set_log_only;
use ytmlm::sync::{run, Services};
use ytmlm::tags::LoftyTags;

#[derive(Parser)]
#[command(name = "ytmlm")]
#[command(about = "Download liked music from YouTube Music and tag it with lyrics")]
#[command(
    long_about = "Download liked music from YouTube Music and tag it with lyrics.\n\n\
                  Only run one instance per music directory at a time."
)]
struct Args {
    /// Music directory
    #[arg(long, env = "YTMLM_MUSIC_DIR")]
    music_dir: PathBuf,

    /// Number of songs to fetch
    #[arg(long, env = "YTMLM_LIMIT", default_value_t = DEFAULT_LIMIT)]
    limit: usize,

    /// OAuth file path
    #[arg(long, env = "YTMLM_OAUTH_FILE", default_value = "./oauth.json")]
    oauth_file: PathBuf,

    /// JSON contents of the oauth.json file
    #[arg(long, env = "YTMLM_OAUTH_CONTENT")]
    oauth_content: Option<String>,

    /// Netscape formatted cookie.txt for yt-dlp
    #[arg(long, env = "YTMLM_COOKIE_TXT")]
    cookie_txt: Option<PathBuf>,

    /// Audio container to download and scan for
    #[arg(long, env = "YTMLM_EXTENSION", default_value = DEFAULT_EXTENSION)]
    extension: String,

    /// yt-dlp executable
    #[arg(long, env = "YTMLM_YT_DLP", default_value = "yt-dlp")]
    yt_dlp: PathBuf,

    /// Write a SQLite snapshot of the library index here
    #[arg(long, env = "YTMLM_INDEX_DB")]
    index_db: Option<PathBuf>,

    /// Hide progress bars and print one line per item
    #[arg(long)]
    log_only: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn config(&self) -> Config {
        Config {
            music_dir: self.music_dir.clone(),
            limit: self.limit,
            extension: self.extension.clone(),
            cookie_file: self.cookie_txt.clone(),
            yt_dlp: self.yt_dlp.clone(),
            index_db: self.index_db.clone(),
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut clog = colog::default_builder();
    clog.filter(
        None,
        if args.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        },
    );
    clog.init();
    set_log_only(args.log_only);

    let config = args.config();
    config.prepare()?;
    debug!("Configuration: {:?}", config);

    let token = load_token(args.oauth_content.as_deref(), &args.oauth_file)?;
    let catalog = YtMusicClient::new(&token.token_type, &token.access_token);
    let downloader = YtDlp::new(&config.yt_dlp);
    let tag_io = LoftyTags;
    let unsynced = CatalogLyrics::new(&catalog);
    let synced = LrclibClient::new();
    let services = Services {
        catalog: &catalog,
        downloader: &downloader,
        tag_io: &tag_io,
        unsynced: &unsynced,
        synced: &synced,
    };

    let mut store = match &config.index_db {
        Some(path) => Some(IndexStore::open(path)?),
        None => None,
    };

    let report = run(&config, &services, store.as_mut())?;

    println!("\nDownload complete.\n");
    report
        .failures
        .render(&mut io::stdout().lock())
        .context("Failed to write failure report")?;

    Ok(())
}
