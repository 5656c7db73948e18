mod api;
mod app;
mod application;
mod domain;
mod ui;
mod utils;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use url::Url;

use crate::api::ClientConfig;

#[derive(Parser, Debug)]
#[command(about = "Preview and save the media of a post through a download server")]
struct Args {
    /// Base URL of the download server
    #[arg(long)]
    server_url: Option<Url>,
    /// Seconds to wait for the server before giving up
    #[arg(long)]
    timeout_secs: Option<u64>,
    /// Directory the server writes downloaded files into
    #[arg(long)]
    media_root: Option<PathBuf>,
}

impl Args {
    fn into_config(self) -> ClientConfig {
        let mut config = ClientConfig::default();
        if let Some(server_url) = self.server_url {
            config.server_url = server_url;
        }
        if let Some(secs) = self.timeout_secs {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(media_root) = self.media_root {
            config.media_root = media_root;
        }
        config
    }
}

fn main() -> iced::Result {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Args::parse().into_config();
    tracing::info!(server = %config.server_url, media_root = %config.media_root.display(), "starting");

    iced::application(
        move || app::DownloadApp::new(config.clone()),
        app::update,
        app::view,
    )
    .title("Post Media Downloader")
    .run()
}
