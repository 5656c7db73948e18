use std::path::PathBuf;
use std::time::Duration;

use url::Url;

/// Path of the download endpoint, relative to the server root.
pub const DOWNLOAD_ENDPOINT: &str = "/api/v1/download";

/// Configuration for the API client and the preview controller
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server_url: Url,
    /// Ceiling for one download request before it is cancelled.
    pub request_timeout: Duration,
    /// How long the "served from cache" notice stays visible.
    pub cached_notice: Duration,
    /// Directory the server materializes downloaded files into.
    pub media_root: PathBuf,
    /// Public prefix under which the server exposes `media_root`.
    pub served_prefix: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: Url::parse("http://127.0.0.1:8000").expect("static URL is valid"),
            request_timeout: Duration::from_secs(500),
            cached_notice: Duration::from_secs(2),
            media_root: PathBuf::from("data/outputs/downloads"),
            served_prefix: "/downloads".to_string(),
        }
    }
}
