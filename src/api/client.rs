use reqwest::Client;
use thiserror::Error;
use tracing::debug;

use super::models::{ClientConfig, DOWNLOAD_ENDPOINT};
use crate::domain::{AppError, DownloadResult, PostReference};
use crate::utils::{truncate_preview, ERROR_BODY_PREVIEW};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

pub type Result<T> = std::result::Result<T, ApiError>;

impl From<ApiError> for AppError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Status { status, body } => AppError::Http { status, body },
            ApiError::InvalidResponse(detail) => AppError::Protocol(detail),
            other => AppError::Network(other.to_string()),
        }
    }
}

#[derive(Clone)]
pub struct ApiClient {
    config: ClientConfig,
    http: Client,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }

    /// Ask the server to download the post's media.
    ///
    /// Any non-success status is an error regardless of the body; the body is
    /// kept as a short preview for the status line. No timeout is applied here,
    /// the caller races this future against its own timer.
    pub async fn fetch_download(&self, post: &PostReference) -> Result<DownloadResult> {
        let url = self.config.server_url.join(DOWNLOAD_ENDPOINT)?;
        debug!(%url, shortcode = %post.shortcode, "requesting download");

        let response = self
            .http
            .get(url)
            .query(&[("shortcode", post.shortcode.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: truncate_preview(&body, ERROR_BODY_PREVIEW),
            });
        }

        let result: DownloadResult = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("JSON decode error: {}", e)))?;

        Ok(result)
    }

    /// Fetch a small remote resource such as a video poster.
    pub async fn fetch_bytes(&self, url: &str) -> Result<bytes::Bytes> {
        let response = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| ApiError::InvalidResponse(format!("Poster request failed: {}", e)))?;

        Ok(response.bytes().await?)
    }
}
