use std::time::Duration;

use thiserror::Error;

/// Transaction-level failures. Every variant ends the transaction in `Failed`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Timeout ({}s)", .0.as_secs())]
    Timeout(Duration),

    #[error("Download failed: {status} - {body}")]
    Http { status: u16, body: String },

    #[error("Unexpected server response: {0}")]
    Protocol(String),

    #[error("{0}")]
    Network(String),
}

impl AppError {
    /// Status line shown to the user. Input errors are shown as-is, everything
    /// else is prefixed so it reads as a failed download.
    pub fn status_text(&self) -> String {
        match self {
            AppError::InvalidInput(msg) => msg.clone(),
            other => format!("Error: {}", other),
        }
    }
}

/// Failure to display a single preview item. Recovered with the placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediaLoadError {
    #[error("cannot resolve media path: {0}")]
    Unresolvable(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("fetch failed: {0}")]
    Remote(String),
}
