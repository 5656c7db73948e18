use std::fmt;

use futures::future::AbortHandle;
use serde::{Deserialize, Serialize};

use super::AppError;

/// Identifier of a post, extracted from its URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostReference {
    pub shortcode: String,
}

/// One file materialized by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct MediaFile {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub name: String,
    /// Declared extension, may be missing or wrong.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind_hint: Option<String>,
}

/// Body of a successful `/api/v1/download` response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct DownloadResult {
    #[serde(default)]
    pub files: Vec<MediaFile>,
    #[serde(default)]
    pub cached: bool,
    #[serde(default)]
    pub preview_thumbnail: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Image,
}

impl MediaKind {
    pub fn label(self) -> &'static str {
        match self {
            MediaKind::Video => "Video",
            MediaKind::Image => "Image",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TransactionId(pub u64);

impl TransactionId {
    pub fn next(self) -> Self {
        TransactionId(self.0 + 1)
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle of the single download transaction.
#[derive(Debug, Clone)]
pub enum TransactionState {
    Idle,
    Submitting {
        id: TransactionId,
        abort: AbortHandle,
    },
    Rendered {
        id: TransactionId,
    },
    Failed {
        id: TransactionId,
        error: AppError,
    },
}

impl TransactionState {
    pub fn id(&self) -> Option<TransactionId> {
        match self {
            TransactionState::Idle => None,
            TransactionState::Submitting { id, .. }
            | TransactionState::Rendered { id }
            | TransactionState::Failed { id, .. } => Some(*id),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransactionState::Rendered { .. } | TransactionState::Failed { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_result_tolerates_server_extras() {
        let body = r#"{
            "shortcode": "ABC",
            "files": [{"name": "ABC_001.mp4", "path": "/downloads/x/ABC_001.mp4", "type": "mp4"}],
            "dir": null,
            "preview_thumbnail": "https://cdn.example/thumb.jpg",
            "cached": true
        }"#;
        let result: DownloadResult = serde_json::from_str(body).unwrap();

        assert_eq!(result.files.len(), 1);
        assert_eq!(result.files[0].kind_hint.as_deref(), Some("mp4"));
        assert!(result.cached);
        assert_eq!(
            result.preview_thumbnail.as_deref(),
            Some("https://cdn.example/thumb.jpg")
        );
    }

    #[test]
    fn test_missing_files_deserializes_empty() {
        let result: DownloadResult = serde_json::from_str(r#"{"cached": false}"#).unwrap();
        assert!(result.files.is_empty());
    }
}
