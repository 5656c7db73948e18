use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::future::{AbortRegistration, Abortable};
use tracing::{debug, info, warn};

use super::renderer::{load_image, LoadOutcome, MediaLoad, SaveAction};
use crate::{
    api::ApiClient,
    domain::{AppError, DownloadResult, MediaLoadError, PostReference},
};

/// How the request/timer race ended.
#[derive(Debug, Clone)]
pub enum RequestOutcome {
    Settled(Result<DownloadResult, AppError>),
    /// Cancelled through its abort handle before settling.
    Aborted,
    TimedOut,
}

/// Runs the asynchronous side of a transaction: the request race, deferred
/// media loads, save-as copies and handing videos to the system player.
#[derive(Clone)]
pub struct DownloadCoordinator {
    api_client: ApiClient,
}

impl DownloadCoordinator {
    pub fn new(api_client: ApiClient) -> Self {
        Self { api_client }
    }

    /// Race the download request against `timeout`. The first to settle wins;
    /// the loser is dropped, which cancels an unfinished request.
    pub async fn request(
        &self,
        post: PostReference,
        registration: AbortRegistration,
        timeout: Duration,
    ) -> RequestOutcome {
        let client = self.api_client.clone();
        let request = Abortable::new(
            async move { client.fetch_download(&post).await.map_err(AppError::from) },
            registration,
        );

        match tokio::time::timeout(timeout, request).await {
            Ok(Ok(result)) => RequestOutcome::Settled(result),
            Ok(Err(_aborted)) => RequestOutcome::Aborted,
            Err(_elapsed) => RequestOutcome::TimedOut,
        }
    }

    pub async fn load(&self, load: MediaLoad) -> (usize, LoadOutcome) {
        match load {
            MediaLoad::Image { slot, path } => (slot, LoadOutcome::Image(load_image(path).await)),
            MediaLoad::Poster { slot, url } => {
                let poster = self
                    .api_client
                    .fetch_bytes(&url)
                    .await
                    .map_err(|e| MediaLoadError::Remote(e.to_string()));
                (slot, LoadOutcome::Poster(poster))
            }
        }
    }

    pub async fn choose_save_path(&self, suggested_filename: String) -> Option<PathBuf> {
        rfd::AsyncFileDialog::new()
            .set_file_name(&suggested_filename)
            .save_file()
            .await
            .map(|handle| handle.path().to_path_buf())
    }

    /// Ask where to save, then copy the already materialized file there.
    /// `Ok(None)` means the dialog was cancelled.
    pub async fn save(&self, action: SaveAction) -> Result<Option<PathBuf>, String> {
        let Some(destination) = self.choose_save_path(action.suggested_name.clone()).await else {
            debug!(name = %action.suggested_name, "save cancelled");
            return Ok(None);
        };

        copy_file(&action.source, &destination).await?;
        info!(path = %destination.display(), "file saved");
        Ok(Some(destination))
    }
}

/// Open a local file with the host's default application.
pub async fn open_media(path: PathBuf) -> Result<(), String> {
    let target = path.clone();
    tokio::task::spawn_blocking(move || open::that_detached(&target))
        .await
        .map_err(|e| format!("Player task failed: {}", e))?
        .map_err(|e| {
            warn!(path = %path.display(), "failed to open media: {}", e);
            format!("Failed to open {}: {}", path.display(), e)
        })?;
    debug!(path = %path.display(), "opened in system player");
    Ok(())
}

async fn copy_file(source: &Path, destination: &Path) -> Result<(), String> {
    tokio::fs::copy(source, destination).await.map_err(|e| {
        warn!(source = %source.display(), "save failed: {}", e);
        format!("Failed to save {}: {}", destination.display(), e)
    })?;
    Ok(())
}
