use std::path::{Path, PathBuf};

use bytes::Bytes;
use iced::widget::image;
use tracing::{debug, warn};

use crate::{
    api::ClientConfig,
    domain::{DownloadResult, MediaFile, MediaKind, MediaLoadError},
    utils::{resolve_media_path, sanitize_filename},
};

/// Built-in "No Preview" graphic shown when an image cannot be displayed.
pub const PLACEHOLDER_SVG: &[u8] = br##"<svg width="200" height="200" xmlns="http://www.w3.org/2000/svg"><rect width="100%" height="100%" fill="#f4f4f4"/><text x="50%" y="50%" font-family="Arial" font-size="14" fill="#333" text-anchor="middle" dy=".3em">No Preview</text></svg>"##;

const VIDEO_TYPES: [&str; 5] = ["mp4", "mov", "webm", "avi", "mkv"];
const VIDEO_SUFFIXES: [&str; 3] = [".mp4", ".mov", ".webm"];

/// Decide once whether a file is shown as video or image.
///
/// The declared type and the filename suffix are independent signals; either
/// one marks the file as video.
pub fn classify(file: &MediaFile) -> MediaKind {
    let by_type = file
        .kind_hint
        .as_deref()
        .map(|hint| VIDEO_TYPES.contains(&hint.to_lowercase().as_str()))
        .unwrap_or(false);
    let name = file.name.to_lowercase();
    let by_name = VIDEO_SUFFIXES.iter().any(|suffix| name.ends_with(suffix));

    if by_type || by_name {
        MediaKind::Video
    } else {
        MediaKind::Image
    }
}

/// What an item currently shows.
#[derive(Debug, Clone)]
pub enum Visual {
    /// Image load in progress.
    Loading,
    Image(image::Handle),
    Placeholder,
    /// Video bound to its source; only the poster is ever loaded.
    Video { poster: Option<image::Handle> },
}

#[derive(Debug, Clone)]
pub struct PreviewItem {
    pub kind: MediaKind,
    pub name: String,
    /// Server locator the item is bound to.
    pub locator: String,
    /// Local file backing the locator, if it could be resolved.
    pub source: Option<PathBuf>,
    pub poster_hint: Option<String>,
    pub visual: Visual,
}

impl PreviewItem {
    pub fn download_label(&self) -> String {
        format!("Download {}", self.kind.label())
    }

    pub fn can_save(&self) -> bool {
        self.source.is_some()
    }

    /// Local file to hand to the system player. Only resolved videos play.
    pub fn play_target(&self) -> Option<&Path> {
        match self.kind {
            MediaKind::Video => self.source.as_deref(),
            MediaKind::Image => None,
        }
    }
}

/// Deferred load issued after an item is mounted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaLoad {
    Image { slot: usize, path: PathBuf },
    Poster { slot: usize, url: String },
}

/// Result of a deferred load, routed back to its slot.
#[derive(Debug, Clone)]
pub enum LoadOutcome {
    Image(Result<Bytes, MediaLoadError>),
    Poster(Result<Bytes, MediaLoadError>),
}

/// Save-as request for one rendered file. Copies a local file, never fetches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveAction {
    pub source: PathBuf,
    pub suggested_name: String,
}

/// Rendered result: slot 0 is the primary item, the rest form the grid.
#[derive(Debug, Clone, Default)]
pub struct Preview {
    items: Vec<PreviewItem>,
}

impl Preview {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn primary(&self) -> Option<&PreviewItem> {
        self.items.first()
    }

    /// Secondary items with their slot numbers, in server order.
    pub fn grid(&self) -> impl Iterator<Item = (usize, &PreviewItem)> {
        self.items.iter().enumerate().skip(1)
    }

    pub fn item(&self, slot: usize) -> Option<&PreviewItem> {
        self.items.get(slot)
    }

    /// Apply a finished load to its slot. A failed image load switches the
    /// slot to the placeholder; a failed poster load leaves the video bare.
    pub fn apply_load(&mut self, slot: usize, outcome: LoadOutcome) {
        let Some(item) = self.items.get_mut(slot) else {
            return;
        };

        match outcome {
            LoadOutcome::Image(result) => {
                if !matches!(item.visual, Visual::Loading) {
                    return;
                }
                item.visual = match result {
                    Ok(bytes) => {
                        debug!(name = %item.name, "image loaded");
                        Visual::Image(image::Handle::from_bytes(bytes))
                    }
                    Err(e) => {
                        warn!(name = %item.name, locator = %item.locator, "failed to load image: {}", e);
                        Visual::Placeholder
                    }
                };
            }
            LoadOutcome::Poster(result) => {
                let Visual::Video { poster } = &mut item.visual else {
                    return;
                };
                match result {
                    Ok(bytes) => {
                        debug!(name = %item.name, "poster loaded");
                        *poster = Some(image::Handle::from_bytes(bytes));
                    }
                    Err(e) => warn!(name = %item.name, "failed to load poster: {}", e),
                }
            }
        }
    }

    pub fn save_action(&self, slot: usize) -> Option<SaveAction> {
        let item = self.item(slot)?;
        let source = item.source.clone()?;
        let suggested_name = match sanitize_filename(&item.name) {
            name if name.is_empty() => source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "download".to_string()),
            name => name,
        };

        Some(SaveAction {
            source,
            suggested_name,
        })
    }
}

/// Builds previews and resolves server locators to local files.
#[derive(Debug, Clone)]
pub struct Renderer {
    media_root: PathBuf,
    served_prefix: String,
}

impl Renderer {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            media_root: config.media_root.clone(),
            served_prefix: config.served_prefix.clone(),
        }
    }

    /// Mount every file in order and collect the loads to issue.
    ///
    /// The poster hint goes to an item only when that item is a video.
    pub fn render(&self, result: &DownloadResult) -> (Preview, Vec<MediaLoad>) {
        let mut items = Vec::with_capacity(result.files.len());
        let mut loads = Vec::new();

        for (slot, file) in result.files.iter().enumerate() {
            let kind = classify(file);
            let source = resolve_media_path(&file.path, &self.served_prefix, &self.media_root);
            let poster_hint = match kind {
                MediaKind::Video => result.preview_thumbnail.clone(),
                MediaKind::Image => None,
            };

            let visual = match (kind, &source) {
                (MediaKind::Video, _) => {
                    if let Some(url) = &poster_hint {
                        loads.push(MediaLoad::Poster {
                            slot,
                            url: url.clone(),
                        });
                    }
                    Visual::Video { poster: None }
                }
                (MediaKind::Image, Some(path)) => {
                    loads.push(MediaLoad::Image {
                        slot,
                        path: path.clone(),
                    });
                    Visual::Loading
                }
                (MediaKind::Image, None) => {
                    let err = MediaLoadError::Unresolvable(file.path.clone());
                    warn!(name = %file.name, "showing placeholder: {}", err);
                    Visual::Placeholder
                }
            };

            debug!(slot, name = %file.name, ?kind, "mounted preview item");
            items.push(PreviewItem {
                kind,
                name: file.name.clone(),
                locator: file.path.clone(),
                source,
                poster_hint,
                visual,
            });
        }

        (Preview { items }, loads)
    }
}

/// Read a local image and check it decodes before handing it to the view.
pub async fn load_image(path: PathBuf) -> Result<Bytes, MediaLoadError> {
    let data = tokio::fs::read(&path)
        .await
        .map_err(|e| MediaLoadError::Io(format!("{}: {}", path.display(), e)))?;

    tokio::task::spawn_blocking(move || validate_image(&path, data))
        .await
        .map_err(|e| MediaLoadError::Decode(e.to_string()))?
}

fn validate_image(path: &Path, data: Vec<u8>) -> Result<Bytes, MediaLoadError> {
    ::image::load_from_memory(&data)
        .map_err(|e| MediaLoadError::Decode(format!("{}: {}", path.display(), e)))?;
    Ok(Bytes::from(data))
}
