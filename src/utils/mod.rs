use std::path::{Component, Path, PathBuf};

use url::Url;

use crate::domain::{AppError, PostReference};

/// Maximum number of characters of a server error body shown in the status line.
pub const ERROR_BODY_PREVIEW: usize = 100;

/// Extract the post shortcode from a `/p/<id>` or `/reel/<id>` URL.
///
/// Returns `Ok(None)` when the URL is valid but carries neither pattern.
/// `/p/` is checked first, so a path containing both resolves to the `/p/` id.
pub fn extract_shortcode(input: &str) -> Result<Option<PostReference>, AppError> {
    let parsed =
        Url::parse(input).map_err(|e| AppError::InvalidInput(format!("Invalid URL: {}", e)))?;
    let path = parsed.path();

    let tail = if let Some((_, rest)) = path.split_once("/p/") {
        rest
    } else if let Some((_, rest)) = path.split_once("/reel/") {
        rest
    } else {
        return Ok(None);
    };

    Ok(tail
        .split('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .map(|segment| PostReference {
            shortcode: segment.to_string(),
        }))
}

/// Cut a server-supplied body to a short, char-boundary-safe preview.
pub fn truncate_preview(body: &str, max_chars: usize) -> String {
    body.chars().take(max_chars).collect()
}

/// Sanitize filename to remove invalid characters
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            _ => c,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Map a server locator such as `/downloads/<stamp>/<file>` onto `media_root`.
///
/// Only plain path segments are accepted; anything that could escape the root
/// yields `None`.
pub fn resolve_media_path(locator: &str, served_prefix: &str, media_root: &Path) -> Option<PathBuf> {
    let prefix = served_prefix.trim_end_matches('/');
    let relative = match locator.strip_prefix(prefix) {
        Some(rest) if !prefix.is_empty() && (rest.is_empty() || rest.starts_with('/')) => rest,
        _ => locator,
    };
    let relative = Path::new(relative.trim_start_matches('/'));

    let mut resolved = media_root.to_path_buf();
    let mut segments = 0;
    for component in relative.components() {
        match component {
            Component::Normal(segment) => {
                resolved.push(segment);
                segments += 1;
            }
            Component::CurDir => {}
            _ => return None,
        }
    }

    (segments > 0).then_some(resolved)
}
