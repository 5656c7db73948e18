use std::path::PathBuf;
use std::time::Duration;

use futures::future::{AbortHandle, AbortRegistration};
use tracing::{debug, error, info};

use super::renderer::{LoadOutcome, MediaLoad, Preview, Renderer, SaveAction};
use crate::{
    api::ClientConfig,
    domain::{AppError, DownloadResult, PostReference, TransactionId, TransactionState},
    utils::extract_shortcode,
};

pub const LOADING_TEXT: &str = "Downloading preview...";
pub const CACHED_TEXT: &str = "Using previously downloaded files (cached)";
pub const EMPTY_INPUT_TEXT: &str = "Enter a URL";
pub const NO_SHORTCODE_TEXT: &str = "Invalid URL—no shortcode found";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Loading,
    Notice,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub kind: StatusKind,
    pub text: String,
}

impl Status {
    fn new(kind: StatusKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// The regions the controller writes to. The view only reads them.
#[derive(Debug, Clone)]
pub struct Surface {
    pub form_visible: bool,
    pub input: String,
    pub status: Option<Status>,
    pub preview: Preview,
    pub reset_offered: bool,
}

impl Default for Surface {
    fn default() -> Self {
        Self {
            form_visible: true,
            input: String::new(),
            status: None,
            preview: Preview::default(),
            reset_offered: false,
        }
    }
}

/// Work the host must start on behalf of the controller.
#[derive(Debug)]
pub enum Effect {
    /// Issue the download request, cancellable through `registration` and
    /// raced against `timeout`.
    StartRequest {
        id: TransactionId,
        post: PostReference,
        registration: AbortRegistration,
        timeout: Duration,
    },
    DismissNotice {
        id: TransactionId,
        after: Duration,
    },
    LoadMedia {
        id: TransactionId,
        loads: Vec<MediaLoad>,
    },
    SaveFile(SaveAction),
    /// Hand a local video to the system player.
    OpenMedia(PathBuf),
}

/// Owns the single download transaction and every write to the surface.
pub struct Controller {
    state: TransactionState,
    surface: Surface,
    last_id: TransactionId,
    renderer: Renderer,
    request_timeout: Duration,
    cached_notice: Duration,
}

impl Controller {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            state: TransactionState::Idle,
            surface: Surface::default(),
            last_id: TransactionId::default(),
            renderer: Renderer::new(config),
            request_timeout: config.request_timeout,
            cached_notice: config.cached_notice,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> &TransactionState {
        &self.state
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn set_input(&mut self, input: String) {
        if self.surface.form_visible {
            self.surface.input = input;
        }
    }

    /// Start a transaction from the current input.
    ///
    /// Ignored unless the form is visible, which keeps at most one request in
    /// flight. Input errors fail immediately without touching the network.
    pub fn submit(&mut self) -> Vec<Effect> {
        if !self.surface.form_visible || matches!(self.state, TransactionState::Submitting { .. }) {
            debug!("submit ignored, transaction in progress");
            return Vec::new();
        }

        if let TransactionState::Failed { id, error } = &self.state {
            debug!(%id, previous = %error, "retrying after failure");
        }

        self.last_id = self.last_id.next();
        let id = self.last_id;
        self.surface.preview = Preview::default();
        self.surface.status = None;
        self.surface.reset_offered = false;

        let input = self.surface.input.trim().to_string();
        if input.is_empty() {
            self.fail(id, AppError::InvalidInput(EMPTY_INPUT_TEXT.to_string()));
            return Vec::new();
        }

        let post = match extract_shortcode(&input) {
            Ok(Some(post)) => post,
            Ok(None) => {
                self.fail(id, AppError::InvalidInput(NO_SHORTCODE_TEXT.to_string()));
                return Vec::new();
            }
            Err(e) => {
                self.fail(id, e);
                return Vec::new();
            }
        };

        info!(%id, shortcode = %post.shortcode, "submitting download");
        self.surface.form_visible = false;
        self.surface.status = Some(Status::new(StatusKind::Loading, LOADING_TEXT));

        let (abort, registration) = AbortHandle::new_pair();
        self.state = TransactionState::Submitting { id, abort };

        vec![Effect::StartRequest {
            id,
            post,
            registration,
            timeout: self.request_timeout,
        }]
    }

    /// Settle the transaction with the server's answer. Late answers are dropped.
    pub fn on_response(
        &mut self,
        id: TransactionId,
        response: Result<DownloadResult, AppError>,
    ) -> Vec<Effect> {
        if !self.is_submitting(id) {
            debug!(%id, "stale response ignored");
            return Vec::new();
        }

        let result = match response {
            Ok(result) if result.files.is_empty() => {
                self.fail(id, AppError::Protocol("no files in response".to_string()));
                return Vec::new();
            }
            Ok(result) => result,
            Err(e) => {
                self.fail(id, e);
                return Vec::new();
            }
        };

        let (preview, loads) = self.renderer.render(&result);
        info!(%id, files = preview.len(), cached = result.cached, "preview rendered");

        self.state = TransactionState::Rendered { id };
        self.surface.preview = preview;
        self.surface.reset_offered = true;

        let mut effects = Vec::new();
        if result.cached {
            self.surface.status = Some(Status::new(StatusKind::Notice, CACHED_TEXT));
            effects.push(Effect::DismissNotice {
                id,
                after: self.cached_notice,
            });
        } else {
            self.surface.status = None;
        }
        if !loads.is_empty() {
            effects.push(Effect::LoadMedia { id, loads });
        }
        effects
    }

    /// The timer won the race: cancel the request and fail.
    pub fn on_timeout(&mut self, id: TransactionId) {
        let TransactionState::Submitting { id: current, abort } = &self.state else {
            return;
        };
        if *current != id {
            return;
        }

        abort.abort();
        self.fail(id, AppError::Timeout(self.request_timeout));
    }

    pub fn dismiss_notice(&mut self, id: TransactionId) {
        let showing_notice = matches!(
            self.surface.status,
            Some(Status {
                kind: StatusKind::Notice,
                ..
            })
        );
        if showing_notice && matches!(self.state, TransactionState::Rendered { id: current } if current == id) {
            self.surface.status = None;
        }
    }

    pub fn on_media_loaded(&mut self, id: TransactionId, slot: usize, outcome: LoadOutcome) {
        match self.state {
            TransactionState::Rendered { id: current } if current == id => {
                self.surface.preview.apply_load(slot, outcome);
            }
            _ => debug!(%id, slot, "stale media load ignored"),
        }
    }

    pub fn save(&self, slot: usize) -> Vec<Effect> {
        if !matches!(self.state, TransactionState::Rendered { .. }) {
            return Vec::new();
        }
        self.surface
            .preview
            .save_action(slot)
            .map(Effect::SaveFile)
            .into_iter()
            .collect()
    }

    pub fn play(&self, slot: usize) -> Vec<Effect> {
        if !matches!(self.state, TransactionState::Rendered { .. }) {
            return Vec::new();
        }
        self.surface
            .preview
            .item(slot)
            .and_then(|item| item.play_target())
            .map(|path| Effect::OpenMedia(path.to_path_buf()))
            .into_iter()
            .collect()
    }

    pub fn paste(&mut self, text: String) {
        if self.surface.form_visible {
            self.surface.input = text;
        }
    }

    /// Return to `Idle` from a terminal state.
    pub fn reset(&mut self) {
        if !self.state.is_terminal() {
            return;
        }
        info!(id = ?self.state.id(), "reset");
        self.state = TransactionState::Idle;
        self.surface = Surface::default();
    }

    fn is_submitting(&self, id: TransactionId) -> bool {
        matches!(self.state, TransactionState::Submitting { id: current, .. } if current == id)
    }

    fn fail(&mut self, id: TransactionId, err: AppError) {
        error!(%id, "download failed: {}", err);
        self.surface.form_visible = true;
        self.surface.preview = Preview::default();
        self.surface.status = Some(Status::new(StatusKind::Error, err.status_text()));
        self.surface.reset_offered = true;
        self.state = TransactionState::Failed { id, error: err };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::renderer::Visual;
    use crate::domain::{MediaFile, MediaLoadError};
    use futures::future::{Abortable, Aborted};

    fn controller() -> Controller {
        Controller::new(&ClientConfig::default())
    }

    fn submit(controller: &mut Controller, url: &str) -> Vec<Effect> {
        controller.set_input(url.to_string());
        controller.submit()
    }

    fn start(controller: &mut Controller, url: &str) -> (TransactionId, AbortRegistration) {
        let mut effects = submit(controller, url);
        assert_eq!(effects.len(), 1);
        match effects.remove(0) {
            Effect::StartRequest {
                id, registration, ..
            } => (id, registration),
            other => panic!("unexpected effect: {:?}", other),
        }
    }

    fn file(name: &str, kind_hint: Option<&str>) -> MediaFile {
        MediaFile {
            path: format!("/downloads/t/{}", name),
            name: name.to_string(),
            kind_hint: kind_hint.map(str::to_string),
        }
    }

    fn result(files: Vec<MediaFile>, cached: bool) -> DownloadResult {
        DownloadResult {
            files,
            cached,
            preview_thumbnail: None,
        }
    }

    fn status_text(controller: &Controller) -> Option<&str> {
        controller.surface().status.as_ref().map(|s| s.text.as_str())
    }

    #[test]
    fn test_submit_hides_form_and_starts_request() {
        let mut c = controller();
        let mut effects = submit(&mut c, "https://www.instagram.com/p/ABC/");

        assert!(!c.surface().form_visible);
        assert_eq!(status_text(&c), Some(LOADING_TEXT));
        assert!(matches!(c.state(), TransactionState::Submitting { .. }));
        match effects.remove(0) {
            Effect::StartRequest { post, timeout, .. } => {
                assert_eq!(post.shortcode, "ABC");
                assert_eq!(timeout, Duration::from_secs(500));
            }
            other => panic!("unexpected effect: {:?}", other),
        }
    }

    #[test]
    fn test_empty_input_fails_without_request() {
        let mut c = controller();
        let effects = submit(&mut c, "   ");

        assert!(effects.is_empty());
        assert!(c.surface().form_visible);
        assert_eq!(status_text(&c), Some(EMPTY_INPUT_TEXT));
        assert!(matches!(
            c.state(),
            TransactionState::Failed {
                error: AppError::InvalidInput(_),
                ..
            }
        ));
    }

    #[test]
    fn test_url_without_shortcode_fails_without_request() {
        let mut c = controller();
        assert!(submit(&mut c, "https://www.instagram.com/explore/").is_empty());
        assert_eq!(status_text(&c), Some(NO_SHORTCODE_TEXT));
        assert!(c.surface().form_visible);

        assert!(submit(&mut c, "not a url").is_empty());
        assert!(status_text(&c).unwrap().starts_with("Invalid URL"));
    }

    #[test]
    fn test_submit_ignored_while_in_flight() {
        let mut c = controller();
        let (id, _registration) = start(&mut c, "https://x/p/ABC");

        assert!(c.submit().is_empty());
        assert_eq!(c.state().id(), Some(id));
    }

    #[test]
    fn test_submit_ignored_while_rendered() {
        let mut c = controller();
        let (id, _registration) = start(&mut c, "https://x/p/ABC");
        c.on_response(id, Ok(result(vec![file("a.jpg", None)], false)));
        assert!(!c.surface().form_visible);

        c.set_input("https://x/p/OTHER".into());
        let effects = c.submit();

        assert!(effects.is_empty());
        assert!(matches!(c.state(), TransactionState::Rendered { id: current } if *current == id));
        assert_eq!(c.surface().preview.len(), 1);
    }

    #[test]
    fn test_success_renders_and_offers_reset() {
        let mut c = controller();
        let (id, _registration) = start(&mut c, "https://x/p/ABC");

        let effects = c.on_response(
            id,
            Ok(result(vec![file("a.jpg", None), file("b.mp4", Some("mp4"))], false)),
        );

        assert!(matches!(c.state(), TransactionState::Rendered { .. }));
        assert!(c.surface().status.is_none());
        assert!(c.surface().reset_offered);
        assert!(!c.surface().form_visible);
        assert_eq!(c.surface().preview.len(), 2);
        assert!(matches!(
            effects.as_slice(),
            [Effect::LoadMedia { loads, .. }] if loads.len() == 1
        ));
    }

    #[test]
    fn test_empty_files_fails_with_protocol_error() {
        let mut c = controller();
        let (id, _registration) = start(&mut c, "https://x/reel/ABC");

        let effects = c.on_response(id, Ok(result(Vec::new(), false)));

        assert!(effects.is_empty());
        assert!(matches!(
            c.state(),
            TransactionState::Failed {
                error: AppError::Protocol(_),
                ..
            }
        ));
        assert!(c.surface().form_visible);
        assert!(c.surface().preview.is_empty());
    }

    #[test]
    fn test_http_error_is_surfaced() {
        let mut c = controller();
        let (id, _registration) = start(&mut c, "https://x/p/ABC");

        c.on_response(
            id,
            Err(AppError::Http {
                status: 404,
                body: "No media URLs found for shortcode".into(),
            }),
        );

        assert_eq!(
            status_text(&c),
            Some("Error: Download failed: 404 - No media URLs found for shortcode")
        );
        assert!(c.surface().form_visible);
        assert!(c.surface().reset_offered);
    }

    #[test]
    fn test_cached_notice_is_dismissed() {
        let mut c = controller();
        let (id, _registration) = start(&mut c, "https://x/p/ABC");

        let effects = c.on_response(id, Ok(result(vec![file("a.mp4", None)], true)));

        assert_eq!(status_text(&c), Some(CACHED_TEXT));
        assert!(matches!(
            effects.as_slice(),
            [Effect::DismissNotice { after, .. }] if *after == Duration::from_secs(2)
        ));

        c.dismiss_notice(id);
        assert!(c.surface().status.is_none());
    }

    #[test]
    fn test_timeout_cancels_request() {
        let mut c = controller();
        let (id, registration) = start(&mut c, "https://x/p/ABC");

        c.on_timeout(id);

        let request = Abortable::new(futures::future::pending::<()>(), registration);
        assert_eq!(futures::executor::block_on(request), Err(Aborted));
        assert_eq!(status_text(&c), Some("Error: Timeout (500s)"));
        assert!(matches!(
            c.state(),
            TransactionState::Failed {
                error: AppError::Timeout(_),
                ..
            }
        ));
    }

    #[test]
    fn test_late_response_after_timeout_is_ignored() {
        let mut c = controller();
        let (id, _registration) = start(&mut c, "https://x/p/ABC");

        c.on_timeout(id);
        let effects = c.on_response(id, Ok(result(vec![file("a.jpg", None)], false)));

        assert!(effects.is_empty());
        assert!(c.surface().preview.is_empty());
        assert!(matches!(
            c.state(),
            TransactionState::Failed {
                error: AppError::Timeout(_),
                ..
            }
        ));
    }

    #[test]
    fn test_timeout_after_response_is_ignored() {
        let mut c = controller();
        let (id, _registration) = start(&mut c, "https://x/p/ABC");

        c.on_response(id, Ok(result(vec![file("a.jpg", None)], false)));
        c.on_timeout(id);

        assert!(matches!(c.state(), TransactionState::Rendered { .. }));
        assert!(c.surface().status.is_none());
    }

    #[test]
    fn test_reset_restores_initial_surface() {
        let mut c = controller();
        let (id, _registration) = start(&mut c, "https://x/p/ABC");
        c.on_response(id, Ok(result(vec![file("a.jpg", None)], true)));

        c.reset();

        let surface = c.surface();
        assert!(matches!(c.state(), TransactionState::Idle));
        assert!(surface.form_visible);
        assert!(surface.input.is_empty());
        assert!(surface.preview.is_empty());
        assert!(surface.status.is_none());
        assert!(!surface.reset_offered);
    }

    #[test]
    fn test_reset_after_failure_then_retry() {
        let mut c = controller();
        submit(&mut c, "");
        c.reset();
        assert!(matches!(c.state(), TransactionState::Idle));

        let (id, _registration) = start(&mut c, "https://x/p/NEW");
        assert_eq!(id, TransactionId(2));
    }

    #[test]
    fn test_retry_from_failed_without_reset() {
        let mut c = controller();
        let (first, _registration) = start(&mut c, "https://x/p/ABC");
        c.on_response(first, Err(AppError::Network("refused".into())));

        let (second, _registration) = start(&mut c, "https://x/p/ABC");
        assert_ne!(first, second);
        assert!(!c.surface().reset_offered);
    }

    #[test]
    fn test_reset_is_noop_while_submitting() {
        let mut c = controller();
        let (id, _registration) = start(&mut c, "https://x/p/ABC");

        c.reset();

        assert_eq!(c.state().id(), Some(id));
        assert!(!c.surface().form_visible);
    }

    #[test]
    fn test_stale_notice_and_media_after_reset_are_ignored() {
        let mut c = controller();
        let (first, _registration) = start(&mut c, "https://x/p/ABC");
        c.on_response(first, Ok(result(vec![file("a.jpg", None)], false)));
        c.reset();

        let (second, _registration) = start(&mut c, "https://x/p/DEF");
        c.on_response(second, Ok(result(vec![file("b.jpg", None)], true)));

        c.dismiss_notice(first);
        assert_eq!(status_text(&c), Some(CACHED_TEXT));

        c.on_media_loaded(first, 0, LoadOutcome::Image(Err(MediaLoadError::Io("x".into()))));
        assert!(matches!(
            c.surface().preview.primary().unwrap().visual,
            Visual::Loading
        ));
    }

    #[test]
    fn test_failed_image_load_shows_placeholder() {
        let mut c = controller();
        let (id, _registration) = start(&mut c, "https://x/p/ABC");
        c.on_response(id, Ok(result(vec![file("a.jpg", None), file("b.jpg", None)], false)));

        c.on_media_loaded(id, 1, LoadOutcome::Image(Err(MediaLoadError::Decode("bad".into()))));

        assert!(matches!(c.surface().preview.item(1).unwrap().visual, Visual::Placeholder));
        assert!(matches!(c.surface().preview.item(0).unwrap().visual, Visual::Loading));
    }

    #[test]
    fn test_save_only_when_rendered() {
        let mut c = controller();
        let (id, _registration) = start(&mut c, "https://x/p/ABC");
        assert!(c.save(0).is_empty());

        c.on_response(id, Ok(result(vec![file("a.jpg", None)], false)));

        assert!(matches!(
            c.save(0).as_slice(),
            [Effect::SaveFile(action)] if action.suggested_name == "a.jpg"
        ));
    }

    #[test]
    fn test_play_only_for_resolved_video() {
        let mut c = controller();
        let (id, _registration) = start(&mut c, "https://x/p/ABC");
        assert!(c.play(0).is_empty());

        let unresolved = MediaFile {
            path: String::new(),
            name: "c.mp4".into(),
            kind_hint: Some("mp4".into()),
        };
        c.on_response(
            id,
            Ok(result(vec![file("a.mp4", None), file("b.jpg", None), unresolved], false)),
        );

        assert!(matches!(
            c.play(0).as_slice(),
            [Effect::OpenMedia(path)] if path.ends_with("t/a.mp4")
        ));
        assert!(c.play(1).is_empty());
        assert!(c.play(2).is_empty());
        assert!(c.play(9).is_empty());
    }

    #[test]
    fn test_paste_fills_input_only_when_form_visible() {
        let mut c = controller();
        c.paste("https://x/p/ABC".into());
        assert_eq!(c.surface().input, "https://x/p/ABC");

        c.submit();
        c.paste("https://x/p/OTHER".into());
        assert_eq!(c.surface().input, "https://x/p/ABC");
    }
}
