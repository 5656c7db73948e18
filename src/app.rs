use std::path::PathBuf;
use std::time::Duration;

use iced::Task;
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ClientConfig};
use crate::application::download_coordinator::open_media;
use crate::application::{Controller, DownloadCoordinator, Effect, LoadOutcome, RequestOutcome};
use crate::domain::TransactionId;
use crate::ui::{DownloadMessage, DownloadView};

const PASTE_FEEDBACK: Duration = Duration::from_secs(1);

pub struct DownloadApp {
    view: DownloadView,
    controller: Controller,
    coordinator: DownloadCoordinator,
}

impl DownloadApp {
    pub fn new(config: ClientConfig) -> Self {
        let controller = Controller::new(&config);
        let coordinator = DownloadCoordinator::new(ApiClient::new(config));

        Self {
            view: DownloadView::default(),
            controller,
            coordinator,
        }
    }

    fn run_effects(&self, effects: Vec<Effect>) -> Task<Message> {
        Task::batch(effects.into_iter().map(|effect| self.run_effect(effect)))
    }

    fn run_effect(&self, effect: Effect) -> Task<Message> {
        match effect {
            Effect::StartRequest {
                id,
                post,
                registration,
                timeout,
            } => {
                let coordinator = self.coordinator.clone();
                Task::perform(
                    async move { coordinator.request(post, registration, timeout).await },
                    move |outcome| Message::RequestFinished(id, outcome),
                )
            }
            Effect::DismissNotice { id, after } => {
                Task::perform(tokio::time::sleep(after), move |_| Message::NoticeExpired(id))
            }
            Effect::LoadMedia { id, loads } => Task::batch(loads.into_iter().map(|load| {
                let coordinator = self.coordinator.clone();
                Task::perform(
                    async move { coordinator.load(load).await },
                    move |(slot, outcome)| Message::MediaLoaded { id, slot, outcome },
                )
            })),
            Effect::SaveFile(action) => {
                let coordinator = self.coordinator.clone();
                Task::perform(
                    async move { coordinator.save(action).await },
                    Message::SaveFinished,
                )
            }
            Effect::OpenMedia(path) => Task::perform(open_media(path), Message::MediaOpened),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Message {
    UiMessage(DownloadMessage),
    RequestFinished(TransactionId, RequestOutcome),
    NoticeExpired(TransactionId),
    MediaLoaded {
        id: TransactionId,
        slot: usize,
        outcome: LoadOutcome,
    },
    /// Clipboard text, `None` when the clipboard could not be read
    Pasted(Option<String>),
    /// Carries the token of the paste that started the timer
    PasteFeedbackExpired(u64),
    /// Saved path, `None` when the dialog was cancelled
    SaveFinished(Result<Option<PathBuf>, String>),
    MediaOpened(Result<(), String>),
}

pub fn update(app: &mut DownloadApp, message: Message) -> Task<Message> {
    match message {
        Message::UiMessage(ui_msg) => match ui_msg {
            DownloadMessage::UrlChanged(url) => app.controller.set_input(url),
            DownloadMessage::SubmitPressed => {
                let effects = app.controller.submit();
                return app.run_effects(effects);
            }
            DownloadMessage::PastePressed => {
                return Task::perform(read_clipboard(), Message::Pasted);
            }
            DownloadMessage::ResetPressed => app.controller.reset(),
            DownloadMessage::SavePressed(slot) => {
                let effects = app.controller.save(slot);
                return app.run_effects(effects);
            }
            DownloadMessage::PlayPressed(slot) => {
                let effects = app.controller.play(slot);
                return app.run_effects(effects);
            }
        },
        Message::RequestFinished(id, outcome) => match outcome {
            RequestOutcome::Settled(response) => {
                let effects = app.controller.on_response(id, response);
                return app.run_effects(effects);
            }
            RequestOutcome::TimedOut => app.controller.on_timeout(id),
            RequestOutcome::Aborted => debug!(%id, "request aborted"),
        },
        Message::NoticeExpired(id) => app.controller.dismiss_notice(id),
        Message::MediaLoaded { id, slot, outcome } => {
            app.controller.on_media_loaded(id, slot, outcome)
        }
        Message::Pasted(Some(text)) if !text.is_empty() => {
            app.controller.paste(text);
            let generation = app.view.confirm_paste();
            return Task::perform(tokio::time::sleep(PASTE_FEEDBACK), move |_| {
                Message::PasteFeedbackExpired(generation)
            });
        }
        Message::Pasted(_) => {}
        Message::PasteFeedbackExpired(generation) => app.view.expire_paste(generation),
        Message::SaveFinished(result) => match result {
            Ok(Some(path)) => info!(path = %path.display(), "download saved"),
            Ok(None) => {}
            Err(e) => warn!("{}", e),
        },
        Message::MediaOpened(result) => {
            if let Err(e) = result {
                warn!("{}", e);
            }
        }
    }
    Task::none()
}

pub fn view(app: &DownloadApp) -> iced::Element<'_, Message> {
    app.view
        .view(app.controller.surface())
        .map(Message::UiMessage)
}

/// Read text from the system clipboard. Failures are logged and swallowed.
async fn read_clipboard() -> Option<String> {
    let read = tokio::task::spawn_blocking(|| {
        arboard::Clipboard::new().and_then(|mut clipboard| clipboard.get_text())
    })
    .await;

    match read {
        Ok(Ok(text)) => Some(text.trim().to_string()),
        Ok(Err(e)) => {
            warn!("Failed to read clipboard: {}", e);
            None
        }
        Err(e) => {
            warn!("Clipboard task failed: {}", e);
            None
        }
    }
}
