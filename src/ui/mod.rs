use iced::{
    widget::{button, column, container, image, row, scrollable, svg, text, text_input, Column, Space},
    Color, Element, Length,
};

use crate::application::{PreviewItem, Status, StatusKind, Surface, Visual, PLACEHOLDER_SVG};

const GRID_COLUMNS: usize = 3;

/// View-only state not owned by the controller
#[derive(Default)]
pub struct DownloadView {
    paste_confirmed: bool,
    paste_generation: u64,
}

#[derive(Debug, Clone)]
pub enum DownloadMessage {
    UrlChanged(String),
    SubmitPressed,
    PastePressed,
    ResetPressed,
    SavePressed(usize),
    PlayPressed(usize),
}

impl DownloadView {
    /// Show the paste confirmation. Returns the token its expiry timer must carry.
    pub fn confirm_paste(&mut self) -> u64 {
        self.paste_generation += 1;
        self.paste_confirmed = true;
        self.paste_generation
    }

    /// Clear the confirmation unless a newer paste has replaced it.
    pub fn expire_paste(&mut self, generation: u64) {
        if generation == self.paste_generation {
            self.paste_confirmed = false;
        }
    }

    pub fn view<'a>(&'a self, surface: &'a Surface) -> Element<'a, DownloadMessage> {
        let mut content = column![text("Post Media Downloader").size(32)]
            .padding(20)
            .spacing(10);

        if surface.form_visible {
            content = content.push(self.form(surface));
        }

        if let Some(status) = &surface.status {
            content = content.push(status_line(status));
        }

        if surface.reset_offered {
            content = content.push(
                button("Download Another")
                    .on_press(DownloadMessage::ResetPressed)
                    .padding([10, 20]),
            );
        }

        if !surface.preview.is_empty() {
            content = content.push(Space::new().height(Length::Fixed(10.0)));
        }
        if let Some(primary) = surface.preview.primary() {
            content = content.push(media_item(0, primary, Length::Fill));
        }

        let grid: Vec<_> = surface.preview.grid().collect();
        for chunk in grid.chunks(GRID_COLUMNS) {
            let cells = chunk
                .iter()
                .map(|(slot, item)| media_item(*slot, item, Length::FillPortion(1)));
            content = content.push(row(cells).spacing(10));
        }

        scrollable(content).into()
    }

    fn form<'a>(&'a self, surface: &'a Surface) -> Element<'a, DownloadMessage> {
        let paste_label = if self.paste_confirmed { "✓" } else { "Paste" };

        column![
            text("Post URL:").size(16),
            row![
                text_input("https://www.instagram.com/p/...", &surface.input)
                    .on_input(DownloadMessage::UrlChanged)
                    .on_submit(DownloadMessage::SubmitPressed)
                    .padding(10),
                button(paste_label)
                    .on_press(DownloadMessage::PastePressed)
                    .padding(10),
            ]
            .spacing(10),
            button("Download")
                .on_press(DownloadMessage::SubmitPressed)
                .padding([10, 20]),
        ]
        .spacing(10)
        .into()
    }
}

fn status_line(status: &Status) -> Element<'_, DownloadMessage> {
    let color = match status.kind {
        StatusKind::Loading => Color::from_rgb(0.2, 0.4, 0.8),
        StatusKind::Notice => Color::from_rgb(0.15, 0.6, 0.35),
        StatusKind::Error => Color::from_rgb(0.8, 0.2, 0.2),
    };
    text(&status.text).size(14).color(color).into()
}

fn media_item(slot: usize, item: &PreviewItem, width: Length) -> Element<'_, DownloadMessage> {
    let visual: Element<'_, DownloadMessage> = match &item.visual {
        Visual::Loading => text("Loading...").into(),
        Visual::Image(handle) => image(handle.clone()).width(Length::Fill).into(),
        Visual::Placeholder => svg(svg::Handle::from_memory(PLACEHOLDER_SVG))
            .width(Length::Fixed(200.0))
            .height(Length::Fixed(200.0))
            .into(),
        Visual::Video { poster } => {
            let mut video = Column::new().spacing(5);
            match (poster, &item.poster_hint) {
                (Some(handle), _) => video = video.push(image(handle.clone()).width(Length::Fill)),
                (None, Some(_)) => video = video.push(text("Loading poster...").size(12)),
                (None, None) => {}
            }
            video = video.push(text(format!("▶ {}", item.name)));

            button(video)
                .on_press_maybe(item.play_target().map(|_| DownloadMessage::PlayPressed(slot)))
                .padding(0)
                .into()
        }
    };

    container(
        column![
            visual,
            button(text(item.download_label()))
                .on_press_maybe(item.can_save().then_some(DownloadMessage::SavePressed(slot)))
                .padding([8, 16]),
        ]
        .spacing(8),
    )
    .padding(10)
    .width(width)
    .into()
}
