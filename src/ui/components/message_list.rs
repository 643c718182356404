//! Message list component
//!
//! Draws the conversation as chat bubbles. User bubbles sit on the right,
//! assistant replies and notices on the left. Speakable replies carry a
//! play/pause button bound to their playback session.

use crate::messages::{Message, Role};
use crate::playback::PlaybackIcon;
use crate::ui::assets::AssetTextures;
use crate::ui::state::AppState;
use crate::ui::theme::Theme;
use egui::{self, Align, RichText, Vec2};
use uuid::Uuid;

pub struct MessageList<'a> {
    state: &'a AppState,
    theme: &'a Theme,
    textures: Option<&'a AssetTextures>,
    scroll_to_latest: bool,
}

impl<'a> MessageList<'a> {
    pub fn new(state: &'a AppState, theme: &'a Theme, textures: Option<&'a AssetTextures>) -> Self {
        Self {
            state,
            theme,
            textures,
            scroll_to_latest: false,
        }
    }

    /// Bring the newest entry into view even if the user scrolled away
    pub fn scroll_to_latest(mut self, scroll: bool) -> Self {
        self.scroll_to_latest = scroll;
        self
    }

    /// Draw the list; returns the message whose play/pause button was clicked
    pub fn show(self, ui: &mut egui::Ui) -> Option<Uuid> {
        let messages = self.state.log.get_all();
        let mut toggled = None;

        egui::ScrollArea::vertical()
            .id_salt("messages")
            .auto_shrink([false, false])
            .stick_to_bottom(true)
            .show(ui, |ui| {
                ui.add_space(self.theme.spacing);

                let mut assistant_index = 0;
                for message in &messages {
                    if message.role == Role::Assistant {
                        assistant_index += 1;
                    }
                    if self.show_message(ui, message, assistant_index) {
                        toggled = Some(message.id);
                    }
                    ui.add_space(self.theme.spacing_sm);
                }

                ui.add_space(self.theme.spacing);

                if self.scroll_to_latest {
                    ui.scroll_to_cursor(Some(Align::BOTTOM));
                }
            });

        toggled
    }

    fn show_message(&self, ui: &mut egui::Ui, message: &Message, assistant_index: usize) -> bool {
        let is_user = message.role == Role::User;
        let (fill, label_prefix) = match message.role {
            Role::User => (self.theme.user_bubble, "User message"),
            Role::Assistant => (self.theme.assistant_bubble, "Assistant message"),
            Role::System => (self.theme.system_bubble, "System notice"),
        };
        let align = if is_user { Align::RIGHT } else { Align::LEFT };
        let mut clicked = false;

        ui.with_layout(egui::Layout::top_down(align), |ui| {
            ui.horizontal(|ui| {
                if is_user {
                    ui.with_layout(egui::Layout::right_to_left(Align::TOP), |ui| {
                        self.show_bubble(ui, message, fill, label_prefix);
                    });
                    return;
                }

                self.show_bubble(ui, message, fill, label_prefix);

                if let Some(icon) = self.state.playback_icon(message.id) {
                    clicked = self.show_toggle(ui, icon, assistant_index);
                }
            });

            let time = message
                .timestamp
                .with_timezone(&chrono::Local)
                .format("%H:%M")
                .to_string();
            ui.label(RichText::new(time).size(10.0).color(self.theme.text_muted));
        });

        clicked
    }

    fn show_bubble(&self, ui: &mut egui::Ui, message: &Message, fill: egui::Color32, label_prefix: &str) {
        let text_color = self.theme.bubble_text(message.role == Role::User);
        let text = match message.role {
            Role::System => RichText::new(&message.text).italics().color(self.theme.text_muted),
            _ => RichText::new(&message.text).color(text_color),
        };

        egui::Frame::none()
            .fill(fill)
            .rounding(self.theme.bubble_rounding)
            .inner_margin(egui::Margin::symmetric(10.0, 5.0))
            .show(ui, |ui| {
                ui.set_max_width(self.theme.bubble_max_width);
                let response = ui.add(egui::Label::new(text).wrap());
                let label = format!("{}: {}", label_prefix, message.text);
                response.widget_info(|| egui::WidgetInfo::labeled(egui::WidgetType::Label, true, &label));
            });
    }

    fn show_toggle(&self, ui: &mut egui::Ui, icon: PlaybackIcon, index: usize) -> bool {
        let size = Vec2::splat(self.theme.playback_icon_size);
        let (texture, fallback, label) = match icon {
            PlaybackIcon::Play => (
                self.textures.map(|t| &t.play),
                "▶",
                format!("Play message {}", index),
            ),
            PlaybackIcon::Pause => (
                self.textures.map(|t| &t.pause),
                "⏸",
                format!("Pause message {}", index),
            ),
        };

        let button = match texture {
            Some(texture) => egui::Button::image(egui::Image::new(texture).fit_to_exact_size(size)),
            None => egui::Button::new(RichText::new(fallback).color(self.theme.text_secondary)),
        }
        .frame(false);

        let response = ui.add(button);
        response.widget_info(|| egui::WidgetInfo::labeled(egui::WidgetType::Button, true, &label));
        response.clicked()
    }
}
