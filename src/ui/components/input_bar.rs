//! Input bar component
//!
//! Text entry (Enter sends), a send button and the push-to-listen
//! microphone button.

use crate::ui::state::AppState;
use crate::ui::theme::Theme;
use egui::{self, Key, RichText, Vec2};

pub struct InputBar<'a> {
    state: &'a mut AppState,
    theme: &'a Theme,
}

impl<'a> InputBar<'a> {
    pub fn new(state: &'a mut AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.add_space(self.theme.spacing);

            // Right-to-left so the text box takes whatever the buttons leave
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.add_space(self.theme.spacing);
                self.show_mic_button(ui);
                self.show_send_button(ui);
                self.show_text_input(ui);
            });
        });
    }

    fn show_text_input(&mut self, ui: &mut egui::Ui) {
        let text_edit = egui::TextEdit::singleline(&mut self.state.input_text)
            .id(egui::Id::new("message_input"))
            .hint_text("Escribe tu pregunta...")
            .desired_width(ui.available_width())
            .font(egui::TextStyle::Body)
            .text_color(self.theme.text_primary)
            .margin(egui::Margin::symmetric(8.0, 6.0));

        let response = ui.add(text_edit);
        response.widget_info(|| egui::WidgetInfo::labeled(egui::WidgetType::TextEdit, true, "Message input"));

        if response.lost_focus() && ui.input(|i| i.key_pressed(Key::Enter)) {
            self.state.submit_text();
            response.request_focus();
        }
    }

    fn show_send_button(&mut self, ui: &mut egui::Ui) {
        let button = egui::Button::new(RichText::new("➤").size(16.0).color(self.theme.text_primary))
            .min_size(Vec2::new(36.0, 30.0))
            .rounding(self.theme.button_rounding)
            .fill(self.theme.primary);

        let response = ui.add(button).on_hover_text("Enviar (Enter)");
        response.widget_info(|| egui::WidgetInfo::labeled(egui::WidgetType::Button, true, "Send message"));

        if response.clicked() {
            self.state.submit_text();
        }
    }

    fn show_mic_button(&mut self, ui: &mut egui::Ui) {
        let listening = self.state.is_listening();
        let fill = if listening {
            self.theme.primary_active
        } else {
            self.theme.primary
        };

        let button = egui::Button::new(RichText::new("🎤 Hablar").color(self.theme.text_primary))
            .min_size(Vec2::new(0.0, 30.0))
            .rounding(self.theme.button_rounding)
            .fill(fill);

        let response = ui.add_enabled(!listening, button);
        response.widget_info(|| {
            egui::WidgetInfo::labeled(egui::WidgetType::Button, !listening, "Speak question")
        });

        if response.clicked() {
            self.state.start_listening();
        }
    }
}
