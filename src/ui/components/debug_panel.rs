//! Debug panel component
//!
//! Displays worker status, playback transitions and the in-app log.

use crate::ui::state::AppState;
use crate::ui::theme::Theme;
use egui::{self, RichText, ScrollArea};

pub struct DebugPanel<'a> {
    state: &'a AppState,
    theme: &'a Theme,
}

impl<'a> DebugPanel<'a> {
    pub fn new(state: &'a AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(self, ui: &mut egui::Ui) {
        ui.vertical(|ui| {
            ui.horizontal(|ui| {
                ui.label(RichText::new("Debug").strong().color(self.theme.text_primary));

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(
                        RichText::new(format!("{:.1} FPS", self.state.debug_info.fps))
                            .size(12.0)
                            .family(egui::FontFamily::Monospace)
                            .color(self.theme.text_muted),
                    );
                });
            });

            ui.separator();

            egui::Grid::new("debug_stats")
                .num_columns(2)
                .spacing([20.0, 4.0])
                .show(ui, |ui| {
                    let info = &self.state.debug_info;
                    self.stat_row(ui, "Messages", &self.state.log.len().to_string());
                    self.stat_row(ui, "Listening", if self.state.is_listening() { "yes" } else { "no" });
                    self.stat_row(ui, "In flight", &self.state.answers.in_flight().to_string());
                    self.stat_row(
                        ui,
                        "Answers",
                        &format!("{} ({} failed)", info.answers_received, info.failed_answers),
                    );
                    let last = info
                        .last_answer
                        .map(|d| format!("{} ms", d.as_millis()))
                        .unwrap_or_default();
                    self.stat_row(ui, "Last answer", &last);
                    self.stat_row(ui, "Sessions", &self.state.playback.len().to_string());
                    let active = self
                        .state
                        .playback
                        .active()
                        .map(|id| id.to_string()[..8].to_string())
                        .unwrap_or_default();
                    self.stat_row(ui, "Speaking", &active);
                    let animator = self.state.playback.animator();
                    self.stat_row(
                        ui,
                        "Avatar",
                        &format!(
                            "{} {}/{}",
                            if animator.is_running() { "running" } else { "stopped" },
                            animator.frame_index(),
                            animator.frame_count()
                        ),
                    );
                });

            ui.add_space(self.theme.spacing_sm);
            self.section_title(ui, "Playback Transitions");

            ScrollArea::vertical()
                .id_salt("debug_transitions")
                .max_height(120.0)
                .auto_shrink([false, true])
                .stick_to_bottom(true)
                .show(ui, |ui| {
                    for record in self.state.playback.history() {
                        ui.label(
                            RichText::new(format!(
                                "{} {} {:?}: {:?} -> {:?}",
                                record.at.format("%H:%M:%S%.3f"),
                                &record.session_id.to_string()[..8],
                                record.input,
                                record.from,
                                record.to
                            ))
                            .size(11.0)
                            .family(egui::FontFamily::Monospace)
                            .color(self.theme.text_muted),
                        );
                    }
                });

            ui.add_space(self.theme.spacing_sm);
            self.section_title(ui, "Recent Logs");

            ScrollArea::vertical()
                .id_salt("debug_logs")
                .auto_shrink([false, false])
                .stick_to_bottom(true)
                .show(ui, |ui| {
                    for msg in &self.state.debug_info.log_messages {
                        ui.label(
                            RichText::new(msg)
                                .size(11.0)
                                .family(egui::FontFamily::Monospace)
                                .color(self.theme.text_muted),
                        );
                    }

                    if self.state.debug_info.log_messages.is_empty() {
                        ui.label(
                            RichText::new("No log messages")
                                .size(11.0)
                                .color(self.theme.text_muted)
                                .italics(),
                        );
                    }
                });
        });
    }

    fn section_title(&self, ui: &mut egui::Ui, title: &str) {
        ui.label(
            RichText::new(title)
                .size(12.0)
                .strong()
                .color(self.theme.text_secondary),
        );
    }

    fn stat_row(&self, ui: &mut egui::Ui, label: &str, value: &str) {
        ui.label(RichText::new(label).size(12.0).color(self.theme.text_muted));

        let display_value = if value.is_empty() { "—" } else { value };
        ui.label(
            RichText::new(display_value)
                .size(12.0)
                .family(egui::FontFamily::Monospace)
                .color(self.theme.text_primary),
        );

        ui.end_row();
    }
}
