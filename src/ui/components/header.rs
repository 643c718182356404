//! Header bar: logo, title and the animated avatar

use crate::ui::assets::AssetTextures;
use crate::ui::state::AppState;
use crate::ui::theme::Theme;
use egui::{self, RichText, Vec2};

pub struct Header<'a> {
    state: &'a mut AppState,
    theme: &'a Theme,
    textures: Option<&'a AssetTextures>,
}

impl<'a> Header<'a> {
    pub fn new(state: &'a mut AppState, theme: &'a Theme, textures: Option<&'a AssetTextures>) -> Self {
        Self {
            state,
            theme,
            textures,
        }
    }

    pub fn show(self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if let Some(textures) = self.textures {
                ui.add(egui::Image::new(&textures.icon).fit_to_exact_size(Vec2::splat(self.theme.logo_size)));
            }

            ui.label(
                RichText::new("CatMini")
                    .size(18.0)
                    .strong()
                    .color(self.theme.text_primary),
            );

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let response = ui
                    .button("🔍")
                    .on_hover_text("Toggle Debug Panel");
                response.widget_info(|| {
                    egui::WidgetInfo::labeled(egui::WidgetType::Button, true, "Toggle debug panel")
                });
                if response.clicked() {
                    self.state.show_debug_panel = !self.state.show_debug_panel;
                }
            });
        });

        ui.vertical_centered(|ui| {
            let animator = self.state.playback.animator();
            let frame = self.textures.and_then(|t| t.avatar_frame(animator.frame_index()));
            let size = Vec2::splat(self.theme.avatar_size);

            let response = match frame {
                Some(texture) => ui.add(egui::Image::new(texture).fit_to_exact_size(size)),
                None => ui.allocate_response(size, egui::Sense::hover()),
            };

            let label = if animator.is_running() {
                "Avatar speaking"
            } else {
                "Avatar idle"
            };
            response.widget_info(|| egui::WidgetInfo::labeled(egui::WidgetType::Label, true, label));
        });
    }
}
