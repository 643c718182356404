//! Colors, spacing and text styles

use egui::{Color32, FontFamily, FontId, Rounding, Stroke, Vec2, Visuals};

/// Application theme configuration
#[derive(Clone, Debug)]
pub struct Theme {
    /// Accent for the send and microphone buttons and user bubbles
    pub primary: Color32,
    pub primary_active: Color32,
    pub error: Color32,

    /// Window background behind the conversation
    pub bg_window: Color32,
    /// Header and footer bars
    pub bg_bar: Color32,
    /// Text entry and assistant bubbles
    pub bg_input: Color32,

    pub user_bubble: Color32,
    pub assistant_bubble: Color32,
    pub system_bubble: Color32,

    pub text_primary: Color32,
    pub text_secondary: Color32,
    pub text_muted: Color32,

    pub button_rounding: Rounding,
    pub bubble_rounding: Rounding,

    pub spacing: f32,
    pub spacing_sm: f32,

    /// Wrap width of message bubbles
    pub bubble_max_width: f32,
    /// Side of the play/pause icon
    pub playback_icon_size: f32,
    pub logo_size: f32,
    pub avatar_size: f32,
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            primary: Color32::from_rgb(0x4a, 0x90, 0xe2),
            primary_active: Color32::from_rgb(0x36, 0x7b, 0xd4),
            error: Color32::from_rgb(239, 68, 68),

            bg_window: Color32::from_rgb(0x1e, 0x1e, 0x1e),
            bg_bar: Color32::from_rgb(0x2e, 0x2e, 0x2e),
            bg_input: Color32::from_rgb(0x3c, 0x3c, 0x3c),

            user_bubble: Color32::from_rgb(0x4a, 0x90, 0xe2),
            assistant_bubble: Color32::from_rgb(0x3c, 0x3c, 0x3c),
            system_bubble: Color32::from_rgb(0x2a, 0x2a, 0x2a),

            text_primary: Color32::WHITE,
            text_secondary: Color32::from_rgb(0xdd, 0xdd, 0xdd),
            text_muted: Color32::from_rgb(0x99, 0x99, 0x99),

            button_rounding: Rounding::same(4.0),
            bubble_rounding: Rounding::same(8.0),

            spacing: 10.0,
            spacing_sm: 5.0,

            bubble_max_width: 400.0,
            playback_icon_size: 20.0,
            logo_size: 24.0,
            avatar_size: 96.0,
        }
    }

    /// Text color for a bubble of the given background
    pub fn bubble_text(&self, is_user: bool) -> Color32 {
        if is_user {
            self.text_primary
        } else {
            self.text_secondary
        }
    }

    /// Apply this theme to egui
    pub fn apply(&self, ctx: &egui::Context) {
        let mut visuals = Visuals::dark();

        visuals.panel_fill = self.bg_window;
        visuals.window_fill = self.bg_bar;
        visuals.extreme_bg_color = self.bg_input;

        visuals.widgets.noninteractive.bg_fill = self.bg_bar;
        visuals.widgets.noninteractive.fg_stroke = Stroke::new(1.0, self.text_muted);

        visuals.widgets.inactive.bg_fill = self.bg_input;
        visuals.widgets.inactive.weak_bg_fill = self.bg_input;
        visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, self.text_secondary);

        visuals.widgets.hovered.bg_fill = self.primary.gamma_multiply(0.8);
        visuals.widgets.hovered.fg_stroke = Stroke::new(1.0, self.text_primary);

        visuals.widgets.active.bg_fill = self.primary_active;
        visuals.widgets.active.fg_stroke = Stroke::new(1.0, self.text_primary);

        visuals.selection.bg_fill = self.primary.gamma_multiply(0.3);
        visuals.selection.stroke = Stroke::new(1.0, self.primary);
        visuals.text_cursor.stroke = Stroke::new(2.0, self.text_primary);

        ctx.set_visuals(visuals);

        let mut style = (*ctx.style()).clone();
        style.spacing.item_spacing = Vec2::splat(self.spacing_sm);
        style.spacing.button_padding = Vec2::new(self.spacing, self.spacing_sm);

        // Arial 11-14 in the classic layout
        style.text_styles.insert(
            egui::TextStyle::Heading,
            FontId::new(18.0, FontFamily::Proportional),
        );
        style.text_styles.insert(
            egui::TextStyle::Body,
            FontId::new(14.0, FontFamily::Proportional),
        );
        style.text_styles.insert(
            egui::TextStyle::Button,
            FontId::new(14.0, FontFamily::Proportional),
        );
        style.text_styles.insert(
            egui::TextStyle::Small,
            FontId::new(11.0, FontFamily::Proportional),
        );
        style.text_styles.insert(
            egui::TextStyle::Monospace,
            FontId::new(12.0, FontFamily::Monospace),
        );

        ctx.set_style(style);
    }
}
