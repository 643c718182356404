//! Main application struct and eframe integration

use crate::ui::assets::{AssetTextures, Assets};
use crate::ui::components::{DebugPanel, Header, InputBar, MessageList};
use crate::ui::state::AppState;
use crate::ui::theme::Theme;
use egui::{self, CentralPanel, SidePanel, TopBottomPanel};
use std::time::{Duration, Instant};
use tracing::debug;

/// Repaint cadence while a background job may deliver a result
const BUSY_REPAINT: Duration = Duration::from_millis(50);

pub struct CatMiniApp {
    state: AppState,
    theme: Theme,
    /// Decoded images waiting for the first frame to be uploaded
    pending_assets: Option<Assets>,
    textures: Option<AssetTextures>,
    /// Log length at the last frame, to spot appends
    rendered_messages: usize,
    last_frame_time: Instant,
    theme_applied: bool,
}

impl CatMiniApp {
    pub fn new(state: AppState, assets: Option<Assets>) -> Self {
        Self {
            state,
            theme: Theme::dark(),
            pending_assets: assets,
            textures: None,
            rendered_messages: 0,
            last_frame_time: Instant::now(),
            theme_applied: false,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut AppState {
        &mut self.state
    }

    /// Poll workers and draw one frame
    pub fn show(&mut self, ctx: &egui::Context) {
        if !self.theme_applied {
            self.theme.apply(ctx);
            self.theme_applied = true;
        }
        if let Some(assets) = self.pending_assets.take() {
            self.textures = Some(AssetTextures::upload(ctx, &assets));
            debug!("Uploaded {} avatar frames", assets.frame_count());
        }

        let now = Instant::now();
        self.state.poll_events(now);
        let next_frame = self.state.tick(now);

        self.show_header(ctx);
        self.show_input_area(ctx);
        self.show_debug_panel(ctx);
        self.show_content(ctx, now);

        if let Some(delay) = next_frame {
            ctx.request_repaint_after(delay);
        }
        if self.state.is_busy() {
            ctx.request_repaint_after(BUSY_REPAINT);
        }
    }

    fn show_header(&mut self, ctx: &egui::Context) {
        TopBottomPanel::top("header")
            .frame(egui::Frame::none().fill(self.theme.bg_bar).inner_margin(self.theme.spacing_sm))
            .show(ctx, |ui| {
                Header::new(&mut self.state, &self.theme, self.textures.as_ref()).show(ui);
            });
    }

    fn show_input_area(&mut self, ctx: &egui::Context) {
        TopBottomPanel::bottom("input_area")
            .frame(egui::Frame::none().fill(self.theme.bg_bar).inner_margin(self.theme.spacing))
            .show(ctx, |ui| {
                InputBar::new(&mut self.state, &self.theme).show(ui);
            });
    }

    fn show_debug_panel(&mut self, ctx: &egui::Context) {
        if !self.state.show_debug_panel {
            return;
        }

        SidePanel::right("debug_panel")
            .resizable(true)
            .default_width(260.0)
            .min_width(200.0)
            .frame(egui::Frame::none().fill(self.theme.bg_bar).inner_margin(self.theme.spacing))
            .show(ctx, |ui| {
                DebugPanel::new(&self.state, &self.theme).show(ui);
            });
    }

    fn show_content(&mut self, ctx: &egui::Context, now: Instant) {
        let message_count = self.state.log.len();
        let appended = message_count > self.rendered_messages;
        self.rendered_messages = message_count;

        let toggled = CentralPanel::default()
            .frame(egui::Frame::none().fill(self.theme.bg_window))
            .show(ctx, |ui| {
                MessageList::new(&self.state, &self.theme, self.textures.as_ref())
                    .scroll_to_latest(appended)
                    .show(ui)
            })
            .inner;

        if let Some(message_id) = toggled {
            self.state.toggle_playback(message_id, now);
            ctx.request_repaint();
        }
    }
}

impl eframe::App for CatMiniApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        let delta = now.duration_since(self.last_frame_time).as_secs_f64();
        self.last_frame_time = now;
        self.state.update_fps(delta);

        self.show(ctx);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.state.shutdown();
    }
}
