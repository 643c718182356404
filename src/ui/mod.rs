//! GUI implementation with egui/eframe

pub mod app;
pub mod assets;
pub mod components;
pub mod state;
pub mod theme;

pub use app::CatMiniApp;
pub use assets::{AssetTextures, Assets};
pub use state::{AppState, DebugInfo};
pub use theme::Theme;

/// Open the CatMini window and block until it is closed
pub fn run(state: AppState, assets: Assets) -> eframe::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([600.0, 760.0])
            .with_resizable(false)
            .with_title("CatMini")
            .with_icon(assets.window_icon()),
        ..Default::default()
    };

    eframe::run_native(
        "CatMini",
        options,
        Box::new(|_cc| Ok(Box::new(CatMiniApp::new(state, Some(assets))))),
    )
}
