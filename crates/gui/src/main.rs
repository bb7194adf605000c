mod app;
mod ui;
mod viewport;

// Re-export library modules so that `crate::editor`, `crate::scene`, etc.
// resolve to the lib crate types everywhere in the binary.
pub use solidpick_gui_lib::{editor, error, events, input, scene, state, tools};

use std::path::PathBuf;

use app::SolidPickApp;
use scene::SceneState;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "solidpick_gui=info,solidpick_gui_lib=info".into()),
        )
        .init();

    let scene = match parse_scene_arg() {
        Some(path) => SceneState::load(&path).unwrap_or_else(|e| {
            tracing::error!("{e}; falling back to the demo scene");
            SceneState::from_description(&shared::SceneDescription::demo())
        }),
        None => SceneState::from_description(&shared::SceneDescription::demo()),
    };

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("solidpick")
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([640.0, 400.0]),
        ..Default::default()
    };

    if let Err(e) = eframe::run_native(
        "solidpick-gui",
        native_options,
        Box::new(move |cc| Ok(Box::new(SolidPickApp::new(cc, scene)))),
    ) {
        tracing::error!("Failed to start application: {e}");
    }
}

/// `--scene <path>`
fn parse_scene_arg() -> Option<PathBuf> {
    let args: Vec<String> = std::env::args().collect();
    args.iter()
        .position(|a| a == "--scene")
        .and_then(|i| args.get(i + 1))
        .map(PathBuf::from)
}
