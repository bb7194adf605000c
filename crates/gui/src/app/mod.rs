//! Main application module

mod styles;

use eframe::egui;

use crate::editor::Editor;
use crate::events::{EventKind, ViewportEvent};
use crate::scene::SceneState;
use crate::state::settings::ViewportSettings;
use crate::ui::{status_bar, toolbar};
use crate::viewport::ViewportPanel;

/// Main application
pub struct SolidPickApp {
    editor: Editor,
    scene: SceneState,
    viewport: ViewportPanel,
}

impl SolidPickApp {
    pub fn new(cc: &eframe::CreationContext<'_>, scene: SceneState) -> Self {
        styles::configure_styles(&cc.egui_ctx);

        let mut editor = Editor::new(ViewportSettings::load());
        subscribe_logging(&mut editor);

        let mut viewport = ViewportPanel::new();
        if let Some(gl) = cc.gl.as_ref() {
            viewport.init_gl(gl);
        } else {
            tracing::warn!("No glow context, rendering and picking disabled");
        }

        Self {
            editor,
            scene,
            viewport,
        }
    }

    /// Replace the scene with a JSON file dropped onto the window
    fn handle_dropped_scene(&mut self, ctx: &egui::Context) {
        let Some(path) = ctx.input(|i| i.raw.dropped_files.iter().find_map(|f| f.path.clone())) else {
            return;
        };
        match SceneState::load(&path) {
            Ok(scene) => {
                self.scene = scene;
                self.viewport.scene_changed();
                self.editor.scene_replaced();
                ctx.request_repaint();
            }
            Err(e) => tracing::error!("{}", e),
        }
    }
}

/// Log the notifications nothing else in the app consumes
fn subscribe_logging(editor: &mut Editor) {
    let bus = editor.bus();
    bus.subscribe(EventKind::ToolChange, |event| {
        if let ViewportEvent::ToolChange { selected, active } = event {
            tracing::debug!("Tool change: selected {:?}, active {:?}", selected, active);
        }
    });
    bus.subscribe(EventKind::AxisChange, |event| {
        if let ViewportEvent::AxisChange(normal) = event {
            tracing::debug!("Work plane normal {:?}", normal);
        }
    });
    bus.subscribe(EventKind::RegionSelected, |event| {
        if let ViewportEvent::RegionSelected { min, max } = event {
            tracing::info!("Region selected ({:.0}, {:.0}) - ({:.0}, {:.0})", min.x, min.y, max.x, max.y);
        }
    });
}

impl eframe::App for SolidPickApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_dropped_scene(ctx);

        // ── Toolbar ───────────────────────────────────────────
        let actions = egui::TopBottomPanel::top("toolbar")
            .frame(
                egui::Frame::side_top_panel(&ctx.style()).inner_margin(egui::Margin::symmetric(8, 4)),
            )
            .show(ctx, |ui| toolbar::show(ui, &self.editor))
            .inner;

        if let Some(kind) = actions.set_tool {
            self.viewport.set_tool(ctx, &mut self.editor, kind);
        }
        if actions.reset_camera {
            self.viewport.reset_camera(ctx, &mut self.editor);
        }

        // ── Status bar ───────────────────────────────────────
        egui::TopBottomPanel::bottom("status_bar")
            .exact_height(22.0)
            .frame(
                egui::Frame::side_top_panel(&ctx.style()).inner_margin(egui::Margin::symmetric(8, 2)),
            )
            .show(ctx, |ui| {
                status_bar::show(ui, &self.editor, &self.scene, self.viewport.last_pick_error());
            });

        // ── Central panel: 3D viewport ───────────────────────
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                self.viewport.show(ui, &mut self.editor, &mut self.scene);
            });

        // A failed pick stays pending; try again next frame
        if self.editor.is_pick_pending() {
            ctx.request_repaint();
        }
    }

    fn on_exit(&mut self, _gl: Option<&glow::Context>) {
        self.editor.settings().save();
        self.viewport.destroy();
    }
}
