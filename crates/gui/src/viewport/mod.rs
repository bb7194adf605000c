//! 3D viewport panel with OpenGL rendering and GPU picking

mod gl_pick;
mod gl_renderer;
mod overlays;
pub use solidpick_gui_lib::viewport::{camera, hit_test, mesh};

use std::sync::{Arc, Mutex};

use egui::Ui;
use glam::Vec2;

use crate::editor::{Editor, FrameAction};
use crate::input::{InputEvent, Key, MouseButton};
use crate::scene::{SceneState, Solid};
use crate::tools::{HostRequests, ToolKind};
use camera::ViewCamera;
use gl_pick::GlPickBackend;
use gl_renderer::GlRenderer;

/// Pointer lock through the window's cursor grab
struct EguiHost<'a> {
    ctx: &'a egui::Context,
    locked: &'a mut bool,
}

impl HostRequests for EguiHost<'_> {
    fn request_pointer_lock(&mut self) {
        if *self.locked {
            return;
        }
        self.ctx
            .send_viewport_cmd(egui::ViewportCommand::CursorGrab(egui::CursorGrab::Locked));
        self.ctx.send_viewport_cmd(egui::ViewportCommand::CursorVisible(false));
        *self.locked = true;
    }

    fn release_pointer_lock(&mut self) {
        if !*self.locked {
            return;
        }
        self.ctx
            .send_viewport_cmd(egui::ViewportCommand::CursorGrab(egui::CursorGrab::None));
        self.ctx.send_viewport_cmd(egui::ViewportCommand::CursorVisible(true));
        *self.locked = false;
    }
}

/// 3D viewport panel with OpenGL rendering
pub struct ViewportPanel {
    gl: Option<Arc<glow::Context>>,
    gl_renderer: Option<Arc<Mutex<GlRenderer>>>,
    pick: Option<GlPickBackend>,
    /// Last pointer position in viewport pixels
    last_pointer: Option<Vec2>,
    shift: bool,
    pointer_locked: bool,
    /// Bumped whenever the scene is replaced so GPU uploads refresh
    scene_version: u64,
    /// Solids handed to the paint callback, rebuilt when the version moves
    snapshot: Option<(u64, Arc<Vec<Solid>>)>,
    last_pick_error: Option<String>,
}

impl ViewportPanel {
    pub fn new() -> Self {
        Self {
            gl: None,
            gl_renderer: None,
            pick: None,
            last_pointer: None,
            shift: false,
            pointer_locked: false,
            scene_version: 0,
            snapshot: None,
            last_pick_error: None,
        }
    }

    /// Initialize GL renderer and pick target (must be called with a GL context)
    pub fn init_gl(&mut self, gl: &Arc<glow::Context>) {
        self.gl_renderer = Some(Arc::new(Mutex::new(GlRenderer::new(gl))));
        match GlPickBackend::new(gl.clone()) {
            Ok(pick) => self.pick = Some(pick),
            Err(e) => tracing::error!("GPU picking disabled: {}", e),
        }
        self.gl = Some(gl.clone());
    }

    /// The scene was replaced: drop uploaded geometry
    pub fn scene_changed(&mut self) {
        self.scene_version += 1;
        if let Some(pick) = &mut self.pick {
            pick.clear_geometry();
        }
    }

    pub fn last_pick_error(&self) -> Option<&str> {
        self.last_pick_error.as_deref()
    }

    pub fn reset_camera(&mut self, ctx: &egui::Context, editor: &mut Editor) {
        let action = editor.set_camera(ViewCamera::new());
        if action == FrameAction::Pick {
            ctx.request_repaint();
        }
    }

    pub fn set_tool(&mut self, ctx: &egui::Context, editor: &mut Editor, kind: Option<ToolKind>) {
        let mut host = EguiHost {
            ctx,
            locked: &mut self.pointer_locked,
        };
        editor.set_tool(kind, &mut host);
    }

    pub fn show(&mut self, ui: &mut Ui, editor: &mut Editor, scene: &mut SceneState) {
        let (rect, response) =
            ui.allocate_exact_size(ui.available_size(), egui::Sense::click_and_drag());

        editor.resize(Vec2::new(rect.width(), rect.height()));

        // ── Input → editor ──────────────────────────────────
        let events = self.collect_input(ui, rect, &response, editor);
        let ctx = ui.ctx().clone();
        let mut host = EguiHost {
            ctx: &ctx,
            locked: &mut self.pointer_locked,
        };
        for event in events {
            editor.handle_input(event, &mut host);
        }

        // ── Pick ────────────────────────────────────────────
        if editor.is_pick_pending() {
            self.run_pick(editor, scene);
        }

        // ── Cursor ──────────────────────────────────────────
        if response.hovered() {
            if let Some(kind) = editor.coordinator().active().or(editor.coordinator().selected()) {
                ui.ctx().set_cursor_icon(kind.info().cursor);
            }
        }

        if !ui.is_rect_visible(rect) {
            return;
        }

        self.render_gl(ui, rect, editor, scene);
        self.draw_overlays(ui, rect, editor, scene);
    }

    fn run_pick(&mut self, editor: &mut Editor, scene: &mut SceneState) {
        let Some(pick) = &mut self.pick else {
            return;
        };
        match editor.pick(pick, scene) {
            Ok(_) => self.last_pick_error = None,
            Err(e) => self.last_pick_error = Some(e.to_string()),
        }
    }

    /// Translate this frame's egui events into normalized viewport input
    fn collect_input(
        &mut self,
        ui: &Ui,
        rect: egui::Rect,
        response: &egui::Response,
        editor: &Editor,
    ) -> Vec<InputEvent> {
        let mut out = Vec::new();
        let to_local = |pos: egui::Pos2| Vec2::new(pos.x - rect.min.x, pos.y - rect.min.y);
        let tool_active = editor.coordinator().active().is_some();
        let text_focused = ui.ctx().memory(|m| m.focused().is_some());

        let (events, shift) = ui.input(|i| (i.events.clone(), i.modifiers.shift));

        if shift != self.shift && !text_focused {
            self.shift = shift;
            out.push(if shift {
                InputEvent::KeyDown(Key::Shift)
            } else {
                InputEvent::KeyUp(Key::Shift)
            });
        }

        for event in events {
            match event {
                egui::Event::PointerMoved(pos) if !self.pointer_locked => {
                    if !rect.contains(pos) && !tool_active {
                        continue;
                    }
                    let current = to_local(pos);
                    let previous = self.last_pointer.unwrap_or(current);
                    self.last_pointer = Some(current);
                    out.push(InputEvent::moved(previous, current));
                }
                egui::Event::MouseMoved(delta) if self.pointer_locked => {
                    // Locked cursor: the position stays put, only the delta moves
                    let current = self.last_pointer.unwrap_or_default();
                    out.push(InputEvent::MouseMove {
                        current,
                        delta: Vec2::new(delta.x, delta.y),
                        previous: current,
                    });
                }
                egui::Event::PointerButton {
                    pos,
                    button,
                    pressed,
                    ..
                } => {
                    let Some(button) = map_button(button) else {
                        continue;
                    };
                    if pressed && !rect.contains(pos) {
                        continue;
                    }
                    if !pressed && !editor.pointer().is_down(button) {
                        continue;
                    }
                    out.push(if pressed {
                        InputEvent::MouseDown(button)
                    } else {
                        InputEvent::MouseUp(button)
                    });
                }
                egui::Event::MouseWheel { delta, .. } if response.hovered() => {
                    if delta.y != 0.0 {
                        out.push(InputEvent::MouseScroll(delta.y.signum() as i8));
                    }
                }
                egui::Event::Key {
                    key,
                    pressed,
                    repeat: false,
                    modifiers,
                    ..
                } if !text_focused && !modifiers.command => {
                    let Some(key) = map_key(key) else {
                        continue;
                    };
                    out.push(if pressed {
                        InputEvent::KeyDown(key)
                    } else {
                        InputEvent::KeyUp(key)
                    });
                }
                egui::Event::PointerGone if !tool_active => {
                    self.last_pointer = None;
                }
                _ => {}
            }
        }
        out
    }

    fn render_gl(&mut self, ui: &mut Ui, rect: egui::Rect, editor: &Editor, scene: &SceneState) {
        let version = self.scene_version;
        let solids = match &self.snapshot {
            Some((v, solids)) if *v == version => solids.clone(),
            _ => {
                let solids = Arc::new(scene.solids().to_vec());
                self.snapshot = Some((version, solids.clone()));
                solids
            }
        };

        let Some(gl_renderer) = &self.gl_renderer else {
            ui.painter().text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                "OpenGL unavailable",
                egui::FontId::proportional(14.0),
                egui::Color32::from_rgb(200, 100, 100),
            );
            return;
        };

        let renderer_clone = gl_renderer.clone();
        let view_projection = editor.camera().view_projection();
        let settings = editor.settings().clone();
        let hovered = scene.hovered_id().map(str::to_string);
        let region = editor.selection_geometry();

        let callback = egui::PaintCallback {
            rect,
            callback: Arc::new(eframe::egui_glow::CallbackFn::new(move |info, painter| {
                let gl = painter.gl();

                let clip = info.clip_rect_in_pixels();
                let viewport = [
                    clip.left_px as f32,
                    clip.from_bottom_px as f32,
                    clip.width_px as f32,
                    clip.height_px as f32,
                ];

                if let Ok(mut r) = renderer_clone.lock() {
                    r.update_grid(gl, &settings.grid);
                    r.update_axes(gl, &settings.axes);
                    r.sync_solids(gl, &solids, version);

                    let params = gl_renderer::RenderParams {
                        viewport,
                        grid_visible: settings.grid.visible,
                        axes_visible: settings.axes.visible,
                        bg_color: settings.background_color,
                        hovered: hovered.clone(),
                        region,
                        region_fill: settings.selection_fill,
                        region_outline: settings.selection_outline,
                    };
                    r.paint(gl, view_projection, &params);
                }
            })),
        };

        ui.painter().add(callback);
    }

    fn draw_overlays(&self, ui: &mut Ui, rect: egui::Rect, editor: &Editor, scene: &SceneState) {
        let painter = ui.painter_at(rect);
        let camera = editor.camera();
        let axes = &editor.settings().axes;

        if axes.visible && axes.show_labels {
            overlays::draw_axis_labels(&painter, rect, camera, axes.length);
        }
        overlays::draw_camera_info(&painter, rect, camera);

        if editor.coordinator().active().is_none() {
            if let Some(hover) = editor.hover() {
                overlays::draw_hover(&painter, rect, camera, scene, hover);
            }
        }

        if scene.solids().is_empty() {
            painter.text(
                egui::pos2(rect.center().x, rect.bottom() - 20.0),
                egui::Align2::CENTER_BOTTOM,
                "Middle drag: orbit  |  Scroll: zoom  |  Shift+scroll: dolly  |  O/S/P: tools",
                egui::FontId::proportional(11.0),
                egui::Color32::from_rgb(100, 100, 110),
            );
        }
    }

    pub fn destroy(&mut self) {
        if let Some(pick) = &mut self.pick {
            pick.destroy();
        }
        if let (Some(gl), Some(renderer)) = (&self.gl, &self.gl_renderer) {
            if let Ok(mut r) = renderer.lock() {
                r.destroy(gl);
            }
        }
    }
}

fn map_button(button: egui::PointerButton) -> Option<MouseButton> {
    match button {
        egui::PointerButton::Primary => Some(MouseButton::Left),
        egui::PointerButton::Middle => Some(MouseButton::Middle),
        egui::PointerButton::Secondary => Some(MouseButton::Right),
        _ => None,
    }
}

fn map_key(key: egui::Key) -> Option<Key> {
    if key == egui::Key::Escape {
        return Some(Key::Escape);
    }
    let mut chars = key.name().chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphanumeric() => Some(Key::Char(c.to_ascii_lowercase())),
        _ => None,
    }
}
