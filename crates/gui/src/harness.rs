//! Headless test harness: an editor wired to an in-memory scene, the CPU
//! pick target and a recording host, driven by synthetic pointer input.

use std::cell::RefCell;
use std::rc::Rc;

use glam::{Vec2, Vec3};
use shared::{Primitive, SceneDescription, Transform};

use crate::editor::{Editor, FrameAction};
use crate::error::PickError;
use crate::events::{EventKind, ViewportEvent};
use crate::input::{InputEvent, Key, MouseButton};
use crate::scene::{SceneState, Solid};
use crate::state::settings::ViewportSettings;
use crate::tools::{CoordinatorState, RecordingHost, ToolKind};
use crate::viewport::camera::ViewCamera;
use crate::viewport::hit_test::HoverResult;
use crate::viewport::software_target::SoftwarePickTarget;

/// Viewport size used unless a test resizes it
pub const DEFAULT_SIZE: Vec2 = Vec2::new(320.0, 240.0);

/// Editor, scene, pick target and host wired together for headless tests
pub struct TestHarness {
    pub editor: Editor,
    pub scene: SceneState,
    pub target: SoftwarePickTarget,
    pub host: RecordingHost,
    events: Rc<RefCell<Vec<ViewportEvent>>>,
    last_error: Option<PickError>,
}

impl TestHarness {
    /// Create a harness over an empty scene
    pub fn new() -> Self {
        let mut editor = Editor::new(ViewportSettings::default())
            .with_camera(ViewCamera::looking_at(Vec3::ZERO, 0.6, 0.4, 8.0));
        editor.resize(DEFAULT_SIZE);

        let events = Rc::new(RefCell::new(Vec::new()));
        let log = events.clone();
        editor
            .bus()
            .subscribe_all(move |e| log.borrow_mut().push(e.clone()));

        Self {
            editor,
            scene: SceneState::new(),
            target: SoftwarePickTarget::new(),
            host: RecordingHost::default(),
            events,
            last_error: None,
        }
    }

    // ── Scene setup ───────────────────────────────────────────

    /// Load a scene (replaces current)
    pub fn load_scene(&mut self, scene: &SceneDescription) {
        self.scene = SceneState::from_description(scene);
        let action = self.editor.scene_replaced();
        self.after(action);
    }

    /// Load a scene from JSON string
    pub fn load_scene_json(&mut self, json: &str) -> Result<(), String> {
        let scene: SceneDescription =
            serde_json::from_str(json).map_err(|e| format!("JSON parse error: {e}"))?;
        self.load_scene(&scene);
        Ok(())
    }

    /// Add a solid built from a primitive and return its ID
    pub fn add_primitive(&mut self, id: &str, primitive: Primitive, transform: Transform) -> String {
        let desc = shared::SolidDescription {
            id: id.to_string(),
            name: id.to_string(),
            primitive,
            transform,
        };
        self.scene.add_solid(Solid::from_description(&desc));
        desc.id
    }

    /// Add a cube centered at `position`
    pub fn add_cube(&mut self, id: &str, size: f64, position: [f64; 3]) -> String {
        let [x, y, z] = position;
        self.add_primitive(
            id,
            Primitive::Cube {
                width: size,
                height: size,
                depth: size,
            },
            Transform::new().with_position(x, y, z),
        )
    }

    pub fn set_camera(&mut self, camera: ViewCamera) {
        let action = self.editor.set_camera(camera);
        self.after(action);
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        let action = self.editor.resize(Vec2::new(width, height));
        self.after(action);
    }

    // ── Input ─────────────────────────────────────────────────

    /// Feed one normalized input event and run the pick if one was requested
    pub fn dispatch(&mut self, event: InputEvent) {
        let action = self.editor.handle_input(event, &mut self.host);
        self.after(action);
    }

    /// Move the pointer to (x, y) viewport pixels
    pub fn move_to(&mut self, x: f32, y: f32) {
        let previous = self.editor.pointer().position;
        self.dispatch(InputEvent::moved(previous, Vec2::new(x, y)));
    }

    /// Move in `steps` equal increments (one delta event each)
    pub fn drag_to(&mut self, x: f32, y: f32, steps: u32) {
        let start = self.editor.pointer().position;
        let end = Vec2::new(x, y);
        for i in 1..=steps.max(1) {
            let p = start.lerp(end, i as f32 / steps.max(1) as f32);
            self.move_to(p.x, p.y);
        }
    }

    pub fn press(&mut self, button: MouseButton) {
        self.dispatch(InputEvent::MouseDown(button));
    }

    pub fn release(&mut self, button: MouseButton) {
        self.dispatch(InputEvent::MouseUp(button));
    }

    pub fn scroll(&mut self, direction: i8) {
        self.dispatch(InputEvent::MouseScroll(direction));
    }

    pub fn key_down(&mut self, key: Key) {
        self.dispatch(InputEvent::KeyDown(key));
    }

    pub fn key_up(&mut self, key: Key) {
        self.dispatch(InputEvent::KeyUp(key));
    }

    /// Press and release a key
    pub fn key(&mut self, key: Key) {
        self.key_down(key);
        self.key_up(key);
    }

    pub fn set_tool(&mut self, kind: Option<ToolKind>) {
        let action = self.editor.set_tool(kind, &mut self.host);
        self.after(action);
    }

    /// Run the pending pick, if any, recording a failure instead of returning it
    pub fn frame(&mut self) {
        if !self.editor.is_pick_pending() {
            return;
        }
        self.last_error = self
            .editor
            .pick(&mut self.target, &mut self.scene)
            .err();
    }

    fn after(&mut self, action: FrameAction) {
        if action == FrameAction::Pick {
            self.frame();
        }
    }

    // ── Inspection ────────────────────────────────────────────

    pub fn hover(&self) -> Option<&HoverResult> {
        self.editor.hover()
    }

    pub fn tool_state(&self) -> CoordinatorState {
        self.editor.tool_state()
    }

    pub fn active_tool(&self) -> Option<ToolKind> {
        self.editor.coordinator().active()
    }

    pub fn selected_tool(&self) -> Option<ToolKind> {
        self.editor.coordinator().selected()
    }

    pub fn camera(&self) -> &ViewCamera {
        self.editor.camera()
    }

    pub fn last_error(&self) -> Option<&PickError> {
        self.last_error.as_ref()
    }

    /// Every event published on the bus so far
    pub fn events(&self) -> Vec<ViewportEvent> {
        self.events.borrow().clone()
    }

    pub fn count_events(&self, kind: EventKind) -> usize {
        self.events.borrow().iter().filter(|e| e.kind() == kind).count()
    }

    pub fn clear_events(&mut self) {
        self.events.borrow_mut().clear();
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
