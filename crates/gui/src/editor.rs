//! Frame-loop glue between host input, the tool coordinator, the camera and
//! the hit test.
//!
//! The host feeds normalized [`InputEvent`]s through [`Editor::handle_input`]
//! and, whenever that asks for it, runs [`Editor::pick`] once the frame's
//! pick backend is available.

use glam::{Vec2, Vec3};

use crate::error::PickError;
use crate::events::{EventBus, ViewportEvent};
use crate::input::{InputEvent, PointerState};
use crate::scene::SceneHost;
use crate::state::settings::ViewportSettings;
use crate::tools::{
    CoordinatorState, HostRequests, RegionGeometry, ToolContext, ToolCoordinator, ToolKind,
};
use crate::viewport::camera::ViewCamera;
use crate::viewport::hit_test::{HitTestPipeline, HoverResult, PickBackend};

/// What the host has to do after an input event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameAction {
    None,
    /// Run [`Editor::pick`] this frame
    Pick,
}

pub struct Editor {
    camera: ViewCamera,
    pointer: PointerState,
    coordinator: ToolCoordinator,
    pipeline: HitTestPipeline,
    bus: EventBus,
    settings: ViewportSettings,
    hover: Option<HoverResult>,
    pick_pending: bool,
    /// Events raised by tools, flushed to the bus after each input
    outbox: Vec<ViewportEvent>,
}

impl Editor {
    pub fn new(settings: ViewportSettings) -> Self {
        Self {
            camera: ViewCamera::new(),
            pointer: PointerState::default(),
            coordinator: ToolCoordinator::new(),
            pipeline: HitTestPipeline::new(&settings.picking),
            bus: EventBus::new(),
            settings,
            hover: None,
            pick_pending: false,
            outbox: Vec::new(),
        }
    }

    pub fn with_camera(mut self, camera: ViewCamera) -> Self {
        self.camera = camera;
        self
    }

    pub fn camera(&self) -> &ViewCamera {
        &self.camera
    }

    pub fn pointer(&self) -> &PointerState {
        &self.pointer
    }

    pub fn coordinator(&self) -> &ToolCoordinator {
        &self.coordinator
    }

    pub fn tool_state(&self) -> CoordinatorState {
        self.coordinator.state()
    }

    pub fn bus(&mut self) -> &mut EventBus {
        &mut self.bus
    }

    pub fn settings(&self) -> &ViewportSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: ViewportSettings) {
        self.pipeline.apply_settings(&settings.picking);
        self.settings = settings;
    }

    /// Current hover; `None` until a pick resolved or after a failed pick
    pub fn hover(&self) -> Option<&HoverResult> {
        self.hover.as_ref()
    }

    pub fn is_pick_pending(&self) -> bool {
        self.pick_pending
    }

    /// Index of the work plane chosen by the last background pick
    pub fn current_axis(&self) -> Option<usize> {
        self.pipeline.current_axis()
    }

    /// Selection rectangle overlay in clip space, while the select tool drags
    pub fn selection_geometry(&self) -> Option<RegionGeometry> {
        self.coordinator
            .select_tool()
            .region()
            .map(|r| r.geometry(self.camera.pixel_to_clip_scale()))
    }

    /// Replace the camera, keeping the current viewport size
    pub fn set_camera(&mut self, camera: ViewCamera) -> FrameAction {
        let size = self.camera.resolution();
        self.camera = camera;
        self.camera.set_resolution(size);
        self.bus.publish(&ViewportEvent::CameraChange);
        self.request_pick();
        self.frame_action()
    }

    /// The scene was swapped out: the old hover points at solids that are gone
    pub fn scene_replaced(&mut self) -> FrameAction {
        self.hover = None;
        self.request_pick();
        self.frame_action()
    }

    /// Viewport size changed (pixels)
    /// Resize the viewport. Fractional logical sizes snap to whole pixels so
    /// the pick grid covers every pointer position inside the panel.
    pub fn resize(&mut self, size: Vec2) -> FrameAction {
        if self.camera.set_resolution(size.round()) {
            self.bus.publish(&ViewportEvent::CameraChange);
            self.request_pick();
        }
        self.frame_action()
    }

    pub fn set_tool(&mut self, kind: Option<ToolKind>, host: &mut dyn HostRequests) -> FrameAction {
        let hover_point = self.hover_point();
        let mut ctx = ToolContext {
            camera: &mut self.camera,
            pointer: &self.pointer,
            hover_point,
            navigation: &self.settings.navigation,
            host,
            events: &mut self.outbox,
        };
        self.coordinator.set_tool(kind, &mut ctx);
        self.flush();
        self.request_pick();
        self.frame_action()
    }

    pub fn handle_input(&mut self, event: InputEvent, host: &mut dyn HostRequests) -> FrameAction {
        self.bus.publish(&ViewportEvent::from(event));
        self.pointer.apply(&event);

        let hover_point = self.hover_point();
        let mut ctx = ToolContext {
            camera: &mut self.camera,
            pointer: &self.pointer,
            hover_point,
            navigation: &self.settings.navigation,
            host,
            events: &mut self.outbox,
        };

        let mut needs_pick = false;
        match event {
            InputEvent::MouseMove { delta, .. } => {
                if !self.coordinator.pointer_delta(delta, &mut ctx) {
                    needs_pick = true;
                }
            }
            InputEvent::MouseDown(button) => self.coordinator.mouse_down(button, &mut ctx),
            InputEvent::MouseUp(button) => {
                self.coordinator.mouse_up(button, &mut ctx);
                needs_pick = self.coordinator.active().is_none();
            }
            InputEvent::MouseScroll(direction) => {
                let amount = f32::from(direction.signum());
                let moved = if self.pointer.shift {
                    ctx.camera.pan(
                        Vec3::new(0.0, 0.0, amount),
                        ctx.navigation.scroll_pan_step,
                        hover_point,
                    )
                } else {
                    ctx.camera.zoom(amount * ctx.navigation.zoom_step)
                };
                if moved {
                    ctx.events.push(ViewportEvent::CameraChange);
                    needs_pick = self.coordinator.active().is_none();
                }
            }
            InputEvent::KeyDown(key) => {
                self.coordinator.key_down(key, &mut ctx);
            }
            InputEvent::KeyUp(_) => {}
        }

        self.flush();
        if needs_pick {
            self.request_pick();
        }
        self.frame_action()
    }

    /// Run the pending hit test against `backend`. On failure the stale hover
    /// is dropped and the pick stays pending for the next frame.
    pub fn pick<B, S>(&mut self, backend: &mut B, scene: &mut S) -> Result<Option<&HoverResult>, PickError>
    where
        B: PickBackend + ?Sized,
        S: SceneHost + ?Sized,
    {
        if !self.pick_pending {
            return Ok(self.hover.as_ref());
        }

        let pointer = self.pointer.position;
        scene.track_pointer(&self.camera.pointer_ray(pointer));

        let outcome = match self.pipeline.hit_test(backend, &self.camera, pointer, &*scene) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.hover = None;
                if let PickError::PointerOutside { .. } = e {
                    // Nothing to pick until the pointer comes back
                    tracing::debug!("Skipping pick: {}", e);
                    self.pick_pending = false;
                } else {
                    tracing::warn!("Hit test failed: {}", e);
                }
                return Err(e);
            }
        };
        self.pick_pending = false;

        if let Some(normal) = outcome.axis_change {
            scene.set_axis_normal(normal);
            self.bus.publish(&ViewportEvent::AxisChange(normal));
        }
        if let Some(hover) = &outcome.hover {
            scene.hover(hover);
            self.bus.publish(&ViewportEvent::Hover(hover.clone()));
        }
        self.hover = outcome.hover;
        Ok(self.hover.as_ref())
    }

    /// Pivot for orbit, pan and scroll: the hovered point, else the camera target
    fn hover_point(&self) -> Vec3 {
        self.hover
            .as_ref()
            .map_or(self.camera.target(), |h| h.point)
    }

    fn request_pick(&mut self) {
        if self.coordinator.active().is_none() {
            self.pick_pending = true;
        }
    }

    fn frame_action(&self) -> FrameAction {
        if self.pick_pending {
            FrameAction::Pick
        } else {
            FrameAction::None
        }
    }

    fn flush(&mut self) {
        for event in self.outbox.drain(..) {
            self.bus.publish(&event);
        }
    }
}
