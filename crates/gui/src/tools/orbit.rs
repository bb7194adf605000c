use glam::{Vec2, Vec3};

use super::{Tool, ToolContext, ToolKind};
use crate::events::ViewportEvent;
use crate::input::MouseButton;

/// Camera orbiter. Revolves the view around the point that was hovered when
/// the drag started and holds the pointer lock while active.
#[derive(Debug, Clone)]
pub struct OrbitTool {
    active: bool,
    /// Button that keeps the orbit alive; `end` is vetoed while it is held
    button: MouseButton,
    origin: Vec3,
}

impl Default for OrbitTool {
    fn default() -> Self {
        Self {
            active: false,
            button: MouseButton::Left,
            origin: Vec3::ZERO,
        }
    }
}

impl OrbitTool {
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn button(&self) -> MouseButton {
        self.button
    }
}

impl Tool for OrbitTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Orbit
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn start(&mut self, ctx: &mut ToolContext) {
        self.active = true;
        self.button = if ctx.pointer.middle {
            MouseButton::Middle
        } else {
            MouseButton::Left
        };
        self.origin = ctx.hover_point;
        ctx.host.request_pointer_lock();
        tracing::debug!("Orbit started around {:?} ({:?} button)", self.origin, self.button);
    }

    fn update(&mut self, delta: Vec2, ctx: &mut ToolContext) {
        if !self.active {
            return;
        }
        let normalized = ctx.normalized(delta);
        if ctx
            .camera
            .orbit(normalized, ctx.navigation.orbit_speed, self.origin)
        {
            ctx.events.push(ViewportEvent::CameraChange);
        }
    }

    fn end(&mut self, ctx: &mut ToolContext) -> bool {
        if !self.active {
            return true;
        }
        if ctx.pointer.is_down(self.button) {
            return false;
        }
        self.active = false;
        ctx.host.release_pointer_lock();
        tracing::debug!("Orbit ended");
        true
    }

    fn abort(&mut self, ctx: &mut ToolContext) {
        self.active = false;
        ctx.host.release_pointer_lock();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::Rig;

    #[test]
    fn test_start_locks_pointer_and_end_releases() {
        let mut rig = Rig::new();
        let mut orbit = OrbitTool::default();
        rig.pointer.left = true;
        orbit.start(&mut rig.ctx());
        assert!(orbit.is_active());
        assert!(rig.host.locked);

        // Button still held: vetoed
        assert!(!orbit.end(&mut rig.ctx()));
        assert!(orbit.is_active());

        rig.pointer.left = false;
        assert!(orbit.end(&mut rig.ctx()));
        assert!(!orbit.is_active());
        assert!(!rig.host.locked);

        // Idempotent
        assert!(orbit.end(&mut rig.ctx()));
        assert_eq!(rig.host.release_requests, 1);
    }

    #[test]
    fn test_update_moves_camera_and_reports_change() {
        let mut rig = Rig::new();
        let mut orbit = OrbitTool::default();
        orbit.start(&mut rig.ctx());
        let yaw = rig.camera.yaw();

        orbit.update(Vec2::new(10.0, 0.0), &mut rig.ctx());
        assert!(rig.camera.yaw() < yaw);
        assert_eq!(rig.events, vec![ViewportEvent::CameraChange]);

        orbit.update(Vec2::ZERO, &mut rig.ctx());
        assert_eq!(rig.events.len(), 1);
    }

    #[test]
    fn test_abort_ignores_held_button() {
        let mut rig = Rig::new();
        let mut orbit = OrbitTool::default();
        rig.pointer.middle = true;
        orbit.start(&mut rig.ctx());
        assert_eq!(orbit.button(), MouseButton::Middle);

        orbit.abort(&mut rig.ctx());
        assert!(!orbit.is_active());
        assert!(!rig.host.locked);
    }
}
