use glam::{Vec2, Vec3};

use super::{Tool, ToolContext, ToolKind};
use crate::events::ViewportEvent;

/// Left-drag panning; the hovered point at press time stays under the pointer
#[derive(Debug, Clone, Default)]
pub struct PanTool {
    active: bool,
    origin: Vec3,
}

impl Tool for PanTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Pan
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn start(&mut self, ctx: &mut ToolContext) {
        self.active = true;
        self.origin = ctx.hover_point;
        tracing::debug!("Pan started at {:?}", self.origin);
    }

    fn update(&mut self, delta: Vec2, ctx: &mut ToolContext) {
        if !self.active {
            return;
        }
        let normalized = ctx.normalized(delta).extend(0.0);
        if ctx
            .camera
            .pan(normalized, ctx.navigation.scroll_pan_step, self.origin)
        {
            ctx.events.push(ViewportEvent::CameraChange);
        }
    }

    fn end(&mut self, _ctx: &mut ToolContext) -> bool {
        self.active = false;
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
    fn test_drag_keeps_origin_under_pointer() {
        let mut rig = Rig::new();
        let mut pan = PanTool::default();
        pan.start(&mut rig.ctx());
        let before = rig.camera.project(Vec3::ZERO).unwrap();

        pan.update(Vec2::new(12.0, -8.0), &mut rig.ctx());
        let after = rig.camera.project(Vec3::ZERO).unwrap();
        assert!((after - before).abs_diff_eq(Vec2::new(12.0, -8.0), 0.05));
        assert_eq!(rig.events, vec![ViewportEvent::CameraChange]);
    }

    #[test]
    fn test_inactive_update_is_ignored() {
        let mut rig = Rig::new();
        let mut pan = PanTool::default();
        pan.update(Vec2::new(5.0, 5.0), &mut rig.ctx());
        assert!(rig.events.is_empty());
    }
}
