use glam::Vec2;

use super::{Tool, ToolContext, ToolKind};
use crate::events::ViewportEvent;

/// Screen-space selection rectangle between the press point and the pointer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionRegion {
    /// Pointer position at left press (pixels, top-left origin)
    pub press: Vec2,
    /// Current pointer position
    pub current: Vec2,
}

/// Overlay geometry in clip space: a quad as two triangles plus a closed
/// four-segment outline over the same corners
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionGeometry {
    pub vertices: [Vec2; 4],
    pub fill: [u16; 6],
    pub outline: [u16; 8],
}

impl RegionGeometry {
    /// Shoelace area over the corner loop; the sign tracks the drag direction
    pub fn signed_area(&self) -> f32 {
        let v = &self.vertices;
        0.5 * (0..4)
            .map(|i| v[i].perp_dot(v[(i + 1) % 4]))
            .sum::<f32>()
    }
}

impl SelectionRegion {
    pub fn new(press: Vec2, current: Vec2) -> Self {
        Self { press, current }
    }

    /// Normalized rectangle (min corner, max corner) in pixels
    pub fn rect(&self) -> (Vec2, Vec2) {
        (self.press.min(self.current), self.press.max(self.current))
    }

    pub fn is_empty(&self) -> bool {
        let (min, max) = self.rect();
        min.x == max.x || min.y == max.y
    }

    /// Corners in clip space: pixel * scale - (1, -1), where `scale` is the
    /// camera's pixel-to-clip factor
    pub fn geometry(&self, scale: Vec2) -> RegionGeometry {
        let to_clip = |p: Vec2| p * scale - Vec2::new(1.0, -1.0);
        let (a, c) = (self.press, self.current);
        RegionGeometry {
            vertices: [
                to_clip(a),
                to_clip(Vec2::new(c.x, a.y)),
                to_clip(c),
                to_clip(Vec2::new(a.x, c.y)),
            ],
            fill: [0, 1, 2, 0, 2, 3],
            outline: [0, 1, 1, 2, 2, 3, 3, 0],
        }
    }
}

/// Rubber-band selection. The rectangle only lives while the left button is
/// held; resolving it against the scene is left to `RegionSelected` listeners.
#[derive(Debug, Clone, Default)]
pub struct SelectTool {
    active: bool,
    region: Option<SelectionRegion>,
}

impl SelectTool {
    pub fn region(&self) -> Option<&SelectionRegion> {
        self.region.as_ref()
    }
}

impl Tool for SelectTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Select
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn start(&mut self, ctx: &mut ToolContext) {
        self.active = true;
        self.region = Some(SelectionRegion::new(ctx.pointer.press, ctx.pointer.position));
    }

    fn update(&mut self, _delta: Vec2, ctx: &mut ToolContext) {
        if !self.active {
            return;
        }
        if let Some(region) = self.region.as_mut() {
            region.current = ctx.pointer.position;
        }
    }

    fn end(&mut self, ctx: &mut ToolContext) -> bool {
        if !self.active {
            return true;
        }
        self.active = false;
        if let Some(region) = self.region.take() {
            let (min, max) = region.rect();
            tracing::debug!("Region selected {:?} - {:?}", min, max);
            ctx.events.push(ViewportEvent::RegionSelected { min, max });
        }
        true
    }

    fn abort(&mut self, ctx: &mut ToolContext) {
        self.active = false;
        self.region = None;
        ctx.host.release_pointer_lock();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::Rig;

    #[test]
    fn test_region_geometry_in_clip_space() {
        let region = SelectionRegion::new(Vec2::new(10.0, 10.0), Vec2::new(50.0, 30.0));
        let scale = Vec2::new(2.0 / 100.0, -2.0 / 100.0);
        let g = region.geometry(scale);

        let expected = [
            Vec2::new(-0.8, 0.8),
            Vec2::new(0.0, 0.8),
            Vec2::new(0.0, 0.4),
            Vec2::new(-0.8, 0.4),
        ];
        for (v, e) in g.vertices.iter().zip(expected) {
            assert!(v.abs_diff_eq(e, 1e-6), "{v:?} != {e:?}");
        }
        assert!(g.signed_area().abs() > 0.0);
        assert_eq!(g.fill.len(), 6);
        assert_eq!(g.outline, [0, 1, 1, 2, 2, 3, 3, 0]);
    }

    #[test]
    fn test_identity_scale_is_non_degenerate() {
        let region = SelectionRegion::new(Vec2::new(10.0, 10.0), Vec2::new(50.0, 30.0));
        let g = region.geometry(Vec2::ONE);
        assert_eq!(g.vertices[0], Vec2::new(9.0, 11.0));
        assert!((g.signed_area().abs() - 800.0).abs() < 1e-3);
        // Outline is closed: last segment returns to the first corner
        assert_eq!(g.outline[7], g.outline[0]);
    }

    #[test]
    fn test_end_publishes_normalized_rect() {
        let mut rig = Rig::new();
        let mut select = SelectTool::default();
        rig.pointer.press = Vec2::new(40.0, 30.0);
        rig.pointer.position = Vec2::new(40.0, 30.0);
        select.start(&mut rig.ctx());

        rig.pointer.position = Vec2::new(10.0, 60.0);
        select.update(Vec2::new(-30.0, 30.0), &mut rig.ctx());
        assert_eq!(select.region().unwrap().current, Vec2::new(10.0, 60.0));

        assert!(select.end(&mut rig.ctx()));
        assert!(select.region().is_none());
        assert_eq!(
            rig.events,
            vec![ViewportEvent::RegionSelected {
                min: Vec2::new(10.0, 30.0),
                max: Vec2::new(40.0, 60.0),
            }]
        );
    }

    #[test]
    fn test_abort_drops_region_silently() {
        let mut rig = Rig::new();
        let mut select = SelectTool::default();
        select.start(&mut rig.ctx());
        select.abort(&mut rig.ctx());
        assert!(select.region().is_none());
        assert!(rig.events.is_empty());
    }
}
