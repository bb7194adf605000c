//! Per-pixel hit test.
//!
//! The hovered solid is drawn into a float render target whose color is the
//! world-space position of each fragment. Faces go first, then the feature
//! edges at a fixed width, then the corner vertices, so the topmost element
//! wins. The single pixel under the pointer is read back: RGB is the world
//! point and A tags which element produced it (see [`PickTag`]).
//!
//! With no hovered solid, or when the pixel under the pointer stays empty,
//! the hover point falls back to a work-plane intersection.

use glam::{Mat4, Vec2, Vec3};
use shared::ObjectId;

use crate::error::PickError;
use crate::scene::{SceneHost, Solid};
use crate::state::settings::PickSettings;
use crate::viewport::camera::ViewCamera;
use crate::viewport::work_plane::WorkPlaneResolver;

/// Where the pointer currently points
#[derive(Debug, Clone, PartialEq)]
pub struct HoverResult {
    /// World-space point
    pub point: Vec3,
    /// Hit solid; `None` for a background (work-plane) hit
    pub solid: Option<ObjectId>,
    pub edge: Option<usize>,
    pub vertex: Option<usize>,
    /// Work-plane normal of a background hit
    pub normal: Option<Vec3>,
}

impl HoverResult {
    pub fn background(point: Vec3, normal: Vec3) -> Self {
        Self {
            point,
            solid: None,
            edge: None,
            vertex: None,
            normal: Some(normal),
        }
    }

    pub fn on_solid(point: Vec3, solid: ObjectId, tag: PickTag) -> Self {
        let (edge, vertex) = match tag {
            PickTag::Edge(i) => (Some(i), None),
            PickTag::Vertex(i) => (None, Some(i)),
            PickTag::Face | PickTag::Miss => (None, None),
        };
        Self {
            point,
            solid: Some(solid),
            edge,
            vertex,
            normal: None,
        }
    }

    pub fn is_background(&self) -> bool {
        self.solid.is_none()
    }
}

/// Element encoded in the alpha channel of a pick pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickTag {
    /// Cleared pixel
    Miss,
    Face,
    Edge(usize),
    Vertex(usize),
}

impl PickTag {
    /// 0 = miss, 1 = face, 2 + i = vertex i, -(1 + i) = edge i
    pub fn encode(self) -> f32 {
        match self {
            PickTag::Miss => 0.0,
            PickTag::Face => 1.0,
            PickTag::Vertex(i) => 2.0 + i as f32,
            PickTag::Edge(i) => -(1.0 + i as f32),
        }
    }

    pub fn decode(alpha: f32) -> Self {
        let a = alpha.round();
        if !a.is_finite() || a == 0.0 {
            PickTag::Miss
        } else if a == 1.0 {
            PickTag::Face
        } else if a >= 2.0 {
            PickTag::Vertex((a - 2.0) as usize)
        } else {
            PickTag::Edge((-a - 1.0) as usize)
        }
    }
}

/// Fixed-function state toggled between pick layers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawState {
    pub depth_test: bool,
    pub depth_write: bool,
    pub blend: bool,
    pub line_width: f32,
    pub point_size: f32,
    /// Push faces back so coplanar edges and vertices win the depth test
    pub polygon_offset: bool,
}

impl Default for DrawState {
    /// Backend default state, restored after every pick
    fn default() -> Self {
        Self {
            depth_test: false,
            depth_write: true,
            blend: false,
            line_width: 1.0,
            point_size: 1.0,
            polygon_offset: false,
        }
    }
}

impl DrawState {
    pub fn faces() -> Self {
        Self {
            depth_test: true,
            polygon_offset: true,
            ..Self::default()
        }
    }

    /// Edges test against faces but leave depth alone so vertices still land on top
    pub fn edges(width: f32) -> Self {
        Self {
            depth_test: true,
            depth_write: false,
            line_width: width,
            ..Self::default()
        }
    }

    pub fn points(size: f32) -> Self {
        Self {
            depth_test: true,
            point_size: size,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickLayer {
    Faces,
    Edges,
    Points,
}

/// Graphics backend of the pick pass: one float RGBA target, three draw
/// layers, single-pixel readback.
pub trait PickBackend {
    /// Bind the target, creating or resizing it on demand, and clear it to zero
    fn bind_target(&mut self, width: u32, height: u32) -> Result<(), PickError>;
    fn set_draw_state(&mut self, state: &DrawState);
    /// Draw one layer of `solid` (local geometry, `solid.placement` applies)
    fn draw(&mut self, layer: PickLayer, solid: &Solid, frustum: &Mat4) -> Result<(), PickError>;
    /// Read one pixel, origin at the bottom-left corner
    fn read_pixel(&mut self, x: u32, y: u32) -> Result<[f32; 4], PickError>;
    /// Unbind the target and restore the default draw state
    fn release(&mut self);
}

/// Result of one hit test
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HoverOutcome {
    /// `None` only before any point could be resolved (degenerate first view)
    pub hover: Option<HoverResult>,
    /// New world normal when the fallback switched work planes
    pub axis_change: Option<Vec3>,
}

/// Pointer (top-left origin) to the readback pixel (bottom-left origin)
pub fn readback_pixel(pointer: Vec2, width: u32, height: u32) -> Result<(u32, u32), PickError> {
    let outside = PickError::PointerOutside {
        x: pointer.x,
        y: pointer.y,
        width,
        height,
    };
    if !pointer.is_finite() || pointer.x < 0.0 || pointer.y < 0.0 {
        return Err(outside);
    }
    let (x, y) = (pointer.x.floor() as u32, pointer.y.floor() as u32);
    if x >= width || y >= height {
        return Err(outside);
    }
    Ok((x, height - 1 - y))
}

pub struct HitTestPipeline {
    resolver: WorkPlaneResolver,
    edge_width: f32,
    point_size: f32,
    last: Option<HoverResult>,
}

impl HitTestPipeline {
    pub fn new(settings: &PickSettings) -> Self {
        Self {
            resolver: WorkPlaneResolver::new(),
            edge_width: settings.edge_width,
            point_size: settings.point_size,
            last: None,
        }
    }

    pub fn apply_settings(&mut self, settings: &PickSettings) {
        self.edge_width = settings.edge_width;
        self.point_size = settings.point_size;
    }

    pub fn last_hover(&self) -> Option<&HoverResult> {
        self.last.as_ref()
    }

    pub fn current_axis(&self) -> Option<usize> {
        self.resolver.current_axis()
    }

    /// Resolve the hover point under `pointer` (viewport pixels, top-left origin)
    pub fn hit_test<B, S>(
        &mut self,
        backend: &mut B,
        camera: &ViewCamera,
        pointer: Vec2,
        scene: &S,
    ) -> Result<HoverOutcome, PickError>
    where
        B: PickBackend + ?Sized,
        S: SceneHost + ?Sized,
    {
        let size = camera.resolution();
        let (width, height) = (size.x as u32, size.y as u32);
        let (px, py) = readback_pixel(pointer, width, height)?;

        if let Some(solid) = scene.hovered_solid() {
            backend.bind_target(width, height)?;
            let pixel = self.draw_solid(backend, solid, &camera.frustum(), px, py);
            backend.release();
            let [r, g, b, a] = pixel?;

            let tag = PickTag::decode(a);
            if tag != PickTag::Miss {
                let point = Vec3::new(r, g, b);
                if !point.is_finite() {
                    return Err(PickError::NonFiniteReadback);
                }
                let hover = HoverResult::on_solid(point, solid.id.clone(), tag);
                self.last = Some(hover.clone());
                return Ok(HoverOutcome {
                    hover: Some(hover),
                    axis_change: None,
                });
            }
        }

        // Sample through the pixel center, matching the pixel that was read back
        let center = Vec2::new(pointer.x.floor() + 0.5, pointer.y.floor() + 0.5);
        let ray = camera.pointer_ray(center);
        let plane = self
            .resolver
            .resolve(&scene.placement(), ray.origin, ray.direction);
        let hover = plane
            .point
            .map(|point| HoverResult::background(point, plane.normal));
        self.last = hover.clone();

        Ok(HoverOutcome {
            hover,
            axis_change: plane.axis_change,
        })
    }

    fn draw_solid<B: PickBackend + ?Sized>(
        &self,
        backend: &mut B,
        solid: &Solid,
        frustum: &Mat4,
        x: u32,
        y: u32,
    ) -> Result<[f32; 4], PickError> {
        backend.set_draw_state(&DrawState::faces());
        backend.draw(PickLayer::Faces, solid, frustum)?;

        if !solid.edges.is_empty() {
            backend.set_draw_state(&DrawState::edges(self.edge_width));
            backend.draw(PickLayer::Edges, solid, frustum)?;
        }

        if !solid.vertices.is_empty() {
            backend.set_draw_state(&DrawState::points(self.point_size));
            backend.draw(PickLayer::Points, solid, frustum)?;
        }

        backend.read_pixel(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_tag_encoding() {
        for tag in [
            PickTag::Miss,
            PickTag::Face,
            PickTag::Edge(0),
            PickTag::Edge(11),
            PickTag::Vertex(0),
            PickTag::Vertex(7),
        ] {
            assert_eq!(PickTag::decode(tag.encode()), tag);
        }
        assert_eq!(PickTag::decode(f32::NAN), PickTag::Miss);
    }

    #[test]
    fn test_readback_pixel_flips_rows() {
        assert_eq!(readback_pixel(Vec2::new(0.0, 0.0), 100, 50), Ok((0, 49)));
        assert_eq!(readback_pixel(Vec2::new(99.9, 49.9), 100, 50), Ok((99, 0)));
        assert!(matches!(
            readback_pixel(Vec2::new(100.0, 10.0), 100, 50),
            Err(PickError::PointerOutside { .. })
        ));
        assert!(readback_pixel(Vec2::new(-0.5, 10.0), 100, 50).is_err());
    }

    #[test]
    fn test_layer_draw_states() {
        let faces = DrawState::faces();
        assert!(faces.depth_test && faces.depth_write && faces.polygon_offset);
        assert_eq!(DrawState::edges(4.0).line_width, 4.0);
        assert!(!DrawState::edges(4.0).polygon_offset);
        assert!(!DrawState::edges(4.0).depth_write);
        assert_eq!(DrawState::points(8.0).point_size, 8.0);
    }
}
