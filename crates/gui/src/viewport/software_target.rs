//! CPU reference implementation of [`PickBackend`].
//!
//! Draws are recorded with the state they were issued under and resolved
//! lazily when a pixel is read back, so a pick costs one pass over the
//! hovered solid's geometry instead of a full-viewport rasterization.
//! Depth is the distance along the pixel ray from the near plane.

use glam::{Mat4, Vec2, Vec3, Vec4};

use super::hit_test::{DrawState, PickBackend, PickLayer, PickTag};
use super::picking::{ray_segment_closest, ray_triangle_intersect, Ray};
use crate::error::PickError;
use crate::scene::Solid;

/// Relative depth bias applied to faces drawn with polygon offset
const FACE_DEPTH_BIAS: f32 = 0.01;

#[derive(Debug, Clone)]
enum Geometry {
    Triangles(Vec<[Vec3; 3]>),
    Segments(Vec<(Vec3, Vec3)>),
    Points(Vec<Vec3>),
}

#[derive(Debug, Clone)]
struct DrawCall {
    state: DrawState,
    frustum: Mat4,
    geometry: Geometry,
}

/// A fragment candidate for one pixel
struct Fragment {
    depth: f32,
    color: [f32; 4],
}

#[derive(Debug, Clone)]
pub struct SoftwarePickTarget {
    width: u32,
    height: u32,
    bound: bool,
    state: DrawState,
    calls: Vec<DrawCall>,
    layers: Vec<PickLayer>,
    allocations: usize,
    fail_next_draw: Option<PickError>,
}

impl Default for SoftwarePickTarget {
    fn default() -> Self {
        Self::new()
    }
}

impl SoftwarePickTarget {
    pub fn new() -> Self {
        Self {
            width: 0,
            height: 0,
            bound: false,
            state: DrawState::default(),
            calls: Vec::new(),
            layers: Vec::new(),
            allocations: 0,
            fail_next_draw: None,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn is_bound(&self) -> bool {
        self.bound
    }

    /// Current draw state (default whenever no pick is in flight)
    pub fn state(&self) -> DrawState {
        self.state
    }

    /// How many times the target storage was (re)created
    pub fn allocations(&self) -> usize {
        self.allocations
    }

    /// Layers drawn since the last bind, in order
    pub fn drawn_layers(&self) -> &[PickLayer] {
        &self.layers
    }

    /// Make the next `draw` fail with `error`
    pub fn fail_next_draw(&mut self, error: PickError) {
        self.fail_next_draw = Some(error);
    }

    /// Ray through the center of pixel (x, y), bottom-left origin
    fn pixel_ray(&self, frustum: &Mat4, x: u32, y: u32) -> Ray {
        let ndc = Vec2::new(
            (x as f32 + 0.5) / self.width as f32 * 2.0 - 1.0,
            (y as f32 + 0.5) / self.height as f32 * 2.0 - 1.0,
        );
        let inv = frustum.inverse();
        let near = inv * Vec4::new(ndc.x, ndc.y, -1.0, 1.0);
        let far = inv * Vec4::new(ndc.x, ndc.y, 1.0, 1.0);
        let near = near.truncate() / near.w;
        let far = far.truncate() / far.w;
        Ray {
            origin: near,
            direction: (far - near).normalize_or_zero(),
        }
    }

    /// Project a world point to target pixels (bottom-left origin)
    fn to_pixels(&self, frustum: &Mat4, p: Vec3) -> Option<Vec2> {
        let clip = *frustum * p.extend(1.0);
        if clip.w <= 0.0 {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        Some(Vec2::new(
            (ndc.x + 1.0) * 0.5 * self.width as f32,
            (ndc.y + 1.0) * 0.5 * self.height as f32,
        ))
    }

    /// Nearest fragment a single draw call produces at pixel (x, y)
    fn rasterize(&self, call: &DrawCall, x: u32, y: u32) -> Option<Fragment> {
        let ray = self.pixel_ray(&call.frustum, x, y);
        let center = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
        let mut best: Option<Fragment> = None;
        let mut offer = |depth: f32, point: Vec3, tag: PickTag| {
            if best.as_ref().is_none_or(|f| depth < f.depth) {
                best = Some(Fragment {
                    depth,
                    color: [point.x, point.y, point.z, tag.encode()],
                });
            }
        };

        match &call.geometry {
            Geometry::Triangles(tris) => {
                for [a, b, c] in tris {
                    if let Some(t) = ray_triangle_intersect(&ray, *a, *b, *c) {
                        let depth = if call.state.polygon_offset {
                            t * (1.0 + FACE_DEPTH_BIAS)
                        } else {
                            t
                        };
                        offer(depth, ray.at(t), PickTag::Face);
                    }
                }
            }
            Geometry::Segments(segments) => {
                let half = call.state.line_width * 0.5;
                for (i, (start, end)) in segments.iter().enumerate() {
                    let (Some(s0), Some(s1)) = (
                        self.to_pixels(&call.frustum, *start),
                        self.to_pixels(&call.frustum, *end),
                    ) else {
                        continue;
                    };
                    if point_to_segment_2d(center, s0, s1) > half {
                        continue;
                    }
                    let (t, point) = ray_segment_closest(&ray, *start, *end);
                    offer(t, point, PickTag::Edge(i));
                }
            }
            Geometry::Points(points) => {
                let half = call.state.point_size * 0.5;
                for (i, p) in points.iter().enumerate() {
                    let Some(s) = self.to_pixels(&call.frustum, *p) else {
                        continue;
                    };
                    let d = (s - center).abs();
                    if d.x > half || d.y > half {
                        continue;
                    }
                    offer((*p - ray.origin).dot(ray.direction), *p, PickTag::Vertex(i));
                }
            }
        }

        best
    }
}

impl PickBackend for SoftwarePickTarget {
    fn bind_target(&mut self, width: u32, height: u32) -> Result<(), PickError> {
        if width == 0 || height == 0 {
            return Err(PickError::TargetUnavailable(format!(
                "zero-sized target {}x{}",
                width, height
            )));
        }
        if (width, height) != (self.width, self.height) {
            self.width = width;
            self.height = height;
            self.allocations += 1;
        }
        self.bound = true;
        self.calls.clear();
        self.layers.clear();
        Ok(())
    }

    fn set_draw_state(&mut self, state: &DrawState) {
        self.state = *state;
    }

    fn draw(&mut self, layer: PickLayer, solid: &Solid, frustum: &Mat4) -> Result<(), PickError> {
        if !self.bound {
            return Err(PickError::TargetUnavailable("no target bound".into()));
        }
        if let Some(error) = self.fail_next_draw.take() {
            return Err(error);
        }

        let place = |p: Vec3| solid.placement.transform_point(p);
        let geometry = match layer {
            PickLayer::Faces => Geometry::Triangles(
                solid.mesh.triangles().map(|tri| tri.map(place)).collect(),
            ),
            PickLayer::Edges => Geometry::Segments(
                solid
                    .edges
                    .iter()
                    .map(|e| (place(e.start), place(e.end)))
                    .collect(),
            ),
            PickLayer::Points => Geometry::Points(solid.vertices.iter().copied().map(place).collect()),
        };

        self.calls.push(DrawCall {
            state: self.state,
            frustum: *frustum,
            geometry,
        });
        self.layers.push(layer);
        Ok(())
    }

    fn read_pixel(&mut self, x: u32, y: u32) -> Result<[f32; 4], PickError> {
        if !self.bound {
            return Err(PickError::TargetUnavailable("no target bound".into()));
        }
        if x >= self.width || y >= self.height {
            return Err(PickError::PointerOutside {
                x: x as f32,
                y: y as f32,
                width: self.width,
                height: self.height,
            });
        }

        let mut color = [0.0; 4];
        let mut depth = f32::INFINITY;
        for call in &self.calls {
            let Some(fragment) = self.rasterize(call, x, y) else {
                continue;
            };
            if call.state.depth_test && fragment.depth >= depth {
                continue;
            }
            if call.state.depth_write {
                depth = fragment.depth;
            }
            color = fragment.color;
        }
        Ok(color)
    }

    fn release(&mut self) {
        self.bound = false;
        self.state = DrawState::default();
    }
}

/// Calculate distance from a 2D point to a 2D line segment
fn point_to_segment_2d(point: Vec2, p0: Vec2, p1: Vec2) -> f32 {
    let d = p1 - p0;
    let len_sq = d.length_squared();
    if len_sq < 1e-8 {
        return point.distance(p0);
    }
    let t = ((point - p0).dot(d) / len_sq).clamp(0.0, 1.0);
    point.distance(p0 + d * t)
}
