//! Background fallback for the hit test: with nothing under the pointer the
//! hover point is the intersection with one of six axis-aligned work planes
//! of the active placement, the one facing the viewer most directly.

use glam::Vec3;

use crate::scene::Placement;

/// Candidate plane normals in selection order
pub const AXIS_PLANES: [Vec3; 6] = [
    Vec3::X,
    Vec3::Y,
    Vec3::Z,
    Vec3::NEG_X,
    Vec3::NEG_Y,
    Vec3::NEG_Z,
];

/// Below this |dot| the ray runs parallel to the plane
pub const DEGENERATE_EPS: f32 = 1e-6;

/// Index into [`AXIS_PLANES`] with the smallest dot product against
/// `local_normal`, and that dot. Ties keep the earlier candidate.
// TODO: revisit the first-wins tie-break for views exactly between two planes (it favours +X over +Y over +Z)
pub fn select_axis_plane(local_normal: Vec3) -> (usize, f32) {
    let mut best = (0, AXIS_PLANES[0].dot(local_normal));
    for (i, axis) in AXIS_PLANES.iter().enumerate().skip(1) {
        let dot = axis.dot(local_normal);
        if dot < best.1 {
            best = (i, dot);
        }
    }
    best
}

/// Result of one fallback resolution
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneResolution {
    /// Intersection point, or the last good one for a degenerate view
    pub point: Option<Vec3>,
    /// World-space normal of the chosen plane
    pub normal: Vec3,
    /// Set when the chosen plane differs from the previous resolution
    pub axis_change: Option<Vec3>,
}

/// Remembers the chosen axis and the last valid point between frames
#[derive(Debug, Clone, Default)]
pub struct WorkPlaneResolver {
    axis: Option<usize>,
    last_point: Option<Vec3>,
}

impl WorkPlaneResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the plane chosen by the last non-degenerate resolution
    pub fn current_axis(&self) -> Option<usize> {
        self.axis
    }

    pub fn last_point(&self) -> Option<Vec3> {
        self.last_point
    }

    /// Intersect the pointer ray (`eye` + t·`view_normal`) with the work plane
    /// of `placement` facing the viewer.
    pub fn resolve(&mut self, placement: &Placement, eye: Vec3, view_normal: Vec3) -> PlaneResolution {
        let local = placement.inverse_rotation() * view_normal;
        let (index, dot) = select_axis_plane(local);

        if !dot.is_finite() || dot.abs() < DEGENERATE_EPS {
            tracing::debug!("Degenerate view normal {:?}, holding last hover point", view_normal);
            let normal = self
                .axis
                .map_or(Vec3::ZERO, |i| placement.rotation * AXIS_PLANES[i]);
            return PlaneResolution {
                point: self.last_point,
                normal,
                axis_change: None,
            };
        }

        let normal = placement.rotation * AXIS_PLANES[index];
        let axis_change = if self.axis != Some(index) {
            tracing::debug!("Work plane switched to axis {} ({:?})", index, normal);
            self.axis = Some(index);
            Some(normal)
        } else {
            None
        };

        // Plane passes through the placement translation
        let offset = (eye - placement.translation).dot(normal);
        let t = -offset / dot;
        let point = eye + view_normal * t;
        self.last_point = Some(point);

        PlaneResolution {
            point: Some(point),
            normal,
            axis_change,
        }
    }
}
