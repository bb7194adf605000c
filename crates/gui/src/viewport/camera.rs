use std::cell::OnceCell;

use glam::{Mat4, Quat, Vec2, Vec3, Vec4};

use super::picking::Ray;

const NEAR: f32 = 0.1;
const FAR: f32 = 200.0;
/// Far plane of the pick frustum, so geometry past the display far plane still resolves
const PICK_FAR: f32 = 10_000.0;
const PITCH_LIMIT: f32 = 1.5;
const MIN_DISTANCE: f32 = 0.5;
const MAX_DISTANCE: f32 = 100.0;

/// Matrices derived from the camera state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraMatrices {
    /// World -> camera
    pub view: Mat4,
    /// Camera -> clip
    pub projection: Mat4,
    pub view_projection: Mat4,
    /// View-projection used by the pick draw
    pub frustum: Mat4,
}

/// Arc-ball camera for the 3D viewport.
///
/// Matrices are computed on first use and cached until the next mutation.
/// All mutating methods return `true` when the state changed (and the cache
/// was dropped), `false` when the call was a no-op.
#[derive(Debug, Clone)]
pub struct ViewCamera {
    /// Horizontal rotation angle (radians)
    yaw: f32,
    /// Vertical rotation angle (radians)
    pitch: f32,
    /// Distance from target
    distance: f32,
    /// Camera target point
    target: Vec3,
    /// Vertical field of view (radians)
    fov: f32,
    /// Viewport size in pixels
    resolution: Vec2,
    matrices: OnceCell<CameraMatrices>,
}

impl Default for ViewCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewCamera {
    pub fn new() -> Self {
        Self {
            yaw: 0.6,
            pitch: 0.4,
            distance: 6.0,
            target: Vec3::ZERO,
            fov: 45.0_f32.to_radians(),
            resolution: Vec2::new(800.0, 600.0),
            matrices: OnceCell::new(),
        }
    }

    /// Camera with explicit angles, used by scripted scenes and tests
    pub fn looking_at(target: Vec3, yaw: f32, pitch: f32, distance: f32) -> Self {
        Self {
            yaw,
            pitch: pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT),
            distance,
            target,
            ..Self::new()
        }
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn fov(&self) -> f32 {
        self.fov
    }

    pub fn resolution(&self) -> Vec2 {
        self.resolution
    }

    pub fn aspect(&self) -> f32 {
        self.resolution.x / self.resolution.y
    }

    pub fn set_resolution(&mut self, resolution: Vec2) -> bool {
        let resolution = resolution.max(Vec2::ONE);
        if resolution == self.resolution {
            return false;
        }
        self.resolution = resolution;
        self.invalidate();
        true
    }

    pub fn set_target(&mut self, target: Vec3) -> bool {
        if target == self.target {
            return false;
        }
        self.target = target;
        self.invalidate();
        true
    }

    /// Orientation of the camera frame (camera -> world)
    pub fn rotation(&self) -> Quat {
        orientation(self.yaw, self.pitch)
    }

    /// Camera position in world space
    pub fn eye_position(&self) -> Vec3 {
        self.target + self.rotation() * Vec3::Z * self.distance
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation() * Vec3::NEG_Z
    }

    pub fn right(&self) -> Vec3 {
        self.rotation() * Vec3::X
    }

    pub fn up(&self) -> Vec3 {
        self.rotation() * Vec3::Y
    }

    /// Revolve around `origin` by a delta normalized to the viewport size.
    /// Target and eye turn together, so the distance to `origin` is kept.
    pub fn orbit(&mut self, delta: Vec2, speed: f32, origin: Vec3) -> bool {
        if delta == Vec2::ZERO {
            return false;
        }
        let yaw = self.yaw - delta.x * speed;
        let pitch = (self.pitch + delta.y * speed).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        if yaw == self.yaw && pitch == self.pitch {
            return false;
        }

        let turn = orientation(yaw, pitch) * self.rotation().inverse();
        self.target = origin + turn * (self.target - origin);
        self.yaw = yaw;
        self.pitch = pitch;
        self.invalidate();
        true
    }

    /// Translate the view so the plane through `origin` follows the pointer.
    /// `delta.x`/`delta.y` are normalized pointer deltas, `delta.z` a scroll
    /// amount moving along the forward axis.
    pub fn pan(&mut self, delta: Vec3, speed: f32, origin: Vec3) -> bool {
        if delta == Vec3::ZERO {
            return false;
        }
        let depth = (origin - self.eye_position())
            .dot(self.forward())
            .max(NEAR);
        let view_height = 2.0 * depth * (self.fov * 0.5).tan();
        let view_width = view_height * self.aspect();

        let offset = -self.right() * delta.x * view_width
            + self.up() * delta.y * view_height
            + self.forward() * delta.z * depth * speed;
        self.target += offset;
        self.invalidate();
        true
    }

    /// Scale the orbit distance; positive amounts move closer
    pub fn zoom(&mut self, amount: f32) -> bool {
        let distance = (self.distance * (1.0 - amount)).clamp(MIN_DISTANCE, MAX_DISTANCE);
        if distance == self.distance {
            return false;
        }
        self.distance = distance;
        self.invalidate();
        true
    }

    pub fn matrices(&self) -> &CameraMatrices {
        self.matrices.get_or_init(|| {
            let view = Mat4::look_at_rh(self.eye_position(), self.target, Vec3::Y);
            let projection = Mat4::perspective_rh_gl(self.fov, self.aspect(), NEAR, FAR);
            let pick_projection = Mat4::perspective_rh_gl(self.fov, self.aspect(), NEAR, PICK_FAR);
            CameraMatrices {
                view,
                projection,
                view_projection: projection * view,
                frustum: pick_projection * view,
            }
        })
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.matrices().view
    }

    pub fn view_projection(&self) -> Mat4 {
        self.matrices().view_projection
    }

    pub fn frustum(&self) -> Mat4 {
        self.matrices().frustum
    }

    /// Scale from viewport pixels to clip units (y flipped)
    pub fn pixel_to_clip_scale(&self) -> Vec2 {
        Vec2::new(2.0 / self.resolution.x, -2.0 / self.resolution.y)
    }

    /// Project a world point to viewport pixels
    pub fn project(&self, point: Vec3) -> Option<Vec2> {
        let p = self.view_projection() * point.extend(1.0);
        if p.w <= 0.0 {
            return None;
        }
        let ndc = p.truncate() / p.w;
        Some(Vec2::new(
            (ndc.x + 1.0) * 0.5 * self.resolution.x,
            (1.0 - ndc.y) * 0.5 * self.resolution.y,
        ))
    }

    /// Cast a ray from a viewport pixel position into the scene
    pub fn pointer_ray(&self, pixel: Vec2) -> Ray {
        let ndc_x = pixel.x / self.resolution.x * 2.0 - 1.0;
        let ndc_y = 1.0 - pixel.y / self.resolution.y * 2.0;

        let vp_inv = self.view_projection().inverse();
        let near_world = vp_inv * Vec4::new(ndc_x, ndc_y, -1.0, 1.0);
        let far_world = vp_inv * Vec4::new(ndc_x, ndc_y, 1.0, 1.0);

        let near = near_world.truncate() / near_world.w;
        let far = far_world.truncate() / far_world.w;

        Ray {
            origin: self.eye_position(),
            direction: (far - near).normalize_or_zero(),
        }
    }

    fn invalidate(&mut self) {
        self.matrices = OnceCell::new();
    }
}

fn orientation(yaw: f32, pitch: f32) -> Quat {
    Quat::from_rotation_y(yaw) * Quat::from_rotation_x(-pitch)
}
