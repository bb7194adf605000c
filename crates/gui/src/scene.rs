//! In-memory scene: solids built from a [`SceneDescription`], the hovered
//! candidate, the active work-plane placement, and the hover sink.

use std::path::Path;

use glam::{EulerRot, Mat4, Quat, Vec3};
use shared::{ObjectId, SceneDescription, SolidDescription, Transform};

use crate::viewport::edge::{corner_vertices, extract_sharp_edges, MeshEdge, SHARP_EDGE_DEGREES};
use crate::viewport::hit_test::HoverResult;
use crate::viewport::mesh::MeshData;
use crate::viewport::picking::{pick_nearest, Aabb, Ray};

const SOLID_COLOR: [f32; 3] = [0.62, 0.66, 0.72];

/// Rigid placement of a solid or the working plane (local -> world)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub rotation: Quat,
    pub translation: Vec3,
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            rotation: Quat::IDENTITY,
            translation: Vec3::ZERO,
        }
    }
}

impl Placement {
    pub fn new(rotation: Quat, translation: Vec3) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    /// Euler XYZ rotation in degrees plus position; scale is baked into the mesh
    pub fn from_transform(transform: &Transform) -> Self {
        let [rx, ry, rz] = transform.rotation.map(|deg| (deg as f32).to_radians());
        let [x, y, z] = transform.position.map(|v| v as f32);
        Self {
            rotation: Quat::from_euler(EulerRot::XYZ, rx, ry, rz),
            translation: Vec3::new(x, y, z),
        }
    }

    pub fn inverse_rotation(&self) -> Quat {
        self.rotation.inverse()
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.translation)
    }

    pub fn transform_point(&self, local: Vec3) -> Vec3 {
        self.translation + self.rotation * local
    }
}

/// A pickable solid. Geometry is stored in the solid's local frame.
#[derive(Debug, Clone)]
pub struct Solid {
    pub id: ObjectId,
    pub name: String,
    pub mesh: MeshData,
    pub edges: Vec<MeshEdge>,
    pub vertices: Vec<Vec3>,
    pub placement: Placement,
    /// World-space bounds
    pub aabb: Aabb,
}

impl Solid {
    pub fn from_description(desc: &SolidDescription) -> Self {
        let [sx, sy, sz] = desc.transform.scale.map(|v| v as f32);
        let mesh = MeshData::from_primitive(&desc.primitive, Vec3::new(sx, sy, sz), SOLID_COLOR);
        Self::from_mesh(desc.id.clone(), desc.name.clone(), mesh, Placement::from_transform(&desc.transform))
    }

    pub fn from_mesh(id: ObjectId, name: String, mesh: MeshData, placement: Placement) -> Self {
        let edges = extract_sharp_edges(&mesh, SHARP_EDGE_DEGREES);
        let vertices = corner_vertices(&edges);
        let aabb = Aabb::from_points(mesh.positions().map(|p| placement.transform_point(p)));
        Self {
            id,
            name,
            mesh,
            edges,
            vertices,
            placement,
            aabb,
        }
    }

    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

/// What the hit test needs from the scene
pub trait SceneHost {
    /// Solid currently under the pointer, if any
    fn hovered_solid(&self) -> Option<&Solid>;
    /// Placement whose frame the fallback work planes live in
    fn placement(&self) -> Placement;
    /// Called when the fallback switches to a different work plane (world normal)
    fn set_axis_normal(&mut self, normal: Vec3);
    /// Hover sink, called once per resolved pick
    fn hover(&mut self, hover: &HoverResult);
    /// Pointer ray of the upcoming pick, for scenes that track the candidate themselves
    fn track_pointer(&mut self, _ray: &Ray) {}
}

#[derive(Debug, Clone, Default)]
pub struct SceneState {
    solids: Vec<Solid>,
    work_plane: Placement,
    hovered: Option<usize>,
    axis_normal: Option<Vec3>,
    last_hover: Option<HoverResult>,
}

impl SceneState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_description(desc: &SceneDescription) -> Self {
        Self {
            solids: desc.solids.iter().map(Solid::from_description).collect(),
            work_plane: Placement::from_transform(&desc.work_plane),
            ..Self::default()
        }
    }

    /// Load a scene JSON file
    pub fn load(path: &Path) -> Result<Self, String> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        let desc: SceneDescription = serde_json::from_str(&json)
            .map_err(|e| format!("Failed to parse {}: {}", path.display(), e))?;
        tracing::info!("Loaded scene {} ({} solids)", path.display(), desc.solids.len());
        Ok(Self::from_description(&desc))
    }

    pub fn add_solid(&mut self, solid: Solid) {
        self.solids.push(solid);
    }

    pub fn solids(&self) -> &[Solid] {
        &self.solids
    }

    pub fn solid(&self, id: &str) -> Option<&Solid> {
        self.solids.iter().find(|s| s.id == id)
    }

    pub fn set_work_plane(&mut self, placement: Placement) {
        self.work_plane = placement;
    }

    /// Choose the hovered candidate as the nearest solid bounds along `ray`.
    /// Returns true when the candidate changed.
    pub fn update_candidate(&mut self, ray: &Ray) -> bool {
        let hovered = pick_nearest(ray, self.solids.iter().map(|s| (&s.id, &s.aabb)))
            .and_then(|id| self.solids.iter().position(|s| &s.id == id));
        if hovered == self.hovered {
            return false;
        }
        self.hovered = hovered;
        true
    }

    pub fn hovered_id(&self) -> Option<&str> {
        self.hovered.map(|i| self.solids[i].id.as_str())
    }

    /// Last work-plane normal reported by the hit test
    pub fn axis_normal(&self) -> Option<Vec3> {
        self.axis_normal
    }

    pub fn last_hover(&self) -> Option<&HoverResult> {
        self.last_hover.as_ref()
    }
}

impl SceneHost for SceneState {
    fn hovered_solid(&self) -> Option<&Solid> {
        self.hovered.and_then(|i| self.solids.get(i))
    }

    fn placement(&self) -> Placement {
        self.work_plane
    }

    fn set_axis_normal(&mut self, normal: Vec3) {
        self.axis_normal = Some(normal);
    }

    fn hover(&mut self, hover: &HoverResult) {
        self.last_hover = Some(hover.clone());
    }

    fn track_pointer(&mut self, ray: &Ray) {
        if self.update_candidate(ray) {
            tracing::debug!("Hover candidate: {:?}", self.hovered_id());
        }
    }
}
