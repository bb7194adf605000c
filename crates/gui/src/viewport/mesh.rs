use std::f32::consts::{PI, TAU};

use glam::Vec3;
use shared::Primitive;

/// Floats per mesh vertex: position(3) + normal(3) + color(3)
pub const MESH_STRIDE: usize = 9;
/// Floats per line vertex: position(3) + color(4)
pub const LINE_STRIDE: usize = 7;

const SEGMENTS: u32 = 32;

/// CPU-side mesh data: interleaved [pos.x, pos.y, pos.z, norm.x, norm.y, norm.z, r, g, b]
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / MESH_STRIDE
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn position(&self, index: usize) -> Vec3 {
        let base = index * MESH_STRIDE;
        Vec3::from_slice(&self.vertices[base..base + 3])
    }

    pub fn normal(&self, index: usize) -> Vec3 {
        let base = index * MESH_STRIDE + 3;
        Vec3::from_slice(&self.vertices[base..base + 3])
    }

    pub fn positions(&self) -> impl Iterator<Item = Vec3> + '_ {
        (0..self.vertex_count()).map(|i| self.position(i))
    }

    /// Triangle corner positions in index order
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices
            .chunks_exact(3)
            .map(|tri| [tri[0], tri[1], tri[2]].map(|i| self.position(i as usize)))
    }

    /// Build the mesh for a primitive, scaled per axis
    pub fn from_primitive(primitive: &Primitive, scale: Vec3, color: [f32; 3]) -> Self {
        let mut mesh = match *primitive {
            Primitive::Cube {
                width,
                height,
                depth,
            } => cube(width as f32, height as f32, depth as f32, color),
            Primitive::Cylinder { radius, height } => {
                cylinder(radius as f32, height as f32, SEGMENTS, color)
            }
            Primitive::Sphere { radius } => sphere(radius as f32, SEGMENTS / 2, SEGMENTS, color),
            Primitive::Cone { radius, height } => cone(radius as f32, height as f32, SEGMENTS, color),
        };
        if scale != Vec3::ONE {
            mesh.scale(scale);
        }
        mesh
    }

    fn scale(&mut self, scale: Vec3) {
        let inv = scale.recip();
        for v in self.vertices.chunks_exact_mut(MESH_STRIDE) {
            let p = Vec3::from_slice(&v[0..3]) * scale;
            let n = (Vec3::from_slice(&v[3..6]) * inv).normalize_or_zero();
            v[0..3].copy_from_slice(&p.to_array());
            v[3..6].copy_from_slice(&n.to_array());
        }
    }
}

/// Lines mesh: interleaved [pos.x, pos.y, pos.z, r, g, b, a]
#[derive(Debug, Clone, Default)]
pub struct LineMeshData {
    pub vertices: Vec<f32>,
}

impl LineMeshData {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / LINE_STRIDE
    }

    pub fn push_segment(&mut self, a: Vec3, b: Vec3, color: [f32; 4]) {
        push_line_vert(&mut self.vertices, a, color);
        push_line_vert(&mut self.vertices, b, color);
    }
}

// ── Primitive generation ─────────────────────────────────────

pub fn cube(w: f32, h: f32, d: f32, color: [f32; 3]) -> MeshData {
    let hw = w * 0.5;
    let hh = h * 0.5;
    let hd = d * 0.5;

    let faces: [([Vec3; 4], Vec3); 6] = [
        // Front (+Z)
        ([Vec3::new(-hw, -hh, hd), Vec3::new(hw, -hh, hd), Vec3::new(hw, hh, hd), Vec3::new(-hw, hh, hd)], Vec3::Z),
        // Back (-Z)
        ([Vec3::new(hw, -hh, -hd), Vec3::new(-hw, -hh, -hd), Vec3::new(-hw, hh, -hd), Vec3::new(hw, hh, -hd)], Vec3::NEG_Z),
        // Right (+X)
        ([Vec3::new(hw, -hh, hd), Vec3::new(hw, -hh, -hd), Vec3::new(hw, hh, -hd), Vec3::new(hw, hh, hd)], Vec3::X),
        // Left (-X)
        ([Vec3::new(-hw, -hh, -hd), Vec3::new(-hw, -hh, hd), Vec3::new(-hw, hh, hd), Vec3::new(-hw, hh, -hd)], Vec3::NEG_X),
        // Top (+Y)
        ([Vec3::new(-hw, hh, hd), Vec3::new(hw, hh, hd), Vec3::new(hw, hh, -hd), Vec3::new(-hw, hh, -hd)], Vec3::Y),
        // Bottom (-Y)
        ([Vec3::new(-hw, -hh, -hd), Vec3::new(hw, -hh, -hd), Vec3::new(hw, -hh, hd), Vec3::new(-hw, -hh, hd)], Vec3::NEG_Y),
    ];

    let mut mesh = MeshData {
        vertices: Vec::with_capacity(24 * MESH_STRIDE),
        indices: Vec::with_capacity(36),
    };
    for (quad, normal) in &faces {
        let base = mesh.vertex_count() as u32;
        for v in quad {
            push_vert(&mut mesh.vertices, *v, *normal, color);
        }
        mesh.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    mesh
}

pub fn cylinder(radius: f32, height: f32, segments: u32, color: [f32; 3]) -> MeshData {
    let hh = height * 0.5;
    let mut mesh = MeshData::default();

    for i in 0..segments {
        let (s0, c0) = segment_angle(i, segments).sin_cos();
        let (s1, c1) = segment_angle(i + 1, segments).sin_cos();
        let n0 = Vec3::new(c0, 0.0, s0);
        let n1 = Vec3::new(c1, 0.0, s1);

        let base = mesh.vertex_count() as u32;
        push_vert(&mut mesh.vertices, Vec3::new(radius * c0, -hh, radius * s0), n0, color);
        push_vert(&mut mesh.vertices, Vec3::new(radius * c1, -hh, radius * s1), n1, color);
        push_vert(&mut mesh.vertices, Vec3::new(radius * c1, hh, radius * s1), n1, color);
        push_vert(&mut mesh.vertices, Vec3::new(radius * c0, hh, radius * s0), n0, color);
        mesh.indices
            .extend_from_slice(&[base, base + 2, base + 1, base, base + 3, base + 2]);
    }

    add_cap(&mut mesh, radius, hh, segments, Vec3::Y, color);
    add_cap(&mut mesh, radius, -hh, segments, Vec3::NEG_Y, color);
    mesh
}

pub fn sphere(radius: f32, rings: u32, sectors: u32, color: [f32; 3]) -> MeshData {
    let mut mesh = MeshData::default();

    for r in 0..=rings {
        let (sp, cp) = (PI * r as f32 / rings as f32).sin_cos();
        for s in 0..=sectors {
            let (st, ct) = segment_angle(s, sectors).sin_cos();
            let n = Vec3::new(sp * ct, cp, sp * st);
            push_vert(&mut mesh.vertices, n * radius, n, color);
        }
    }

    for r in 0..rings {
        for s in 0..sectors {
            let i0 = r * (sectors + 1) + s;
            let i1 = i0 + 1;
            let i2 = i0 + sectors + 1;
            let i3 = i2 + 1;
            // Pole rows collapse to fans: the quad half touching the pole is degenerate
            if r != 0 {
                mesh.indices.extend_from_slice(&[i0, i1, i2]);
            }
            if r != rings - 1 {
                mesh.indices.extend_from_slice(&[i1, i3, i2]);
            }
        }
    }
    mesh
}

pub fn cone(radius: f32, height: f32, segments: u32, color: [f32; 3]) -> MeshData {
    let hh = height * 0.5;
    let slope = radius / height;
    let mut mesh = MeshData::default();

    for i in 0..segments {
        let (s0, c0) = segment_angle(i, segments).sin_cos();
        let (s1, c1) = segment_angle(i + 1, segments).sin_cos();
        let n0 = Vec3::new(c0, slope, s0).normalize();
        let n1 = Vec3::new(c1, slope, s1).normalize();

        let base = mesh.vertex_count() as u32;
        push_vert(&mut mesh.vertices, Vec3::new(0.0, hh, 0.0), (n0 + n1).normalize(), color);
        push_vert(&mut mesh.vertices, Vec3::new(radius * c0, -hh, radius * s0), n0, color);
        push_vert(&mut mesh.vertices, Vec3::new(radius * c1, -hh, radius * s1), n1, color);
        mesh.indices.extend_from_slice(&[base, base + 2, base + 1]);
    }

    add_cap(&mut mesh, radius, -hh, segments, Vec3::NEG_Y, color);
    mesh
}

// ── Grid and axes ────────────────────────────────────────────

pub fn grid(range: i32, cell_size: f32, opacity: f32) -> LineMeshData {
    let mut lines = LineMeshData::default();
    let grid_color = [0.25_f32, 0.25, 0.25, opacity];
    let origin_color_x = [0.5_f32, 0.2, 0.2, opacity * 0.7];
    let origin_color_z = [0.2_f32, 0.2, 0.5, opacity * 0.7];

    let extent = range as f32 * cell_size;

    for i in -range..=range {
        let f = i as f32 * cell_size;
        let (along_z, along_x) = if i == 0 {
            (origin_color_z, origin_color_x)
        } else {
            (grid_color, grid_color)
        };
        lines.push_segment(Vec3::new(f, 0.0, -extent), Vec3::new(f, 0.0, extent), along_z);
        lines.push_segment(Vec3::new(-extent, 0.0, f), Vec3::new(extent, 0.0, f), along_x);
    }

    lines
}

pub fn axes(length: f32) -> LineMeshData {
    let mut lines = LineMeshData::default();
    lines.push_segment(Vec3::ZERO, Vec3::X * length, [0.9, 0.2, 0.2, 1.0]);
    lines.push_segment(Vec3::ZERO, Vec3::Y * length, [0.2, 0.8, 0.2, 1.0]);
    lines.push_segment(Vec3::ZERO, Vec3::Z * length, [0.2, 0.3, 0.9, 1.0]);
    lines
}

// ── Helpers ──────────────────────────────────────────────────

fn segment_angle(i: u32, segments: u32) -> f32 {
    i as f32 * TAU / segments as f32
}

fn push_vert(v: &mut Vec<f32>, p: Vec3, n: Vec3, c: [f32; 3]) {
    v.extend_from_slice(&[p.x, p.y, p.z, n.x, n.y, n.z, c[0], c[1], c[2]]);
}

fn push_line_vert(v: &mut Vec<f32>, p: Vec3, c: [f32; 4]) {
    v.extend_from_slice(&[p.x, p.y, p.z, c[0], c[1], c[2], c[3]]);
}

/// Fan cap at height `y`, wound so it faces along `normal`
fn add_cap(mesh: &mut MeshData, radius: f32, y: f32, segments: u32, normal: Vec3, color: [f32; 3]) {
    let center = mesh.vertex_count() as u32;
    push_vert(&mut mesh.vertices, Vec3::new(0.0, y, 0.0), normal, color);

    for i in 0..segments {
        let (s, c) = segment_angle(i, segments).sin_cos();
        push_vert(&mut mesh.vertices, Vec3::new(radius * c, y, radius * s), normal, color);
    }

    let facing_up = normal.y > 0.0;
    for i in 0..segments {
        let a = center + 1 + i;
        let b = center + 1 + (i + 1) % segments;
        if facing_up {
            mesh.indices.extend_from_slice(&[center, b, a]);
        } else {
            mesh.indices.extend_from_slice(&[center, a, b]);
        }
    }
}
