//! Feature edges and corner vertices of triangle meshes.
//!
//! The pick pass draws these on top of the faces so the element under the
//! pointer can be told apart. Extraction order is deterministic: edges come
//! out in the order their first triangle appears in the index buffer, so an
//! edge index stays stable across runs.

use std::collections::HashMap;

use glam::Vec3;

use super::mesh::MeshData;

/// Faces meeting at less than this angle are treated as one smooth surface
pub const SHARP_EDGE_DEGREES: f32 = 30.0;

/// Represents an edge in a mesh
#[derive(Debug, Clone, PartialEq)]
pub struct MeshEdge {
    pub start: Vec3,
    pub end: Vec3,
    pub normal1: Vec3,
    pub normal2: Option<Vec3>,
}

impl MeshEdge {
    /// Calculate the angle between adjacent faces (in radians)
    pub fn dihedral_angle(&self) -> f32 {
        match self.normal2 {
            Some(n2) => self.normal1.dot(n2).clamp(-1.0, 1.0).acos(),
            // Open boundary
            None => std::f32::consts::PI,
        }
    }

    /// Check if this is a "sharp" edge (faces meet at angle)
    pub fn is_sharp(&self, threshold_degrees: f32) -> bool {
        self.dihedral_angle().to_degrees() > threshold_degrees
    }

    pub fn midpoint(&self) -> Vec3 {
        (self.start + self.end) * 0.5
    }
}

type QuantizedPos = (i64, i64, i64);

fn quantize_position(pos: Vec3) -> QuantizedPos {
    let scale = 10000.0;
    (
        (pos.x * scale).round() as i64,
        (pos.y * scale).round() as i64,
        (pos.z * scale).round() as i64,
    )
}

fn edge_key(p1: QuantizedPos, p2: QuantizedPos) -> (QuantizedPos, QuantizedPos) {
    if p1 < p2 {
        (p1, p2)
    } else {
        (p2, p1)
    }
}

/// Extract all edges from a mesh, welding coincident positions
pub fn extract_edges(mesh: &MeshData) -> Vec<MeshEdge> {
    let mut edges: Vec<MeshEdge> = Vec::new();
    let mut lookup: HashMap<(QuantizedPos, QuantizedPos), usize> = HashMap::new();

    for [v0, v1, v2] in mesh.triangles() {
        // Welded corners make a sliver whose cross product is rounding noise
        let [q0, q1, q2] = [v0, v1, v2].map(quantize_position);
        if q0 == q1 || q1 == q2 || q2 == q0 {
            continue;
        }
        let Some(normal) = (v1 - v0).cross(v2 - v0).try_normalize() else {
            continue;
        };

        for (va, vb, qa, qb) in [(v0, v1, q0, q1), (v1, v2, q1, q2), (v2, v0, q2, q0)] {
            match lookup.get(&edge_key(qa, qb)) {
                Some(&i) => {
                    let edge = &mut edges[i];
                    if edge.normal2.is_none() {
                        edge.normal2 = Some(normal);
                    }
                }
                None => {
                    lookup.insert(edge_key(qa, qb), edges.len());
                    edges.push(MeshEdge {
                        start: va,
                        end: vb,
                        normal1: normal,
                        normal2: None,
                    });
                }
            }
        }
    }

    edges
}

/// Extract only sharp edges (edges where faces meet at an angle)
pub fn extract_sharp_edges(mesh: &MeshData, threshold_degrees: f32) -> Vec<MeshEdge> {
    extract_edges(mesh)
        .into_iter()
        .filter(|e| e.is_sharp(threshold_degrees))
        .collect()
}

/// Unique endpoints of the given edges, in first-seen order
pub fn corner_vertices(edges: &[MeshEdge]) -> Vec<Vec3> {
    let mut seen = HashMap::new();
    let mut corners = Vec::new();
    for edge in edges {
        for p in [edge.start, edge.end] {
            seen.entry(quantize_position(p)).or_insert_with(|| {
                corners.push(p);
            });
        }
    }
    corners
}
