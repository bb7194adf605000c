use serde::{Deserialize, Serialize};

/// Unique identifier of a solid in the scene
pub type ObjectId = String;

/// Primitive shape a solid is built from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Primitive {
    Cube {
        width: f64,
        height: f64,
        depth: f64,
    },
    Cylinder {
        radius: f64,
        height: f64,
    },
    Sphere {
        radius: f64,
    },
    Cone {
        radius: f64,
        height: f64,
    },
}

/// Object transform. Rotation is Euler XYZ in degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: [f64; 3],
    pub rotation: [f64; 3],
    pub scale: [f64; 3],
}

impl Transform {
    pub fn new() -> Self {
        Self {
            position: [0.0, 0.0, 0.0],
            rotation: [0.0, 0.0, 0.0],
            scale: [1.0, 1.0, 1.0],
        }
    }

    pub fn with_position(mut self, x: f64, y: f64, z: f64) -> Self {
        self.position = [x, y, z];
        self
    }

    pub fn with_rotation(mut self, rx: f64, ry: f64, rz: f64) -> Self {
        self.rotation = [rx, ry, rz];
        self
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

/// A solid placed in the scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolidDescription {
    pub id: ObjectId,
    #[serde(default)]
    pub name: String,
    pub primitive: Primitive,
    #[serde(default)]
    pub transform: Transform,
}

/// Scene loaded into the viewport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDescription {
    /// Format version
    #[serde(default = "default_version")]
    pub version: u32,
    /// Solids in the scene
    #[serde(default)]
    pub solids: Vec<SolidDescription>,
    /// Placement of the working plane used when nothing is hovered
    #[serde(default)]
    pub work_plane: Transform,
}

fn default_version() -> u32 {
    1
}

impl Default for SceneDescription {
    fn default() -> Self {
        Self {
            version: default_version(),
            solids: Vec::new(),
            work_plane: Transform::new(),
        }
    }
}

impl SceneDescription {
    /// Small scene shown when no scene file is given
    pub fn demo() -> Self {
        Self {
            version: default_version(),
            solids: vec![
                SolidDescription {
                    id: "block".into(),
                    name: "Block".into(),
                    primitive: Primitive::Cube {
                        width: 2.0,
                        height: 1.0,
                        depth: 1.5,
                    },
                    transform: Transform::new().with_position(0.0, 0.5, 0.0),
                },
                SolidDescription {
                    id: "post".into(),
                    name: "Post".into(),
                    primitive: Primitive::Cylinder {
                        radius: 0.4,
                        height: 2.0,
                    },
                    transform: Transform::new().with_position(2.5, 1.0, -0.5),
                },
                SolidDescription {
                    id: "ball".into(),
                    name: "Ball".into(),
                    primitive: Primitive::Sphere { radius: 0.6 },
                    transform: Transform::new().with_position(-2.2, 0.6, 0.8),
                },
            ],
            work_plane: Transform::new(),
        }
    }
}
