// Library crate: the picking and tool core plus the headless harness used by
// integration tests and input scripts. The egui app and GL code stay in the binary.

pub mod command;
pub mod editor;
pub mod error;
pub mod events;
pub mod harness;
pub mod input;
pub mod scene;
pub mod tools;

pub mod state {
    pub mod settings;
}

/// Viewport core shared with the binary; GL rendering and picking live there.
pub mod viewport {
    pub mod camera;
    pub mod edge;
    pub mod hit_test;
    pub mod mesh;
    pub mod picking;
    pub mod software_target;
    pub mod work_plane;
}
