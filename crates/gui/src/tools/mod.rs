//! Interactive viewport tools and the coordinator that decides which one
//! owns pointer input.

pub mod coordinator;
pub mod orbit;
pub mod pan;
pub mod select;

use egui::CursorIcon;
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::events::ViewportEvent;
use crate::input::PointerState;
use crate::state::settings::NavigationSettings;
use crate::viewport::camera::ViewCamera;

pub use coordinator::{CoordinatorState, ToolCoordinator};
pub use orbit::OrbitTool;
pub use pan::PanTool;
pub use select::{RegionGeometry, SelectTool, SelectionRegion};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    Orbit,
    Select,
    Pan,
}

/// Static identity of a tool
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToolInfo {
    pub kind: ToolKind,
    pub name: &'static str,
    pub shortcut: char,
    pub cursor: CursorIcon,
}

impl ToolKind {
    pub const ALL: [ToolKind; 3] = [ToolKind::Orbit, ToolKind::Select, ToolKind::Pan];

    pub fn info(self) -> ToolInfo {
        match self {
            ToolKind::Orbit => ToolInfo {
                kind: self,
                name: "Orbit",
                shortcut: 'o',
                cursor: CursorIcon::Grab,
            },
            ToolKind::Select => ToolInfo {
                kind: self,
                name: "Select",
                shortcut: 's',
                cursor: CursorIcon::Crosshair,
            },
            ToolKind::Pan => ToolInfo {
                kind: self,
                name: "Pan",
                shortcut: 'p',
                cursor: CursorIcon::Move,
            },
        }
    }

    pub fn name(self) -> &'static str {
        self.info().name
    }

    pub fn from_shortcut(c: char) -> Option<ToolKind> {
        let c = c.to_ascii_lowercase();
        Self::ALL.into_iter().find(|k| k.info().shortcut == c)
    }
}

/// Fire-and-forget requests a tool can make of the host window
pub trait HostRequests {
    fn request_pointer_lock(&mut self);
    fn release_pointer_lock(&mut self);
}

/// Host that only records requests (headless runs and tests)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordingHost {
    pub locked: bool,
    pub lock_requests: usize,
    pub release_requests: usize,
}

impl HostRequests for RecordingHost {
    fn request_pointer_lock(&mut self) {
        self.locked = true;
        self.lock_requests += 1;
    }

    fn release_pointer_lock(&mut self) {
        self.locked = false;
        self.release_requests += 1;
    }
}

/// Everything a tool may read or touch while handling input
pub struct ToolContext<'a> {
    pub camera: &'a mut ViewCamera,
    pub pointer: &'a PointerState,
    /// Last resolved hover point, the pivot for orbit and pan
    pub hover_point: Vec3,
    pub navigation: &'a NavigationSettings,
    pub host: &'a mut dyn HostRequests,
    /// Events raised while handling this input, published by the caller
    pub events: &'a mut Vec<ViewportEvent>,
}

impl ToolContext<'_> {
    /// Pointer delta as a fraction of the viewport size
    pub fn normalized(&self, delta: Vec2) -> Vec2 {
        delta / self.camera.resolution()
    }
}

/// An interactive tool. Only the coordinator calls these.
pub trait Tool {
    fn kind(&self) -> ToolKind;
    fn is_active(&self) -> bool;
    fn start(&mut self, ctx: &mut ToolContext);
    /// Called once per pointer delta while active
    fn update(&mut self, delta: Vec2, ctx: &mut ToolContext);
    /// Graceful end request. Returns false when the tool vetoes it; calling
    /// it on an inactive tool is a no-op returning true.
    fn end(&mut self, ctx: &mut ToolContext) -> bool;
    /// Deactivate unconditionally and release the pointer lock
    fn abort(&mut self, ctx: &mut ToolContext);

    fn info(&self) -> ToolInfo {
        self.kind().info()
    }
}
