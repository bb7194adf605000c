//! Tool arbitration.
//!
//! At most one tool is active and at most one is selected. A left press
//! starts the selected tool and the release ends it. A middle press lets the
//! orbiter preempt whatever is selected: the previous selection is remembered
//! and restored on middle release, without `start` being called on it.

use glam::Vec2;

use super::{OrbitTool, PanTool, SelectTool, Tool, ToolContext, ToolKind};
use crate::events::ViewportEvent;
use crate::input::{Key, MouseButton};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    Idle,
    SelectedInactive(ToolKind),
    Active(ToolKind),
    /// Orbiter running on the middle button; `suspended` is restored on release
    OrbitOverride { suspended: Option<ToolKind> },
}

#[derive(Debug, Clone, Default)]
pub struct ToolCoordinator {
    orbit: OrbitTool,
    select: SelectTool,
    pan: PanTool,
    selected: Option<ToolKind>,
    /// Selection saved by a middle press, `Some(None)` when nothing was selected
    before_orbit: Option<Option<ToolKind>>,
}

impl ToolCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tool(&self, kind: ToolKind) -> &dyn Tool {
        match kind {
            ToolKind::Orbit => &self.orbit,
            ToolKind::Select => &self.select,
            ToolKind::Pan => &self.pan,
        }
    }

    fn tool_mut(&mut self, kind: ToolKind) -> &mut dyn Tool {
        match kind {
            ToolKind::Orbit => &mut self.orbit,
            ToolKind::Select => &mut self.select,
            ToolKind::Pan => &mut self.pan,
        }
    }

    pub fn select_tool(&self) -> &SelectTool {
        &self.select
    }

    pub fn orbit_tool(&self) -> &OrbitTool {
        &self.orbit
    }

    pub fn selected(&self) -> Option<ToolKind> {
        self.selected
    }

    pub fn active(&self) -> Option<ToolKind> {
        ToolKind::ALL
            .into_iter()
            .find(|&k| self.tool(k).is_active())
    }

    /// Number of active tools; never more than one
    pub fn active_count(&self) -> usize {
        ToolKind::ALL
            .into_iter()
            .filter(|&k| self.tool(k).is_active())
            .count()
    }

    pub fn state(&self) -> CoordinatorState {
        match (self.active(), self.before_orbit) {
            (Some(ToolKind::Orbit), Some(previous)) => CoordinatorState::OrbitOverride {
                suspended: previous.filter(|&k| k != ToolKind::Orbit),
            },
            (Some(kind), _) => CoordinatorState::Active(kind),
            (None, _) => match self.selected {
                Some(kind) => CoordinatorState::SelectedInactive(kind),
                None => CoordinatorState::Idle,
            },
        }
    }

    /// Abort the active tool and select `kind`. The new tool is not started.
    /// An explicit selection also drops whatever a middle press had saved.
    pub fn set_tool(&mut self, kind: Option<ToolKind>, ctx: &mut ToolContext) {
        let before = (self.selected, self.active());
        self.before_orbit = None;
        self.abort_active(ctx);
        self.selected = kind;
        if before != (self.selected, self.active()) {
            tracing::debug!("Tool selected: {:?}", kind.map(ToolKind::name));
            self.notify(ctx);
        }
    }

    /// Cancel the active tool, if any
    pub fn abort_active(&mut self, ctx: &mut ToolContext) {
        if let Some(kind) = self.active() {
            tracing::debug!("Tool {} aborted", kind.name());
            self.tool_mut(kind).abort(ctx);
            self.notify(ctx);
        }
    }

    pub fn mouse_down(&mut self, button: MouseButton, ctx: &mut ToolContext) {
        match button {
            MouseButton::Middle => {
                if self.orbit.is_active() {
                    return;
                }
                let previous = self.selected;
                self.set_tool(Some(ToolKind::Orbit), ctx);
                self.before_orbit = Some(previous);
                self.orbit.start(ctx);
                self.notify(ctx);
            }
            MouseButton::Left => {
                if self.active().is_some() {
                    return;
                }
                if let Some(kind) = self.selected {
                    tracing::debug!("Tool {} started", kind.name());
                    self.tool_mut(kind).start(ctx);
                    self.notify(ctx);
                }
            }
            MouseButton::Right => {}
        }
    }

    pub fn mouse_up(&mut self, button: MouseButton, ctx: &mut ToolContext) {
        match button {
            MouseButton::Middle => match self.before_orbit.take() {
                Some(previous) if previous != Some(ToolKind::Orbit) => {
                    // Orbiter leaves without `end`; the old selection is not restarted
                    self.set_tool(previous, ctx);
                }
                _ => {
                    if self.selected == Some(ToolKind::Orbit) && !ctx.pointer.left {
                        self.end_active(ToolKind::Orbit, ctx);
                    }
                }
            },
            MouseButton::Left => {
                // A middle-button orbit ignores the left button
                if let CoordinatorState::OrbitOverride { .. } = self.state() {
                    return;
                }
                if let Some(kind) = self.active() {
                    self.end_active(kind, ctx);
                }
            }
            MouseButton::Right => {}
        }
    }

    /// Route one pointer delta. Returns false when no tool is active and the
    /// caller should run the hit test instead.
    pub fn pointer_delta(&mut self, delta: Vec2, ctx: &mut ToolContext) -> bool {
        match self.active() {
            Some(kind) => {
                self.tool_mut(kind).update(delta, ctx);
                true
            }
            None => false,
        }
    }

    /// Shortcut keys select tools, Escape aborts the active one.
    /// Returns true when the key was consumed.
    pub fn key_down(&mut self, key: Key, ctx: &mut ToolContext) -> bool {
        match key {
            Key::Escape => {
                let had_active = self.active().is_some();
                self.abort_active(ctx);
                had_active
            }
            Key::Char(c) => match ToolKind::from_shortcut(c) {
                Some(kind) => {
                    self.set_tool(Some(kind), ctx);
                    true
                }
                None => false,
            },
            Key::Shift => false,
        }
    }

    fn end_active(&mut self, kind: ToolKind, ctx: &mut ToolContext) {
        let was_active = self.tool(kind).is_active();
        if self.tool_mut(kind).end(ctx) && was_active {
            tracing::debug!("Tool {} ended", kind.name());
            self.notify(ctx);
        }
    }

    fn notify(&self, ctx: &mut ToolContext) {
        ctx.events.push(ViewportEvent::ToolChange {
            selected: self.selected,
            active: self.active(),
        });
    }
}
