//! JSON input scripts replayed against the headless harness.
//!
//! A script is a list of commands; each one produces a [`CommandResponse`]
//! so a failing step can be reported without aborting the rest.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use shared::SceneDescription;

use crate::harness::TestHarness;
use crate::input::{Key, MouseButton};
use crate::tools::{CoordinatorState, ToolKind};
use crate::viewport::hit_test::HoverResult;

/// One step of an input script
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum InputCommand {
    /// Move the pointer to viewport pixels (top-left origin)
    MouseMove { x: f32, y: f32 },
    MouseDown { button: MouseButton },
    MouseUp { button: MouseButton },
    /// Scroll one notch, direction -1 or 1
    MouseScroll { direction: i8 },
    KeyDown { key: Key },
    KeyUp { key: Key },
    /// Select a tool; `null` clears the selection
    SetTool {
        #[serde(default)]
        tool: Option<ToolKind>,
    },
    Resize { width: f32, height: f32 },
    /// Replace the scene
    LoadScene { scene: SceneDescription },
    /// Report tool state, hover and camera
    Inspect,
}

/// Response from executing a command.
#[derive(Debug, Serialize, Deserialize)]
pub struct CommandResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl CommandResponse {
    fn ok() -> Self {
        Self {
            success: true,
            error: None,
            data: None,
        }
    }

    fn ok_with_data(data: serde_json::Value) -> Self {
        Self {
            success: true,
            error: None,
            data: Some(data),
        }
    }

    fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(msg.into()),
            data: None,
        }
    }
}

fn vec3_json(v: Vec3) -> serde_json::Value {
    serde_json::json!([v.x, v.y, v.z])
}

fn hover_json(hover: &HoverResult) -> serde_json::Value {
    serde_json::json!({
        "point": vec3_json(hover.point),
        "solid": hover.solid,
        "edge": hover.edge,
        "vertex": hover.vertex,
        "normal": hover.normal.map(vec3_json),
    })
}

fn state_json(state: CoordinatorState) -> serde_json::Value {
    match state {
        CoordinatorState::Idle => serde_json::json!({ "state": "idle" }),
        CoordinatorState::SelectedInactive(tool) => {
            serde_json::json!({ "state": "selected_inactive", "tool": tool })
        }
        CoordinatorState::Active(tool) => serde_json::json!({ "state": "active", "tool": tool }),
        CoordinatorState::OrbitOverride { suspended } => {
            serde_json::json!({ "state": "orbit_override", "suspended": suspended })
        }
    }
}

fn inspect(harness: &TestHarness) -> serde_json::Value {
    let camera = harness.camera();
    let resolution: Vec2 = camera.resolution();
    serde_json::json!({
        "selected_tool": harness.selected_tool(),
        "active_tool": harness.active_tool(),
        "tool_state": state_json(harness.tool_state()),
        "hover": harness.hover().map(hover_json),
        "hovered_solid": harness.scene.hovered_id(),
        "axis": harness.editor.current_axis(),
        "last_error": harness.last_error().map(|e| e.to_string()),
        "camera": {
            "target": vec3_json(camera.target()),
            "eye": vec3_json(camera.eye_position()),
            "yaw": camera.yaw(),
            "pitch": camera.pitch(),
            "distance": camera.distance(),
            "resolution": [resolution.x, resolution.y],
        },
    })
}

/// Execute a single command on the harness.
pub fn execute_command(harness: &mut TestHarness, cmd: InputCommand) -> CommandResponse {
    match cmd {
        InputCommand::MouseMove { x, y } => {
            harness.move_to(x, y);
            CommandResponse::ok()
        }

        InputCommand::MouseDown { button } => {
            harness.press(button);
            CommandResponse::ok()
        }

        InputCommand::MouseUp { button } => {
            harness.release(button);
            CommandResponse::ok()
        }

        InputCommand::MouseScroll { direction } => {
            if direction != 1 && direction != -1 {
                return CommandResponse::err(format!(
                    "Scroll direction must be -1 or 1, got {direction}"
                ));
            }
            harness.scroll(direction);
            CommandResponse::ok()
        }

        InputCommand::KeyDown { key } => {
            harness.key_down(key);
            CommandResponse::ok()
        }

        InputCommand::KeyUp { key } => {
            harness.key_up(key);
            CommandResponse::ok()
        }

        InputCommand::SetTool { tool } => {
            harness.set_tool(tool);
            CommandResponse::ok_with_data(serde_json::json!({ "selected": harness.selected_tool() }))
        }

        InputCommand::Resize { width, height } => {
            if !(width >= 1.0 && height >= 1.0) {
                return CommandResponse::err(format!("Invalid viewport size {width}x{height}"));
            }
            harness.resize(width, height);
            CommandResponse::ok()
        }

        InputCommand::LoadScene { scene } => {
            harness.load_scene(&scene);
            CommandResponse::ok_with_data(serde_json::json!({ "solid_count": scene.solids.len() }))
        }

        InputCommand::Inspect => CommandResponse::ok_with_data(inspect(harness)),
    }
}

/// Parse and execute a single JSON command string.
pub fn execute_json(harness: &mut TestHarness, json: &str) -> Result<CommandResponse, String> {
    let cmd: InputCommand =
        serde_json::from_str(json).map_err(|e| format!("Invalid command JSON: {e}"))?;
    Ok(execute_command(harness, cmd))
}

/// Parse and execute multiple JSON commands (array).
pub fn execute_json_batch(
    harness: &mut TestHarness,
    json: &str,
) -> Result<Vec<CommandResponse>, String> {
    let cmds: Vec<InputCommand> =
        serde_json::from_str(json).map_err(|e| format!("Invalid commands JSON: {e}"))?;
    Ok(cmds
        .into_iter()
        .map(|cmd| execute_command(harness, cmd))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_serde_mouse_down() {
        let json = r#"{"command": "mouse_down", "button": "middle"}"#;
        let cmd: InputCommand = serde_json::from_str(json).unwrap();
        assert!(matches!(
            cmd,
            InputCommand::MouseDown {
                button: MouseButton::Middle
            }
        ));
    }

    #[test]
    fn test_command_serde_key() {
        let json = r#"{"command": "key_down", "key": {"char": "s"}}"#;
        let cmd: InputCommand = serde_json::from_str(json).unwrap();
        match cmd {
            InputCommand::KeyDown { key } => assert_eq!(key, Key::Char('s')),
            _ => panic!("Expected KeyDown"),
        }

        let json = r#"{"command": "key_down", "key": "escape"}"#;
        let cmd: InputCommand = serde_json::from_str(json).unwrap();
        assert!(matches!(cmd, InputCommand::KeyDown { key: Key::Escape }));
    }

    #[test]
    fn test_command_serde_set_tool_null() {
        let cmd: InputCommand = serde_json::from_str(r#"{"command": "set_tool"}"#).unwrap();
        assert!(matches!(cmd, InputCommand::SetTool { tool: None }));
    }

    #[test]
    fn test_execute_inspect_reports_hover() {
        let mut h = TestHarness::new();
        h.add_cube("c1", 2.0, [0.0, 0.0, 0.0]);
        execute_json(&mut h, r#"{"command": "mouse_move", "x": 160, "y": 120}"#).unwrap();

        let resp = execute_json(&mut h, r#"{"command": "inspect"}"#).unwrap();
        assert!(resp.success);
        let data = resp.data.unwrap();
        assert_eq!(data["hover"]["solid"], "c1");
        assert_eq!(data["tool_state"]["state"], "idle");
        assert_eq!(data["camera"]["resolution"][0], 320.0);
    }

    #[test]
    fn test_execute_rejects_bad_scroll_and_size() {
        let mut h = TestHarness::new();
        let resp = execute_json(&mut h, r#"{"command": "mouse_scroll", "direction": 3}"#).unwrap();
        assert!(!resp.success);
        assert!(resp.error.unwrap().contains("-1 or 1"));

        let resp =
            execute_json(&mut h, r#"{"command": "resize", "width": 0, "height": 10}"#).unwrap();
        assert!(!resp.success);
    }

    #[test]
    fn test_execute_batch_middle_override() {
        let mut h = TestHarness::new();
        let script = r#"[
            {"command": "set_tool", "tool": "select"},
            {"command": "mouse_move", "x": 100, "y": 100},
            {"command": "mouse_down", "button": "middle"},
            {"command": "inspect"},
            {"command": "mouse_up", "button": "middle"},
            {"command": "inspect"}
        ]"#;
        let responses = execute_json_batch(&mut h, script).unwrap();
        assert_eq!(responses.len(), 6);
        assert!(responses.iter().all(|r| r.success));

        let during = responses[3].data.as_ref().unwrap();
        assert_eq!(during["tool_state"]["state"], "orbit_override");
        assert_eq!(during["tool_state"]["suspended"], "select");

        let after = responses[5].data.as_ref().unwrap();
        assert_eq!(after["selected_tool"], "select");
        assert!(after["active_tool"].is_null());
    }

    #[test]
    fn test_execute_load_scene() {
        let mut h = TestHarness::new();
        let cmd = InputCommand::LoadScene {
            scene: SceneDescription::demo(),
        };
        let resp = execute_command(&mut h, cmd);
        assert!(resp.success);
        assert_eq!(resp.data.unwrap()["solid_count"], 3);
        assert_eq!(h.scene.solids().len(), 3);
    }

    #[test]
    fn test_execute_invalid_json() {
        let mut h = TestHarness::new();
        assert!(execute_json(&mut h, "not valid json").is_err());
        assert!(execute_json(&mut h, r#"{"command": "fly"}"#).is_err());
    }
}
