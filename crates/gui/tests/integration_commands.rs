//! Integration tests for the JSON input-script protocol.
//!
//! Tests the full command pipeline: JSON string -> parse -> execute -> response.

use solidpick_gui_lib::command::{execute_json, execute_json_batch};
use solidpick_gui_lib::harness::TestHarness;

fn f(v: &serde_json::Value) -> f64 {
    v.as_f64().expect("number")
}

#[test]
fn test_command_load_scene_and_hover() {
    let mut h = TestHarness::new();

    let json = r#"{"command": "load_scene", "scene": {"solids": [{"id": "c1", "name": "Cube", "primitive": {"type": "cube", "width": 2.0, "height": 2.0, "depth": 2.0}}]}}"#;
    let resp = execute_json(&mut h, json).unwrap();
    assert!(resp.success);
    assert_eq!(resp.data.unwrap()["solid_count"], 1);

    execute_json(&mut h, r#"{"command": "mouse_move", "x": 160, "y": 120}"#).unwrap();
    let data = execute_json(&mut h, r#"{"command": "inspect"}"#)
        .unwrap()
        .data
        .unwrap();
    assert_eq!(data["hovered_solid"], "c1");
    assert_eq!(data["hover"]["solid"], "c1");
    assert!(data["hover"]["normal"].is_null());
    assert!(data["last_error"].is_null());
}

#[test]
fn test_command_middle_orbit_script() {
    let mut h = TestHarness::new();

    let script = r#"[
        {"command": "mouse_move", "x": 160, "y": 120},
        {"command": "mouse_down", "button": "middle"},
        {"command": "inspect"},
        {"command": "mouse_move", "x": 190, "y": 110},
        {"command": "mouse_up", "button": "middle"},
        {"command": "inspect"}
    ]"#;
    let responses = execute_json_batch(&mut h, script).unwrap();
    assert_eq!(responses.len(), 6);
    assert!(responses.iter().all(|r| r.success));

    let during = responses[2].data.as_ref().unwrap();
    assert_eq!(during["tool_state"]["state"], "orbit_override");
    assert!(during["tool_state"]["suspended"].is_null());
    assert_eq!(during["active_tool"], "orbit");

    let after = responses[5].data.as_ref().unwrap();
    assert_eq!(after["tool_state"]["state"], "idle");
    assert!(after["active_tool"].is_null());
    assert!(f(&after["camera"]["yaw"]) < f(&during["camera"]["yaw"]));
    assert!(!h.host.locked);
}

#[test]
fn test_command_shortcut_keys_select_tools() {
    let mut h = TestHarness::new();

    let script = r#"[
        {"command": "key_down", "key": {"char": "p"}},
        {"command": "key_up", "key": {"char": "p"}},
        {"command": "inspect"},
        {"command": "set_tool", "tool": "select"},
        {"command": "set_tool", "tool": null},
        {"command": "inspect"}
    ]"#;
    let responses = execute_json_batch(&mut h, script).unwrap();

    let data = responses[2].data.as_ref().unwrap();
    assert_eq!(data["selected_tool"], "pan");
    assert_eq!(data["tool_state"]["state"], "selected_inactive");
    assert_eq!(data["tool_state"]["tool"], "pan");

    assert_eq!(responses[3].data.as_ref().unwrap()["selected"], "select");
    assert_eq!(responses[5].data.as_ref().unwrap()["tool_state"]["state"], "idle");
}

#[test]
fn test_command_failed_step_does_not_abort_batch() {
    let mut h = TestHarness::new();

    let script = r#"[
        {"command": "resize", "width": 0, "height": 100},
        {"command": "resize", "width": 640, "height": 480},
        {"command": "inspect"}
    ]"#;
    let responses = execute_json_batch(&mut h, script).unwrap();
    assert!(!responses[0].success);
    assert!(responses[0].error.as_ref().unwrap().contains("Invalid viewport size"));
    assert!(responses[1].success);

    let resolution = &responses[2].data.as_ref().unwrap()["camera"]["resolution"];
    assert_eq!(f(&resolution[0]), 640.0);
    assert_eq!(f(&resolution[1]), 480.0);
}

#[test]
fn test_command_rotated_work_plane() {
    let mut h = TestHarness::new();

    // Plane tipped a quarter turn about X and lifted one unit along Z
    let json = r#"{"command": "load_scene", "scene": {"work_plane": {"position": [0.0, 0.0, 1.0], "rotation": [90.0, 0.0, 0.0], "scale": [1.0, 1.0, 1.0]}}}"#;
    assert!(execute_json(&mut h, json).unwrap().success);

    execute_json(&mut h, r#"{"command": "mouse_move", "x": 160, "y": 120}"#).unwrap();
    let data = execute_json(&mut h, r#"{"command": "inspect"}"#)
        .unwrap()
        .data
        .unwrap();

    // Local +Y of the placement, which points along world +Z
    assert_eq!(data["axis"], 1);
    let normal = &data["hover"]["normal"];
    assert!(f(&normal[0]).abs() < 1e-4);
    assert!(f(&normal[1]).abs() < 1e-4);
    assert!((f(&normal[2]) - 1.0).abs() < 1e-4);
    assert!((f(&data["hover"]["point"][2]) - 1.0).abs() < 1e-3);
}

#[test]
fn test_command_pointer_outside_reports_error() {
    let mut h = TestHarness::new();

    execute_json(&mut h, r#"{"command": "mouse_move", "x": 500, "y": 10}"#).unwrap();
    let data = execute_json(&mut h, r#"{"command": "inspect"}"#)
        .unwrap()
        .data
        .unwrap();
    assert!(data["hover"].is_null());
    assert!(data["last_error"].as_str().unwrap().contains("outside"));
}

#[test]
fn test_command_unknown_command_is_parse_error() {
    let mut h = TestHarness::new();
    let err = execute_json(&mut h, r#"{"command": "teleport"}"#).unwrap_err();
    assert!(err.contains("Invalid command JSON"));

    let err = execute_json_batch(&mut h, r#"{"command": "inspect"}"#).unwrap_err();
    assert!(err.contains("Invalid commands JSON"));
}
