//! Integration tests for TestHarness.
//!
//! Drives the editor headlessly with synthetic pointer input against the CPU
//! pick target and checks hover results, tool arbitration and camera motion.

use glam::{Vec2, Vec3};
use solidpick_gui_lib::error::PickError;
use solidpick_gui_lib::events::{EventKind, ViewportEvent};
use solidpick_gui_lib::harness::TestHarness;
use solidpick_gui_lib::input::{Key, MouseButton};
use solidpick_gui_lib::scene::{Placement, SceneHost, Solid};
use solidpick_gui_lib::tools::{CoordinatorState, ToolKind};
use solidpick_gui_lib::viewport::camera::ViewCamera;
use solidpick_gui_lib::viewport::mesh::MeshData;

/// One upward-facing triangle in the XY plane
fn triangle() -> Solid {
    triangle_solid(
        "tri",
        [
            Vec3::new(-2.0, -1.5, 0.0),
            Vec3::new(2.0, -1.5, 0.0),
            Vec3::new(0.0, 2.0, 0.0),
        ],
    )
}

fn triangle_solid(id: &str, corners: [Vec3; 3]) -> Solid {
    let vertices = corners
        .iter()
        .flat_map(|p| [p.x, p.y, p.z, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0])
        .collect();
    let mesh = MeshData {
        vertices,
        indices: vec![0, 1, 2],
    };
    Solid::from_mesh(id.into(), "Triangle".into(), mesh, Placement::default())
}

fn front_camera() -> ViewCamera {
    ViewCamera::looking_at(Vec3::ZERO, 0.0, 0.0, 8.0)
}

#[test]
fn test_triangle_centroid_hit() {
    let mut h = TestHarness::new();
    h.scene.add_solid(triangle());
    h.set_camera(front_camera());

    let centroid = Vec3::new(0.0, -0.5 / 1.5, 0.0);
    let pointer = h.camera().project(centroid).unwrap();
    h.move_to(pointer.x, pointer.y);

    let hover = h.hover().expect("hover after move");
    assert_eq!(hover.solid.as_deref(), Some("tri"));
    assert!(hover.edge.is_none() && hover.vertex.is_none());
    assert!(
        hover.point.abs_diff_eq(centroid, 0.05),
        "hit {:?} far from centroid",
        hover.point
    );
    assert_eq!(h.scene.last_hover(), Some(hover));
}

#[test]
fn test_viewport_filling_triangle_returns_exact_world_point() {
    let mut h = TestHarness::new();
    // Corners and edges lie far outside the view, so every pixel sees the face
    h.scene.add_solid(triangle_solid(
        "floor",
        [
            Vec3::new(-100.0, -100.0, 0.0),
            Vec3::new(100.0, -100.0, 0.0),
            Vec3::new(0.0, 100.0, 0.0),
        ],
    ));
    h.set_camera(front_camera());

    for pointer in [Vec2::new(10.5, 10.5), Vec2::new(160.5, 120.5), Vec2::new(300.5, 200.5)] {
        h.move_to(pointer.x, pointer.y);
        let hover = h.hover().expect("hover over the face");
        assert_eq!(hover.solid.as_deref(), Some("floor"));
        assert!(hover.edge.is_none() && hover.vertex.is_none());

        // Ray through the centre of the pixel that was read back, cut with z = 0
        let center = Vec2::new(pointer.x.floor() + 0.5, pointer.y.floor() + 0.5);
        let ray = h.camera().pointer_ray(center);
        let expected = ray.origin + ray.direction * (-ray.origin.z / ray.direction.z);
        assert!(
            hover.point.abs_diff_eq(expected, 1e-4),
            "pointer {pointer:?}: hit {:?}, expected {expected:?}",
            hover.point
        );
    }
}

#[test]
fn test_triangle_outline_and_corners_are_pickable() {
    let mut h = TestHarness::new();
    h.scene.add_solid(triangle());
    h.set_camera(front_camera());
    assert_eq!(h.scene.solid("tri").unwrap().edges.len(), 3);

    // Slightly inside the top corner so the candidate ray crosses the bounds
    let p = h.camera().project(Vec3::new(0.0, 1.95, 0.0)).unwrap();
    h.move_to(p.x, p.y);
    let hover = h.hover().unwrap();
    let vertex = hover.vertex.expect("corner should be hovered");
    assert_eq!(h.scene.solid("tri").unwrap().vertices[vertex], Vec3::new(0.0, 2.0, 0.0));

    // Middle of the bottom edge
    let p = h.camera().project(Vec3::new(0.0, -1.48, 0.0)).unwrap();
    h.move_to(p.x, p.y);
    let hover = h.hover().unwrap();
    let edge = hover.edge.expect("edge should be hovered");
    let e = &h.scene.solid("tri").unwrap().edges[edge];
    assert!((e.start.y + 1.5).abs() < 1e-6 && (e.end.y + 1.5).abs() < 1e-6);
    assert!((hover.point.y + 1.5).abs() < 0.05);
}

#[test]
fn test_cube_corner_wins_over_faces() {
    let mut h = TestHarness::new();
    h.add_cube("c1", 2.0, [0.0, 0.0, 0.0]);

    let p = h.camera().project(Vec3::splat(0.9)).unwrap();
    h.move_to(p.x, p.y);

    let hover = h.hover().unwrap();
    let i = hover.vertex.expect("corner vertex");
    assert_eq!(h.scene.solid("c1").unwrap().vertices[i], Vec3::ONE);
    assert_eq!(hover.point, Vec3::ONE);
}

#[test]
fn test_background_falls_back_to_work_plane() {
    let mut h = TestHarness::new();
    h.move_to(160.0, 120.0);

    // Looking down and towards -Z from +X+Y+Z: the Z plane faces the view most
    let hover = h.hover().unwrap();
    assert!(hover.is_background());
    assert_eq!(hover.normal, Some(Vec3::Z));
    assert!(hover.point.z.abs() < 1e-3);
    assert_eq!(h.editor.current_axis(), Some(2));
    assert_eq!(h.scene.axis_normal(), Some(Vec3::Z));
    assert_eq!(h.count_events(EventKind::AxisChange), 1);

    // Same plane again: no second notification
    h.move_to(170.0, 125.0);
    assert_eq!(h.count_events(EventKind::AxisChange), 1);

    // Steep top-down view switches to the ground plane
    h.set_camera(ViewCamera::looking_at(Vec3::ZERO, 0.0, 1.2, 8.0));
    assert_eq!(h.editor.current_axis(), Some(1));
    assert_eq!(h.scene.axis_normal(), Some(Vec3::Y));
    assert!(h.hover().unwrap().point.y.abs() < 1e-3);
    assert_eq!(h.count_events(EventKind::AxisChange), 2);
}

#[test]
fn test_orbit_round_trip_restores_camera() {
    let mut h = TestHarness::new();
    let before = h.camera().clone();

    h.set_tool(Some(ToolKind::Orbit));
    h.move_to(160.0, 120.0);
    h.press(MouseButton::Left);
    assert_eq!(h.tool_state(), CoordinatorState::Active(ToolKind::Orbit));
    assert!(h.host.locked);

    h.drag_to(200.0, 120.0, 4);
    assert!((h.camera().yaw() - before.yaw()).abs() > 0.1);
    h.drag_to(160.0, 120.0, 4);

    h.release(MouseButton::Left);
    assert_eq!(h.tool_state(), CoordinatorState::SelectedInactive(ToolKind::Orbit));
    assert!(!h.host.locked);
    assert_eq!(h.host.lock_requests, 1);

    assert!((h.camera().yaw() - before.yaw()).abs() < 1e-4);
    assert!((h.camera().pitch() - before.pitch()).abs() < 1e-4);
    assert!(h.camera().target().abs_diff_eq(before.target(), 1e-3));
    assert!(h.camera().eye_position().abs_diff_eq(before.eye_position(), 1e-3));
}

#[test]
fn test_no_picks_while_tool_active() {
    let mut h = TestHarness::new();
    h.set_tool(Some(ToolKind::Pan));
    h.move_to(100.0, 100.0);
    h.press(MouseButton::Left);
    h.clear_events();

    h.drag_to(140.0, 130.0, 5);
    assert_eq!(h.count_events(EventKind::Hover), 0);
    assert_eq!(h.count_events(EventKind::CameraChange), 5);

    // Releasing hands the pointer back to the hit test
    h.release(MouseButton::Left);
    assert_eq!(h.count_events(EventKind::Hover), 1);
}

#[test]
fn test_middle_override_restores_selection() {
    let mut h = TestHarness::new();
    h.set_tool(Some(ToolKind::Select));
    h.move_to(100.0, 100.0);
    h.press(MouseButton::Left);
    assert_eq!(h.active_tool(), Some(ToolKind::Select));

    h.press(MouseButton::Middle);
    assert_eq!(
        h.tool_state(),
        CoordinatorState::OrbitOverride {
            suspended: Some(ToolKind::Select)
        }
    );
    h.drag_to(120.0, 100.0, 2);

    // Left release during the override is ignored
    h.release(MouseButton::Left);
    assert_eq!(h.active_tool(), Some(ToolKind::Orbit));

    h.release(MouseButton::Middle);
    assert_eq!(h.selected_tool(), Some(ToolKind::Select));
    assert_eq!(h.active_tool(), None);
    // The interrupted selection was aborted, not finished
    assert_eq!(h.count_events(EventKind::RegionSelected), 0);
    assert!(!h.host.locked);
}

#[test]
fn test_selection_region_published_on_release() {
    let mut h = TestHarness::new();
    h.key(Key::Char('s'));
    assert_eq!(h.selected_tool(), Some(ToolKind::Select));

    h.move_to(50.0, 40.0);
    h.press(MouseButton::Left);
    h.drag_to(120.0, 90.0, 3);

    let geometry = h.editor.selection_geometry().expect("region while dragging");
    assert!(geometry.vertices[0].abs_diff_eq(Vec2::new(50.0 / 160.0 - 1.0, 1.0 - 40.0 / 120.0), 1e-5));
    assert!(geometry.signed_area().abs() > 0.0);

    h.release(MouseButton::Left);
    assert!(h.editor.selection_geometry().is_none());
    let regions: Vec<_> = h
        .events()
        .into_iter()
        .filter_map(|e| match e {
            ViewportEvent::RegionSelected { min, max } => Some((min, max)),
            _ => None,
        })
        .collect();
    assert_eq!(regions, vec![(Vec2::new(50.0, 40.0), Vec2::new(120.0, 90.0))]);
}

#[test]
fn test_escape_aborts_active_tool() {
    let mut h = TestHarness::new();
    h.set_tool(Some(ToolKind::Orbit));
    h.press(MouseButton::Left);
    assert!(h.host.locked);

    h.key(Key::Escape);
    assert_eq!(h.active_tool(), None);
    assert_eq!(h.selected_tool(), Some(ToolKind::Orbit));
    assert!(!h.host.locked);
}

#[test]
fn test_failed_pick_retries_on_next_move() {
    let mut h = TestHarness::new();
    h.add_cube("c1", 2.0, [0.0, 0.0, 0.0]);

    h.target.fail_next_draw(PickError::Readback(0x0506));
    h.move_to(160.0, 120.0);
    assert!(matches!(h.last_error(), Some(PickError::Readback(_))));
    assert!(h.hover().is_none());
    assert!(h.editor.is_pick_pending());
    assert!(!h.target.is_bound());

    h.move_to(161.0, 120.0);
    assert!(h.last_error().is_none());
    assert_eq!(h.hover().unwrap().solid.as_deref(), Some("c1"));
}

#[test]
fn test_pointer_outside_viewport() {
    let mut h = TestHarness::new();
    h.move_to(400.0, 10.0);
    assert!(matches!(h.last_error(), Some(PickError::PointerOutside { .. })));
    assert!(h.hover().is_none());
    assert!(!h.editor.is_pick_pending());
}

#[test]
fn test_scroll_zoom_and_dolly() {
    let mut h = TestHarness::new();
    h.move_to(160.0, 120.0);
    let distance = h.camera().distance();

    h.scroll(1);
    assert!(h.camera().distance() < distance);

    let target = h.camera().target();
    h.key_down(Key::Shift);
    h.scroll(1);
    h.key_up(Key::Shift);
    assert!(!h.camera().target().abs_diff_eq(target, 1e-6));
    assert_eq!(h.count_events(EventKind::CameraChange), 2);
}

#[test]
fn test_scene_host_sink_sees_every_hover() {
    let mut h = TestHarness::new();
    h.move_to(10.0, 10.0);
    h.move_to(20.0, 20.0);
    assert_eq!(h.count_events(EventKind::Hover), 2);
    assert_eq!(h.scene.last_hover(), h.hover());
    assert!(h.scene.hovered_solid().is_none());
}
