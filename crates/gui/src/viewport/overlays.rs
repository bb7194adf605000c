//! Viewport overlay drawing (axis labels, hover marker, camera info)

use egui::{Painter, Pos2, Rect};
use glam::Vec3;

use super::camera::ViewCamera;
use super::hit_test::HoverResult;
use crate::scene::SceneState;

const HOVER_COLOR: egui::Color32 = egui::Color32::from_rgb(255, 200, 50);

fn to_screen(camera: &ViewCamera, rect: Rect, point: Vec3) -> Option<Pos2> {
    camera
        .project(point)
        .map(|p| rect.min + egui::vec2(p.x, p.y))
}

/// Draw axis labels in the viewport
pub fn draw_axis_labels(painter: &Painter, rect: Rect, camera: &ViewCamera, length: f32) {
    let tip = length * 1.07;
    let labels = [
        (Vec3::X * tip, "X", egui::Color32::from_rgb(220, 70, 70)),
        (Vec3::Y * tip, "Y", egui::Color32::from_rgb(70, 200, 70)),
        (Vec3::Z * tip, "Z", egui::Color32::from_rgb(70, 110, 220)),
    ];

    for (pos, label, color) in labels {
        if let Some(screen) = to_screen(camera, rect, pos) {
            if rect.contains(screen) {
                painter.text(
                    screen,
                    egui::Align2::LEFT_BOTTOM,
                    label,
                    egui::FontId::monospace(12.0),
                    color,
                );
            }
        }
    }
}

/// Mark the hover point; edges are traced and vertices boxed
pub fn draw_hover(painter: &Painter, rect: Rect, camera: &ViewCamera, scene: &SceneState, hover: &HoverResult) {
    let solid = hover.solid.as_deref().and_then(|id| scene.solid(id));

    if let Some(solid) = solid {
        let placement = &solid.placement;
        if let Some(edge) = hover.edge.and_then(|i| solid.edges.get(i)) {
            let a = to_screen(camera, rect, placement.transform_point(edge.start));
            let b = to_screen(camera, rect, placement.transform_point(edge.end));
            if let (Some(a), Some(b)) = (a, b) {
                painter.line_segment([a, b], egui::Stroke::new(3.0, HOVER_COLOR));
            }
        }
        if let Some(v) = hover.vertex.and_then(|i| solid.vertices.get(i)) {
            if let Some(p) = to_screen(camera, rect, placement.transform_point(*v)) {
                painter.rect_stroke(
                    Rect::from_center_size(p, egui::vec2(10.0, 10.0)),
                    0.0,
                    egui::Stroke::new(2.0, HOVER_COLOR),
                    egui::StrokeKind::Middle,
                );
            }
        }
    }

    if let Some(p) = to_screen(camera, rect, hover.point) {
        if rect.contains(p) {
            let color = if hover.is_background() {
                egui::Color32::from_rgb(140, 140, 150)
            } else {
                HOVER_COLOR
            };
            painter.circle_filled(p, 3.0, color);
        }
    }
}

pub fn draw_camera_info(painter: &Painter, rect: Rect, camera: &ViewCamera) {
    let overlay_rect = Rect::from_min_size(
        egui::pos2(rect.right() - 140.0, rect.top() + 4.0),
        egui::vec2(136.0, 44.0),
    );
    painter.rect_filled(
        overlay_rect,
        4.0,
        egui::Color32::from_rgba_premultiplied(0, 0, 0, 140),
    );
    painter.text(
        overlay_rect.min + egui::vec2(6.0, 4.0),
        egui::Align2::LEFT_TOP,
        format!(
            "Dist: {:.1}\nYaw: {:.0}  Pitch: {:.0}",
            camera.distance(),
            camera.yaw().to_degrees(),
            camera.pitch().to_degrees(),
        ),
        egui::FontId::monospace(10.0),
        egui::Color32::from_rgb(160, 160, 170),
    );
}
