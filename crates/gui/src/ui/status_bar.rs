use egui::Ui;

use crate::editor::Editor;
use crate::scene::SceneState;
use crate::tools::CoordinatorState;

pub fn show(ui: &mut Ui, editor: &Editor, scene: &SceneState, pick_error: Option<&str>) {
    ui.horizontal(|ui| {
        ui.weak(format!("Solids: {}", scene.solids().len()));

        ui.separator();

        let state = match editor.tool_state() {
            CoordinatorState::Idle => "No tool".to_string(),
            CoordinatorState::SelectedInactive(kind) => kind.name().to_string(),
            CoordinatorState::Active(kind) => format!("{} (active)", kind.name()),
            CoordinatorState::OrbitOverride { suspended } => match suspended {
                Some(kind) => format!("Orbit (over {})", kind.name()),
                None => "Orbit".to_string(),
            },
        };
        ui.label(state);

        ui.separator();

        match editor.hover() {
            Some(hover) => {
                let p = hover.point;
                let target = match (&hover.solid, hover.edge, hover.vertex) {
                    (None, ..) => "plane".to_string(),
                    (Some(id), Some(edge), _) => format!("{} edge {}", display_name(scene, id), edge),
                    (Some(id), _, Some(vertex)) => {
                        format!("{} vertex {}", display_name(scene, id), vertex)
                    }
                    (Some(id), None, None) => display_name(scene, id).to_string(),
                };
                ui.monospace(format!("{target}  ({:.3}, {:.3}, {:.3})", p.x, p.y, p.z));
            }
            None => {
                ui.weak("-");
            }
        }

        if let Some(err) = pick_error {
            ui.separator();
            ui.colored_label(egui::Color32::from_rgb(255, 140, 100), err);
        }

        // Right-aligned version
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            ui.weak("solidpick v0.1");
        });
    });
}

fn display_name<'a>(scene: &'a SceneState, id: &'a str) -> &'a str {
    scene.solid(id).map(|s| s.display_name()).unwrap_or(id)
}
