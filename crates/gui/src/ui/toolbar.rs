//! Tool selection toolbar

use egui::Ui;

use crate::editor::Editor;
use crate::tools::ToolKind;

/// What the user asked for this frame
#[derive(Debug, Default)]
pub struct ToolbarActions {
    /// `Some(None)` clears the tool selection
    pub set_tool: Option<Option<ToolKind>>,
    pub reset_camera: bool,
}

pub fn show(ui: &mut Ui, editor: &Editor) -> ToolbarActions {
    let mut actions = ToolbarActions::default();
    let selected = editor.coordinator().selected();

    ui.horizontal(|ui| {
        for kind in ToolKind::ALL {
            let info = kind.info();
            let button = ui
                .selectable_label(selected == Some(kind), info.name)
                .on_hover_text(format!("{} ({})", info.name, info.shortcut.to_ascii_uppercase()));
            if button.clicked() {
                // Clicking the selected tool again deselects it
                let next = if selected == Some(kind) { None } else { Some(kind) };
                actions.set_tool = Some(next);
            }
        }

        ui.separator();

        if ui.button("Reset view").clicked() {
            actions.reset_camera = true;
        }
    });

    actions
}
