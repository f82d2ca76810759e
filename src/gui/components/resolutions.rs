use eframe::egui;

use super::Action;
use crate::gui::constants::*;
use crate::gui::state::ManagerState;
use crate::types::Resolution;

/// Add/edit form for custom resolutions
#[derive(Debug, Default)]
struct CustomForm {
    width: String,
    height: String,
    refresh_rate: String,
    /// Custom resolution being edited, None when adding
    editing: Option<Resolution>,
    error: Option<String>,
}

impl CustomForm {
    fn begin_edit(&mut self, resolution: Resolution) {
        self.width = resolution.width.to_string();
        self.height = resolution.height.to_string();
        self.refresh_rate = resolution.refresh_rate.map(|r| r.to_string()).unwrap_or_default();
        self.editing = Some(resolution);
        self.error = None;
    }

    fn reset(&mut self) {
        *self = Self::default();
    }

    fn submit(&mut self) -> Option<Action> {
        match Resolution::from_form(&self.width, &self.height, &self.refresh_rate) {
            Ok(resolution) => {
                let action = match self.editing {
                    Some(old) => Action::EditCustom { old, new: resolution },
                    None => Action::AddCustom(resolution),
                };
                self.reset();
                Some(action)
            }
            Err(e) => {
                self.error = Some(e.to_string());
                None
            }
        }
    }
}

/// The full catalog with favorite toggles and custom resolution management
pub struct ResolutionPanel {
    form: CustomForm,
    scope_to_monitor: bool,
    favorite_label: String,
}

impl ResolutionPanel {
    pub fn new() -> Self {
        Self {
            form: CustomForm::default(),
            scope_to_monitor: false,
            favorite_label: String::new(),
        }
    }

    pub fn ui(
        &mut self,
        ui: &mut egui::Ui,
        state: &ManagerState,
        monitor_id: Option<&str>,
        actions: &mut Vec<Action>,
    ) {
        ui.group(|ui| {
            ui.label(egui::RichText::new("Resolutions").strong());

            ui.horizontal(|ui| {
                ui.add_enabled(
                    monitor_id.is_some(),
                    egui::Checkbox::new(&mut self.scope_to_monitor, "Favorite for selected monitor only"),
                );
            });
            ui.horizontal(|ui| {
                ui.label("Favorite label:");
                ui.text_edit_singleline(&mut self.favorite_label)
                    .on_hover_text("Optional name shown in the tray");
            });
            ui.add_space(ITEM_SPACING);

            let scope = monitor_id.filter(|_| self.scope_to_monitor);
            egui::ScrollArea::vertical()
                .id_salt("catalog_list")
                .max_height(220.0)
                .show(ui, |ui| {
                    for resolution in state.catalog().sorted() {
                        self.row(ui, state, resolution, monitor_id, scope, actions);
                    }
                });

            ui.add_space(ITEM_SPACING);
            ui.separator();
            self.form_ui(ui, actions);
        });
    }

    fn row(
        &mut self,
        ui: &mut egui::Ui,
        state: &ManagerState,
        resolution: &Resolution,
        monitor_id: Option<&str>,
        scope: Option<&str>,
        actions: &mut Vec<Action>,
    ) {
        ui.horizontal(|ui| {
            let is_favorite = state.favorites().is_favorite(&resolution.signature(), scope);
            let star = if is_favorite { FAVORITE_ON } else { FAVORITE_OFF };
            if ui.button(star).clicked() {
                let label = self.favorite_label.trim();
                actions.push(Action::ToggleFavorite {
                    resolution: *resolution,
                    monitor_id: scope.map(str::to_string),
                    label: (!label.is_empty() && !is_favorite).then(|| label.to_string()),
                });
                if !is_favorite {
                    self.favorite_label.clear();
                }
            }

            ui.label(resolution.menu_label());
            if state.catalog().is_custom(resolution) {
                ui.label(egui::RichText::new("custom").small().weak());
            }

            if let Some(id) = monitor_id {
                if ui.button("Apply").clicked() {
                    actions.push(Action::ApplyResolution {
                        monitor_id: id.to_string(),
                        resolution: *resolution,
                    });
                }
            }

            if state.catalog().is_custom(resolution) {
                if ui.button("Edit").clicked() {
                    self.form.begin_edit(*resolution);
                }
                if ui.button("Delete").clicked() {
                    actions.push(Action::RemoveCustom(*resolution));
                    if self.form.editing == Some(*resolution) {
                        self.form.reset();
                    }
                }
            }
        });
    }

    fn form_ui(&mut self, ui: &mut egui::Ui, actions: &mut Vec<Action>) {
        let title = match self.form.editing {
            Some(old) => format!("Edit {old}"),
            None => "Add custom resolution".to_string(),
        };
        ui.label(egui::RichText::new(title).strong());

        ui.horizontal(|ui| {
            ui.label("Width:");
            ui.add(egui::TextEdit::singleline(&mut self.form.width).desired_width(60.0));
            ui.label("Height:");
            ui.add(egui::TextEdit::singleline(&mut self.form.height).desired_width(60.0));
            ui.label("Hz:");
            ui.add(
                egui::TextEdit::singleline(&mut self.form.refresh_rate)
                    .desired_width(40.0)
                    .hint_text("any"),
            );
        });

        ui.horizontal(|ui| {
            let submit = if self.form.editing.is_some() { "Save" } else { "Add" };
            if ui.button(submit).clicked() {
                if let Some(action) = self.form.submit() {
                    actions.push(action);
                }
            }
            if self.form.editing.is_some() && ui.button("Cancel").clicked() {
                self.form.reset();
            }
        });

        if let Some(error) = &self.form.error {
            ui.colored_label(STATUS_STOPPED, error);
        }
    }
}
