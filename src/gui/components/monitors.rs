use eframe::egui;

use super::Action;
use crate::gui::constants::*;
use crate::gui::state::ManagerState;
use crate::types::{Monitor, Resolution};

/// Monitor selector, label editor and the selected monitor's mode list
pub struct MonitorPanel {
    selected: Option<String>,
    label_draft: String,
    /// Monitor the draft was loaded for
    draft_for: Option<String>,
}

impl MonitorPanel {
    pub fn new() -> Self {
        Self {
            selected: None,
            label_draft: String::new(),
            draft_for: None,
        }
    }

    /// Selected monitor id, defaulting to the primary monitor
    pub fn selected<'a>(&'a mut self, state: &ManagerState) -> Option<&'a str> {
        let still_present = self
            .selected
            .as_ref()
            .is_some_and(|id| state.monitors().iter().any(|m| &m.id == id));
        if !still_present {
            self.selected = state.primary_monitor().map(|m| m.id.clone());
        }
        self.selected.as_deref()
    }

    pub fn ui(
        &mut self,
        ui: &mut egui::Ui,
        state: &ManagerState,
        modes: &[Resolution],
        actions: &mut Vec<Action>,
    ) {
        let Some(selected) = self.selected(state).map(str::to_string) else {
            ui.group(|ui| {
                ui.label(egui::RichText::new("Monitors").strong());
                ui.label("No monitors detected.");
                if ui.button("\u{1F504} Refresh").clicked() {
                    actions.push(Action::RefreshMonitors);
                }
            });
            return;
        };
        if self.draft_for.as_deref() != Some(selected.as_str()) {
            self.label_draft = state.labels().label_for(&selected).unwrap_or_default().to_string();
            self.draft_for = Some(selected.clone());
        }

        ui.group(|ui| {
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new("Monitor:").strong());
                let current = state
                    .monitors()
                    .iter()
                    .find(|m| m.id == selected)
                    .map(|m| state.monitor_display_name(m))
                    .unwrap_or_else(|| selected.clone());
                egui::ComboBox::from_id_salt("monitor_selector")
                    .selected_text(current)
                    .show_ui(ui, |ui| {
                        for monitor in state.monitors() {
                            let text = format!("{} ({})", state.monitor_display_name(monitor), monitor.id);
                            ui.selectable_value(&mut self.selected, Some(monitor.id.clone()), text);
                        }
                    });
                if ui.button("\u{1F504} Refresh").clicked() {
                    actions.push(Action::RefreshMonitors);
                }
            });

            if let Some(monitor) = state.monitors().iter().find(|m| m.id == selected) {
                ui.add_space(ITEM_SPACING);
                monitor_details(ui, state, monitor, actions);
            }

            ui.add_space(ITEM_SPACING);
            ui.horizontal(|ui| {
                ui.label("Label:");
                ui.text_edit_singleline(&mut self.label_draft);
                if ui.button("Save").clicked() {
                    actions.push(Action::SetLabel {
                        monitor_id: selected.clone(),
                        label: self.label_draft.clone(),
                    });
                }
                let has_label = state.labels().label_for(&selected).is_some();
                if ui.add_enabled(has_label, egui::Button::new("Clear")).clicked() {
                    self.label_draft.clear();
                    actions.push(Action::ClearLabel(selected.clone()));
                }
            });
        });

        ui.add_space(SECTION_SPACING);
        mode_list(ui, state, &selected, modes, actions);
    }
}

fn monitor_details(ui: &mut egui::Ui, state: &ManagerState, monitor: &Monitor, actions: &mut Vec<Action>) {
    ui.label(format!("System name: {}", monitor.system_name()));
    match &monitor.current_mode {
        Some(mode) => ui.label(format!(
            "Current mode: {}x{} @ {}Hz at ({}, {})",
            mode.width, mode.height, mode.refresh_rate, mode.x, mode.y
        )),
        None => ui.label("Current mode: inactive"),
    };

    if let Some(saved) = state.saved_config(&monitor.id) {
        ui.horizontal(|ui| {
            let when = chrono::DateTime::from_timestamp_millis(saved.timestamp)
                .map(|t| t.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default();
            let mode = saved
                .resolution()
                .map(|r| r.to_string())
                .unwrap_or_else(|_| "invalid".to_string());
            ui.label(format!("Saved: {mode} ({when})"));
            if ui.button("Restore").clicked() {
                actions.push(Action::ApplySaved(monitor.id.clone()));
            }
        });
    }
}

fn mode_list(
    ui: &mut egui::Ui,
    state: &ManagerState,
    monitor_id: &str,
    modes: &[Resolution],
    actions: &mut Vec<Action>,
) {
    ui.group(|ui| {
        ui.label(egui::RichText::new("Supported Modes").strong());
        if modes.is_empty() {
            ui.label("The display backend reported no modes for this monitor.");
            return;
        }
        egui::ScrollArea::vertical()
            .id_salt("mode_list")
            .max_height(180.0)
            .show(ui, |ui| {
                for mode in modes {
                    ui.horizontal(|ui| {
                        let signature = mode.signature();
                        let is_favorite = state.favorites().is_favorite(&signature, Some(monitor_id));
                        let star = if is_favorite { FAVORITE_ON } else { FAVORITE_OFF };
                        if ui
                            .button(star)
                            .on_hover_text("Favorite for this monitor")
                            .clicked()
                        {
                            actions.push(Action::ToggleFavorite {
                                resolution: *mode,
                                monitor_id: Some(monitor_id.to_string()),
                                label: None,
                            });
                        }
                        ui.label(mode.menu_label());
                        if ui.button("Apply").clicked() {
                            actions.push(Action::ApplyResolution {
                                monitor_id: monitor_id.to_string(),
                                resolution: *mode,
                            });
                        }
                    });
                }
            });
    });
}
