use eframe::egui;

use super::Action;
use crate::favorites::FavoriteEntry;
use crate::gui::constants::*;
use crate::gui::state::ManagerState;

/// Favorites that apply to the selected monitor, scoped ones first
pub fn ui(ui: &mut egui::Ui, state: &ManagerState, monitor_id: &str, actions: &mut Vec<Action>) {
    let (scoped, global) = state.favorites_for_monitor(monitor_id);

    ui.group(|ui| {
        ui.label(egui::RichText::new("Favorites").strong());
        ui.add_space(ITEM_SPACING);

        ui.label(egui::RichText::new("This monitor").italics());
        if scoped.is_empty() {
            ui.label("No favorites for this monitor yet.");
        }
        for entry in scoped {
            entry_row(ui, entry, monitor_id, actions);
        }

        ui.add_space(ITEM_SPACING);
        ui.label(egui::RichText::new("All monitors").italics());
        if global.is_empty() {
            ui.label("No global favorites yet.");
        }
        for entry in global {
            entry_row(ui, entry, monitor_id, actions);
        }

        if !state.recent().is_empty() {
            ui.add_space(ITEM_SPACING);
            ui.horizontal_wrapped(|ui| {
                ui.label(egui::RichText::new("Recent:").italics());
                for resolution in state.recent() {
                    if ui.small_button(resolution.to_string()).clicked() {
                        actions.push(Action::ApplyResolution {
                            monitor_id: monitor_id.to_string(),
                            resolution: *resolution,
                        });
                    }
                }
            });
        }
    });
}

fn entry_row(ui: &mut egui::Ui, entry: &FavoriteEntry, monitor_id: &str, actions: &mut Vec<Action>) {
    // Entries are validated when loaded
    let Some(resolution) = entry.parsed() else {
        return;
    };
    ui.horizontal(|ui| {
        if ui.button(FAVORITE_ON).on_hover_text("Remove favorite").clicked() {
            actions.push(Action::ToggleFavorite {
                resolution,
                monitor_id: entry.monitor_id.clone(),
                label: None,
            });
        }
        match &entry.label {
            Some(label) => ui.label(format!("{label} ({})", resolution.menu_label())),
            None => ui.label(resolution.menu_label()),
        };
        if ui.button("Apply").clicked() {
            actions.push(Action::ApplyResolution {
                monitor_id: monitor_id.to_string(),
                resolution,
            });
        }
    });
}
