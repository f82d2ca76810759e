//! Settings editor component for the application toggles

use eframe::egui;

use super::Action;
use crate::config::Settings;
use crate::gui::bridge::TrayStatus;

// Import constants from parent module
use super::super::constants::{ITEM_SPACING, SECTION_SPACING};

/// Renders the settings editor UI and pushes an action for each toggle the user flipped
pub fn ui(
    ui: &mut egui::Ui,
    settings: &Settings,
    tray: TrayStatus,
    config_dir: &str,
    backend: &str,
    actions: &mut Vec<Action>,
) {
    ui.group(|ui| {
        ui.label(egui::RichText::new("Settings").heading().strong());
        ui.add_space(ITEM_SPACING);

        let mut start_on_startup = settings.start_on_startup;
        if ui
            .checkbox(&mut start_on_startup, "Start on login")
            .on_hover_text("Add an autostart entry for the current user")
            .changed()
        {
            actions.push(Action::SetStartOnStartup(start_on_startup));
        }

        let mut use_last = settings.use_last_resolution;
        if ui
            .checkbox(&mut use_last, "Restore last resolution on start")
            .changed()
        {
            actions.push(Action::SetUseLastResolution(use_last));
        }

        let mut minimize = settings.minimize_to_tray;
        if ui
            .checkbox(&mut minimize, "Closing the window hides it to the tray")
            .changed()
        {
            actions.push(Action::SetMinimizeToTray(minimize));
        }
    });

    ui.add_space(SECTION_SPACING);

    ui.group(|ui| {
        ui.label(egui::RichText::new("Environment").strong());
        ui.add_space(ITEM_SPACING);
        ui.horizontal(|ui| {
            ui.colored_label(tray.color(), tray.label());
            let restartable = matches!(tray, TrayStatus::Exited(_) | TrayStatus::Disconnected);
            if restartable && ui.button("Restart tray").clicked() {
                actions.push(Action::RestartTray);
            }
        });
        ui.label(format!("Display backend: {backend}"));
        ui.label(format!("Configuration: {config_dir}"));
    });
}
