//! Manager window implemented with egui/eframe, paired with the `--tray` process

use std::time::Duration;

use anyhow::{Result, anyhow};
use eframe::{CreationContext, NativeOptions, egui};
use tracing::{info, warn};

use super::bridge::{TrayLaunch, TrayLink};
use super::components::monitors::MonitorPanel;
use super::components::resolutions::ResolutionPanel;
use super::components::{self, Action};
use super::constants::*;
use super::state::{ManagerState, NoticeLevel, WindowRequest};
use crate::autostart::Autostart;
use crate::config::ConfigStore;
use crate::display;
use crate::types::Resolution;

/// How the manager was started
pub struct ManagerOptions {
    pub store: ConfigStore,
    pub launch: TrayLaunch,
    /// False with --no-tray
    pub tray: bool,
}

struct ManagerApp {
    state: ManagerState,
    link: TrayLink,
    monitor_panel: MonitorPanel,
    resolution_panel: ResolutionPanel,
    /// Modes of the monitor they were listed for
    modes: Option<(String, Vec<Resolution>)>,
    allow_close: bool,
}

impl ManagerApp {
    fn new(cc: &CreationContext<'_>, options: ManagerOptions) -> Self {
        info!("Initializing egui manager");

        let backend = display::probe();
        let mut state = ManagerState::load(options.store, backend, Autostart::user());

        if state.settings().use_last_resolution {
            let restored = state.apply_last_resolution();
            if let Some(true) = state.report(restored) {
                info!("Restored last resolution");
            }
        }

        let link = if options.tray {
            TrayLink::start(options.launch, &cc.egui_ctx)
        } else {
            TrayLink::disabled()
        };

        Self {
            state,
            link,
            monitor_panel: MonitorPanel::new(),
            resolution_panel: ResolutionPanel::new(),
            modes: None,
            allow_close: false,
        }
    }

    fn process_tray_messages(&mut self, ctx: &egui::Context) {
        for message in self.link.poll() {
            match self.state.handle_tray_message(message, &mut self.link) {
                WindowRequest::None => {}
                WindowRequest::Show => {
                    info!("Show requested from tray menu");
                    ctx.send_viewport_cmd(egui::ViewportCommand::Visible(true));
                    ctx.send_viewport_cmd(egui::ViewportCommand::Focus);
                }
                WindowRequest::Quit => {
                    info!("Quit requested from tray menu");
                    self.allow_close = true;
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
            }
        }
    }

    /// Hide instead of closing while the tray can bring the window back
    fn intercept_close(&mut self, ctx: &egui::Context) {
        if !ctx.input(|i| i.viewport().close_requested()) || self.allow_close {
            return;
        }
        if self.state.settings().minimize_to_tray && self.link.is_connected() {
            info!("Hiding manager to tray");
            ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
            ctx.send_viewport_cmd(egui::ViewportCommand::Visible(false));
        }
    }

    fn modes_for(&mut self, monitor_id: &str) {
        if self.modes.as_ref().is_some_and(|(id, _)| id == monitor_id) {
            return;
        }
        let modes = self.state.available_modes(monitor_id);
        self.modes = Some((monitor_id.to_string(), modes));
    }

    fn handle_action(&mut self, action: Action, ctx: &egui::Context) {
        let state = &mut self.state;
        let link = &mut self.link;
        match action {
            Action::ApplyResolution {
                monitor_id,
                resolution,
            } => {
                let result = state.apply_resolution(&monitor_id, &resolution);
                if state.report(result).is_some() {
                    state.notify(NoticeLevel::Info, format!("Applied {resolution} to {monitor_id}"));
                }
            }
            Action::ApplySaved(monitor_id) => {
                let result = state.apply_saved_configuration(&monitor_id);
                state.report(result);
            }
            Action::ToggleFavorite {
                resolution,
                monitor_id,
                label,
            } => {
                let result = state.toggle_favorite(&resolution, monitor_id.as_deref(), label.as_deref(), link);
                state.report(result);
            }
            Action::SetLabel { monitor_id, label } => {
                let result = state.set_label(&monitor_id, &label, link);
                state.report(result);
            }
            Action::ClearLabel(monitor_id) => {
                let result = state.clear_label(&monitor_id, link);
                state.report(result);
            }
            Action::AddCustom(resolution) => {
                let result = state.add_custom(resolution);
                state.report(result);
            }
            Action::RemoveCustom(resolution) => {
                let result = state.remove_custom(&resolution, link);
                state.report(result);
            }
            Action::EditCustom { old, new } => {
                let result = state.edit_custom(&old, new, link);
                state.report(result);
            }
            Action::SetUseLastResolution(enabled) => {
                let result = state.set_use_last_resolution(enabled);
                state.report(result);
            }
            Action::SetMinimizeToTray(enabled) => {
                let result = state.set_minimize_to_tray(enabled);
                state.report(result);
            }
            Action::SetStartOnStartup(enabled) => {
                let result = state.set_start_on_startup(enabled);
                state.report(result);
            }
            Action::RefreshMonitors => {
                state.refresh_monitors();
                self.modes = None;
            }
            Action::RestartTray => {
                warn!("Tray restart requested from UI");
                link.restart(ctx);
            }
        }
    }

    fn notices_ui(&mut self, ui: &mut egui::Ui) {
        if self.state.notices().is_empty() {
            return;
        }
        // Most recent last, a handful at most
        let skip = self.state.notices().len().saturating_sub(4);
        for notice in &self.state.notices()[skip..] {
            let color = match notice.level {
                NoticeLevel::Info => STATUS_RUNNING,
                NoticeLevel::Warning => NOTICE_WARNING,
                NoticeLevel::Error => STATUS_STOPPED,
            };
            ui.colored_label(color, &notice.text);
        }
        if ui.small_button("Dismiss").clicked() {
            self.state.dismiss_notices();
        }
    }
}

impl eframe::App for ManagerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_tray_messages(ctx);
        self.intercept_close(ctx);

        let selected = self.monitor_panel.selected(&self.state).map(str::to_string);
        if let Some(id) = &selected {
            self.modes_for(id);
        }

        let mut actions = Vec::new();

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.add_space(ITEM_SPACING);
            ui.horizontal(|ui| {
                let status = self.link.status();
                ui.colored_label(status.color(), status.label());
                if let Some(pid) = self.link.child_pid() {
                    ui.label(format!("PID: {pid}"));
                }
            });
            self.notices_ui(ui);
            ui.add_space(ITEM_SPACING);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.heading("Resolution Manager");
                ui.add_space(SECTION_SPACING);

                let modes = self.modes.as_ref().map(|(_, m)| m.as_slice()).unwrap_or_default();
                self.monitor_panel.ui(ui, &self.state, modes, &mut actions);

                if let Some(id) = &selected {
                    ui.add_space(SECTION_SPACING);
                    components::favorites::ui(ui, &self.state, id, &mut actions);
                }

                ui.add_space(SECTION_SPACING);
                self.resolution_panel
                    .ui(ui, &self.state, selected.as_deref(), &mut actions);

                ui.add_space(SECTION_SPACING);
                let config_dir = self.state.config_dir().display().to_string();
                components::settings_editor::ui(
                    ui,
                    self.state.settings(),
                    self.link.status(),
                    &config_dir,
                    self.state.backend_name(),
                    &mut actions,
                );
            });
        });

        for action in actions {
            self.handle_action(action, ctx);
        }

        ctx.request_repaint_after(Duration::from_millis(TRAY_CHECK_INTERVAL_MS));
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.link.stop();
        info!("Manager exiting");
    }
}

pub fn run_manager(options: ManagerOptions) -> Result<()> {
    let native = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([WINDOW_WIDTH, WINDOW_HEIGHT])
            .with_min_inner_size([WINDOW_MIN_WIDTH, WINDOW_MIN_HEIGHT])
            .with_title("Resolution Manager")
            .with_app_id(crate::constants::config::APP_DIR),
        ..Default::default()
    };

    eframe::run_native(
        "Resolution Manager",
        native,
        Box::new(|cc| Ok(Box::new(ManagerApp::new(cc, options)))),
    )
    .map_err(|err| anyhow!("Failed to launch egui manager: {err}"))
}
