//! Manager window panels. Each panel renders from `ManagerState` and reports what
//! the user asked for as an [`Action`]; the app applies it.

pub mod favorites;
pub mod monitors;
pub mod resolutions;
pub mod settings_editor;

use crate::types::Resolution;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    ApplyResolution {
        monitor_id: String,
        resolution: Resolution,
    },
    ApplySaved(String),
    ToggleFavorite {
        resolution: Resolution,
        monitor_id: Option<String>,
        label: Option<String>,
    },
    SetLabel {
        monitor_id: String,
        label: String,
    },
    ClearLabel(String),
    AddCustom(Resolution),
    RemoveCustom(Resolution),
    EditCustom {
        old: Resolution,
        new: Resolution,
    },
    SetUseLastResolution(bool),
    SetMinimizeToTray(bool),
    SetStartOnStartup(bool),
    RefreshMonitors,
    RestartTray,
}
