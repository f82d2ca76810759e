//! Manager window: egui front end over [`state::ManagerState`], with the tray
//! process attached through [`bridge::TrayLink`]

mod bridge;
mod components;
mod constants;
mod manager;
mod state;

pub use bridge::TrayLaunch;
pub use manager::{ManagerOptions, run_manager};
