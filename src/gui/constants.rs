//! GUI-specific constants for layout, status colors and intervals

use egui;

/// Manager window dimensions
pub const WINDOW_WIDTH: f32 = 720.0;
pub const WINDOW_HEIGHT: f32 = 760.0;
pub const WINDOW_MIN_WIDTH: f32 = 560.0;
pub const WINDOW_MIN_HEIGHT: f32 = 520.0;

/// Layout spacing
pub const SECTION_SPACING: f32 = 15.0;
pub const ITEM_SPACING: f32 = 8.0;

/// Status colors
pub const STATUS_RUNNING: egui::Color32 = egui::Color32::from_rgb(0, 200, 0);
pub const STATUS_STOPPED: egui::Color32 = egui::Color32::from_rgb(200, 0, 0);
pub const STATUS_STARTING: egui::Color32 = egui::Color32::from_rgb(200, 200, 0);
pub const NOTICE_WARNING: egui::Color32 = egui::Color32::from_rgb(220, 160, 0);

/// Marker drawn next to favorited resolutions
pub const FAVORITE_ON: &str = "\u{2605}";
pub const FAVORITE_OFF: &str = "\u{2606}";

/// Tray process monitoring
pub const TRAY_CHECK_INTERVAL_MS: u64 = 500;

/// Time the tray gets to exit after Shutdown before it is sent SIGTERM
pub const TRAY_EXIT_GRACE_MS: u64 = 1500;
