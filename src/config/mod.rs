//! Configuration management for Resolution Manager
//!
//! One JSON document per concern, all under a single per-user directory:
//! - **settings**: behavior toggles and log level
//! - **store**: typed, fail-safe access to every document
//! - **saved**: last/per-monitor/recent resolution records

pub mod saved;
pub mod settings;
pub mod store;

// Re-export commonly used types
pub use saved::{LastResolution, MonitorConfig, RecentResolutions};
pub use settings::Settings;
pub use store::{ConfigFile, ConfigStore};
