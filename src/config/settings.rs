//! User-facing application settings (settings.json)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Launch the manager at login (XDG autostart entry)
    #[serde(default, alias = "startOnBoot")]
    pub start_on_startup: bool,

    /// Re-apply lastResolution.json when the manager starts
    #[serde(default)]
    pub use_last_resolution: bool,

    /// Closing the manager window hides it while the tray keeps running
    #[serde(default)]
    pub minimize_to_tray: bool,

    /// Log level used when neither --log-level nor LOG_LEVEL is set
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            start_on_startup: false,
            use_last_resolution: false,
            minimize_to_tray: false,
            log_level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_keys_use_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"useLastResolution": true}"#).unwrap();
        assert!(settings.use_last_resolution);
        assert!(!settings.minimize_to_tray);
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    fn test_start_on_boot_alias() {
        let settings: Settings = serde_json::from_str(r#"{"startOnBoot": true}"#).unwrap();
        assert!(settings.start_on_startup);
    }

    #[test]
    fn test_camel_case_keys() {
        let json = serde_json::to_value(Settings::default()).unwrap();
        assert!(json.get("startOnStartup").is_some());
        assert!(json.get("useLastResolution").is_some());
        assert!(json.get("minimizeToTray").is_some());
    }
}
