//! Records of applied resolutions: the last one (for restore on startup), one per
//! monitor, and a short in-memory recent list.

use serde::{Deserialize, Serialize};

use crate::constants::config::PLACEHOLDER_LAST_RESOLUTION;
use crate::constants::resolutions::RECENT_LIMIT;
use crate::error::ManagerResult;
use crate::types::Resolution;

/// Contents of lastResolution.json
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastResolution {
    /// Empty in the placeholder written on first run
    #[serde(default)]
    pub monitor: String,
    /// `WxH`; the refresh rate lives in its own field
    pub resolution: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_rate: Option<u32>,
}

impl LastResolution {
    pub fn new(monitor: &str, resolution: &Resolution) -> Self {
        Self {
            monitor: monitor.to_string(),
            resolution: format!("{}x{}", resolution.width, resolution.height),
            refresh_rate: resolution.refresh_rate,
        }
    }

    pub fn placeholder() -> Self {
        Self {
            monitor: String::new(),
            resolution: PLACEHOLDER_LAST_RESOLUTION.to_string(),
            refresh_rate: None,
        }
    }

    /// True for the first-run record that names no monitor
    pub fn is_placeholder(&self) -> bool {
        self.monitor.is_empty()
    }

    pub fn to_resolution(&self) -> ManagerResult<Resolution> {
        let base = Resolution::from_signature(&self.resolution)?;
        Resolution::new(base.width, base.height, self.refresh_rate.or(base.refresh_rate))
    }
}

/// One entry of monitorConfigurations.json
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorConfig {
    pub id: String,
    pub width: u32,
    pub height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_rate: Option<u32>,
    /// Epoch milliseconds
    pub timestamp: i64,
}

impl MonitorConfig {
    pub fn new(monitor_id: &str, resolution: &Resolution) -> Self {
        Self {
            id: monitor_id.to_string(),
            width: resolution.width,
            height: resolution.height,
            refresh_rate: resolution.refresh_rate,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn resolution(&self) -> ManagerResult<Resolution> {
        Resolution::new(self.width, self.height, self.refresh_rate)
    }
}

/// Most-recent-first list of applied resolutions, without duplicates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecentResolutions {
    entries: Vec<Resolution>,
}

impl RecentResolutions {
    pub fn push(&mut self, resolution: Resolution) {
        self.entries.retain(|r| *r != resolution);
        self.entries.insert(0, resolution);
        self.entries.truncate(RECENT_LIMIT);
    }

    pub fn entries(&self) -> &[Resolution] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn res(width: u32, height: u32, refresh: Option<u32>) -> Resolution {
        Resolution::new(width, height, refresh).unwrap()
    }

    #[test]
    fn test_last_resolution_round_trips_refresh() {
        let last = LastResolution::new("DP-1", &res(2560, 1440, Some(144)));
        assert_eq!(last.resolution, "2560x1440");
        assert_eq!(last.to_resolution().unwrap(), res(2560, 1440, Some(144)));
    }

    #[test]
    fn test_last_resolution_file_shape() {
        let last: LastResolution =
            serde_json::from_str(r#"{"monitor":"0","resolution":"1920x1080","refreshRate":60}"#)
                .unwrap();
        assert_eq!(last.monitor, "0");
        assert_eq!(last.to_resolution().unwrap(), res(1920, 1080, Some(60)));
    }

    #[test]
    fn test_placeholder() {
        let last = LastResolution::placeholder();
        assert!(last.is_placeholder());
        assert_eq!(last.to_resolution().unwrap(), res(1920, 1080, None));
    }

    #[test]
    fn test_monitor_config_resolution() {
        let config = MonitorConfig::new("HDMI-1", &res(1280, 720, None));
        assert_eq!(config.resolution().unwrap(), res(1280, 720, None));
        assert!(config.timestamp > 0);
    }

    #[test]
    fn test_recent_moves_existing_to_front() {
        let mut recent = RecentResolutions::default();
        recent.push(res(1920, 1080, None));
        recent.push(res(1280, 720, None));
        recent.push(res(1920, 1080, None));

        assert_eq!(recent.entries(), &[res(1920, 1080, None), res(1280, 720, None)]);
    }

    #[test]
    fn test_recent_is_capped() {
        let mut recent = RecentResolutions::default();
        for width in 1000..1010 {
            recent.push(res(width, 700, None));
        }
        assert_eq!(recent.entries().len(), RECENT_LIMIT);
        assert_eq!(recent.entries()[0].width, 1009);
    }
}
