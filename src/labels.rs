//! User-chosen display names for monitors

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ManagerError, ManagerResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorLabel {
    /// Monitor identifier
    pub id: String,
    pub label: String,
}

/// At most one label per monitor. "No label" is the absence of an entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitorLabelMap {
    labels: Vec<MonitorLabel>,
}

impl MonitorLabelMap {
    /// Build from untrusted entries; blank labels and repeated ids are skipped
    pub fn from_entries(entries: Vec<MonitorLabel>) -> Self {
        let mut map = Self::default();
        for entry in entries {
            let label = entry.label.trim();
            if entry.id.is_empty() || label.is_empty() {
                warn!(monitor = %entry.id, "Skipping blank monitor label");
                continue;
            }
            if map.label_for(&entry.id).is_some() {
                warn!(monitor = %entry.id, "Skipping duplicate monitor label");
                continue;
            }
            map.labels.push(MonitorLabel {
                id: entry.id,
                label: label.to_string(),
            });
        }
        map
    }

    /// Insert or update the label for `monitor_id`
    pub fn set_label(&mut self, monitor_id: &str, label: &str) -> ManagerResult<()> {
        let label = label.trim();
        if monitor_id.is_empty() {
            return Err(ManagerError::validation("monitor id is required"));
        }
        if label.is_empty() {
            return Err(ManagerError::validation("label cannot be empty"));
        }
        match self.labels.iter_mut().find(|l| l.id == monitor_id) {
            Some(existing) => existing.label = label.to_string(),
            None => self.labels.push(MonitorLabel {
                id: monitor_id.to_string(),
                label: label.to_string(),
            }),
        }
        info!(monitor = %monitor_id, label = %label, "Set monitor label");
        Ok(())
    }

    /// Remove the label for `monitor_id`
    pub fn clear_label(&mut self, monitor_id: &str) -> ManagerResult<()> {
        let before = self.labels.len();
        self.labels.retain(|l| l.id != monitor_id);
        if self.labels.len() == before {
            return Err(ManagerError::not_found(format!("label for monitor {monitor_id}")));
        }
        info!(monitor = %monitor_id, "Cleared monitor label");
        Ok(())
    }

    pub fn label_for(&self, monitor_id: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|l| l.id == monitor_id)
            .map(|l| l.label.as_str())
    }

    /// Label if present, else the caller-supplied fallback
    pub fn display_name_for<'a>(&'a self, monitor_id: &str, fallback: &'a str) -> &'a str {
        self.label_for(monitor_id).unwrap_or(fallback)
    }

    pub fn entries(&self) -> &[MonitorLabel] {
        &self.labels
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
