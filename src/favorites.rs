//! Favorite resolutions, optionally scoped to a monitor
//!
//! An entry is identified by the pair (signature, monitor id or none). Scoping is
//! exact-match: a global favorite and a favorite for monitor "0" with the same
//! signature are independent toggles, and neither satisfies a lookup for the other.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ManagerError, ManagerResult};
use crate::types::{Resolution, canonical_signature, is_valid_signature};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteEntry {
    /// `WxH` or `WxH@R`
    pub resolution: String,
    /// Absent for a global favorite
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monitor_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl FavoriteEntry {
    pub fn new(resolution: &Resolution, monitor_id: Option<&str>, label: Option<&str>) -> Self {
        Self {
            resolution: resolution.signature(),
            monitor_id: non_empty(monitor_id),
            label: non_empty(label),
        }
    }

    pub fn is_valid(&self) -> bool {
        is_valid_signature(&self.resolution)
    }

    pub fn parsed(&self) -> Option<Resolution> {
        Resolution::from_signature(&self.resolution).ok()
    }

    pub fn is_global(&self) -> bool {
        self.monitor_id.is_none()
    }

    fn matches(&self, signature: &str, monitor_id: Option<&str>) -> bool {
        self.resolution == signature && self.monitor_id.as_deref() == monitor_id
    }

    fn same_pair(&self, other: &FavoriteEntry) -> bool {
        self.matches(&other.resolution, other.monitor_id.as_deref())
    }
}

/// Outcome of a toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggled {
    Added,
    Removed,
}

#[derive(Debug, Clone, Default)]
pub struct FavoriteRegistry {
    entries: Vec<FavoriteEntry>,
}

impl FavoriteRegistry {
    /// Build from untrusted entries. Signatures are rewritten to their canonical
    /// form. Returns the registry and the number of entries that were dropped
    /// (invalid signature or duplicate pair).
    pub fn from_entries(entries: Vec<FavoriteEntry>) -> (Self, usize) {
        let total = entries.len();
        let mut registry = Self {
            entries: Vec::with_capacity(total),
        };
        for mut entry in entries {
            entry.monitor_id = non_empty(entry.monitor_id.as_deref());
            entry.label = non_empty(entry.label.as_deref());
            let Some(signature) = canonical_signature(&entry.resolution) else {
                warn!(resolution = %entry.resolution, "Dropping invalid favorite");
                continue;
            };
            entry.resolution = signature;
            if registry.entries.iter().any(|e| e.same_pair(&entry)) {
                warn!(resolution = %entry.resolution, monitor = ?entry.monitor_id, "Dropping duplicate favorite");
                continue;
            }
            registry.entries.push(entry);
        }
        let dropped = total - registry.entries.len();
        (registry, dropped)
    }

    /// Add the (signature, monitor) pair if absent, remove it if present
    pub fn toggle(
        &mut self,
        signature: &str,
        monitor_id: Option<&str>,
        label: Option<&str>,
    ) -> ManagerResult<Toggled> {
        let signature = canonical(signature)?;
        let signature = signature.as_str();
        let monitor_id = non_empty(monitor_id);
        self.purge_invalid();

        let outcome = match self
            .entries
            .iter()
            .position(|e| e.matches(signature, monitor_id.as_deref()))
        {
            Some(idx) => {
                self.entries.remove(idx);
                Toggled::Removed
            }
            None => {
                self.entries.push(FavoriteEntry {
                    resolution: signature.to_string(),
                    monitor_id: monitor_id.clone(),
                    label: non_empty(label),
                });
                Toggled::Added
            }
        };
        info!(resolution = %signature, monitor = ?monitor_id, outcome = ?outcome, "Toggled favorite");
        Ok(outcome)
    }

    pub fn is_favorite(&self, signature: &str, monitor_id: Option<&str>) -> bool {
        self.get(signature, monitor_id).is_some()
    }

    pub fn get(&self, signature: &str, monitor_id: Option<&str>) -> Option<&FavoriteEntry> {
        let signature = canonical_signature(signature)?;
        self.entries.iter().find(|e| e.matches(&signature, monitor_id))
    }

    /// Entries whose scope is exactly `monitor_id` (`None` = global entries only)
    pub fn list_for(&self, monitor_id: Option<&str>) -> Vec<&FavoriteEntry> {
        self.entries
            .iter()
            .filter(|e| e.monitor_id.as_deref() == monitor_id)
            .collect()
    }

    /// Every entry regardless of scope
    pub fn all(&self) -> &[FavoriteEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Rewrite every entry using `old` to `new`. Entries whose rewritten pair
    /// already exists are dropped in favor of the existing one.
    pub fn rename_signature(&mut self, old: &str, new: &str) -> ManagerResult<usize> {
        let new = canonical(new)?;
        let old = canonical_signature(old).unwrap_or_else(|| old.to_string());
        let mut renamed = 0;
        let mut kept: Vec<FavoriteEntry> = Vec::with_capacity(self.entries.len());
        let (moving, staying): (Vec<_>, Vec<_>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|e| e.resolution == old);
        kept.extend(staying);
        for mut entry in moving {
            entry.resolution = new.clone();
            if kept.iter().any(|e| e.same_pair(&entry)) {
                continue;
            }
            kept.push(entry);
            renamed += 1;
        }
        self.entries = kept;
        self.purge_invalid();
        Ok(renamed)
    }

    /// Drop every entry for `signature`, whatever its scope
    pub fn remove_signature(&mut self, signature: &str) -> usize {
        let signature = canonical_signature(signature).unwrap_or_else(|| signature.to_string());
        let before = self.entries.len();
        self.entries.retain(|e| e.resolution != signature);
        self.purge_invalid();
        before - self.entries.len()
    }

    fn purge_invalid(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(FavoriteEntry::is_valid);
        let dropped = before - self.entries.len();
        if dropped > 0 {
            warn!(dropped, "Purged invalid favorites");
        }
        dropped
    }
}

fn canonical(signature: &str) -> ManagerResult<String> {
    canonical_signature(signature).ok_or_else(|| {
        ManagerError::validation(format!("'{signature}' is not a resolution signature"))
    })
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(resolution: &str, monitor_id: Option<&str>) -> FavoriteEntry {
        FavoriteEntry {
            resolution: resolution.to_string(),
            monitor_id: monitor_id.map(str::to_string),
            label: None,
        }
    }

    #[test]
    fn test_toggle_twice_restores_original_set() {
        let (mut registry, _) = FavoriteRegistry::from_entries(vec![entry("1280x720", None)]);
        let original = registry.all().to_vec();

        assert_eq!(registry.toggle("1920x1080", Some("0"), None).unwrap(), Toggled::Added);
        assert_eq!(registry.toggle("1920x1080", Some("0"), None).unwrap(), Toggled::Removed);
        assert_eq!(registry.all(), original.as_slice());
    }

    #[test]
    fn test_signatures_are_stored_canonical() {
        let mut registry = FavoriteRegistry::default();
        registry.toggle("01920x1080", None, None).unwrap();
        registry.toggle("1280x720@0", Some("0"), None).unwrap();

        assert_eq!(registry.all()[0].resolution, "1920x1080");
        assert_eq!(registry.all()[1].resolution, "1280x720");
        assert!(registry.is_favorite("1920x1080", None));
        assert!(registry.is_favorite("1280x720", Some("0")));

        // the same pair spelled differently toggles the existing entry off
        assert_eq!(registry.toggle("1920x1080@0", None, None).unwrap(), Toggled::Removed);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_from_entries_canonicalizes_and_dedups() {
        let (registry, dropped) = FavoriteRegistry::from_entries(vec![
            entry("01920x01080", Some("0")),
            entry("1920x1080@0", Some("0")),
            entry("2560x1440@144", None),
        ]);

        assert_eq!(dropped, 1);
        assert_eq!(
            registry.all(),
            &[entry("1920x1080", Some("0")), entry("2560x1440@144", None)]
        );
    }

    #[test]
    fn test_signature_identity_independent_favorites() {
        let mut registry = FavoriteRegistry::default();
        registry.toggle("1920x1080", None, None).unwrap();

        assert!(registry.is_favorite("1920x1080", None));
        assert!(!registry.is_favorite("1920x1080@60", None));

        registry.toggle("1920x1080@60", None, None).unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_scoping_is_exact_match() {
        let mut registry = FavoriteRegistry::default();
        registry.toggle("1920x1080", None, None).unwrap();

        assert!(!registry.is_favorite("1920x1080", Some("monitor-1")));

        registry.toggle("1920x1080", Some("monitor-1"), None).unwrap();
        registry.toggle("1920x1080", None, None).unwrap();
        assert!(registry.is_favorite("1920x1080", Some("monitor-1")));
        assert!(!registry.is_favorite("1920x1080", None));
    }

    #[test]
    fn test_list_for_and_all() {
        let mut registry = FavoriteRegistry::default();
        registry.toggle("1920x1080", Some("0"), None).unwrap();
        registry.toggle("1280x720", None, Some("Presenting")).unwrap();

        let scoped = registry.list_for(Some("0"));
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].resolution, "1920x1080");
        assert_eq!(scoped[0].monitor_id.as_deref(), Some("0"));

        let global = registry.list_for(None);
        assert_eq!(global.len(), 1);
        assert_eq!(global[0].label.as_deref(), Some("Presenting"));

        assert_eq!(registry.all().len(), 2);
    }

    #[test]
    fn test_self_healing_filter() {
        let (registry, dropped) = FavoriteRegistry::from_entries(vec![
            entry("abcx123", None),
            entry("1920x1080@60", None),
        ]);
        assert_eq!(dropped, 1);
        assert_eq!(registry.all(), &[entry("1920x1080@60", None)]);
    }

    #[test]
    fn test_duplicate_pairs_collapse_on_load() {
        let (registry, dropped) = FavoriteRegistry::from_entries(vec![
            entry("1920x1080", Some("0")),
            entry("1920x1080", Some("0")),
            entry("1920x1080", None),
        ]);
        assert_eq!(dropped, 1);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_empty_monitor_id_means_global() {
        let (registry, _) = FavoriteRegistry::from_entries(vec![entry("1920x1080", Some(""))]);
        assert!(registry.is_favorite("1920x1080", None));
    }

    #[test]
    fn test_toggle_rejects_invalid_signature() {
        let mut registry = FavoriteRegistry::default();
        let err = registry.toggle("widex1080", None, None).unwrap_err();
        assert!(matches!(err, ManagerError::Validation(_)));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_toggle_stores_label() {
        let mut registry = FavoriteRegistry::default();
        registry.toggle("2560x1440@144", Some("DP-1"), Some("  Gaming ")).unwrap();
        let stored = registry.get("2560x1440@144", Some("DP-1")).unwrap();
        assert_eq!(stored.label.as_deref(), Some("Gaming"));
    }

    #[test]
    fn test_rename_signature_across_scopes() {
        let (mut registry, _) = FavoriteRegistry::from_entries(vec![
            entry("2560x1440", None),
            entry("2560x1440", Some("0")),
            entry("1920x1080", None),
        ]);
        let renamed = registry.rename_signature("2560x1440", "2560x1440@165").unwrap();

        assert_eq!(renamed, 2);
        assert!(registry.is_favorite("2560x1440@165", None));
        assert!(registry.is_favorite("2560x1440@165", Some("0")));
        assert!(!registry.is_favorite("2560x1440", None));
    }

    #[test]
    fn test_rename_signature_keeps_existing_on_collision() {
        let (mut registry, _) = FavoriteRegistry::from_entries(vec![
            entry("2560x1440", None),
            entry("2560x1440@165", None),
        ]);
        registry.rename_signature("2560x1440", "2560x1440@165").unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove_signature() {
        let (mut registry, _) = FavoriteRegistry::from_entries(vec![
            entry("2560x1440", None),
            entry("2560x1440", Some("0")),
            entry("1920x1080", None),
        ]);
        assert_eq!(registry.remove_signature("2560x1440"), 2);
        assert_eq!(registry.all(), &[entry("1920x1080", None)]);
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_string(&entry("1920x1080", Some("0"))).unwrap();
        assert_eq!(json, r#"{"resolution":"1920x1080","monitorId":"0"}"#);
    }
}
