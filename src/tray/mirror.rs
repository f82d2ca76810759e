//! The tray's copy of the manager's favorites and labels

use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::config::ConfigStore;
use crate::favorites::{FavoriteEntry, FavoriteRegistry};
use crate::ipc::ManagerMessage;
use crate::labels::MonitorLabelMap;

/// Lifecycle of the tray menu's data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceState {
    Uninitialized,
    Loading,
    Ready,
}

/// What the event loop should do after a message was applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorUpdate {
    Unchanged,
    Rebuild,
    Shutdown,
}

/// Favorites sharing a scope, as shown in one submenu
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FavoriteGroup {
    pub title: String,
    /// `None` for the global group
    pub monitor_id: Option<String>,
    pub entries: Vec<FavoriteEntry>,
}

/// Owned by the tray object. Created empty, loaded from disk, then kept current by
/// manager pushes until disposed.
#[derive(Debug)]
pub struct MirrorState {
    state: SurfaceState,
    favorites: FavoriteRegistry,
    labels: MonitorLabelMap,
}

impl Default for MirrorState {
    fn default() -> Self {
        Self::new()
    }
}

impl MirrorState {
    pub fn new() -> Self {
        Self {
            state: SurfaceState::Uninitialized,
            favorites: FavoriteRegistry::default(),
            labels: MonitorLabelMap::default(),
        }
    }

    /// Read-only load of the persisted sets, used until the manager connects.
    /// Unreadable files leave the mirror ready and empty.
    pub fn bootstrap(&mut self, store: &ConfigStore) {
        self.state = SurfaceState::Loading;
        let (entries, skipped) = store.load_favorites();
        let (favorites, dropped) = FavoriteRegistry::from_entries(entries);
        if skipped + dropped > 0 {
            warn!(skipped, dropped, "Ignored invalid favorites during tray bootstrap");
        }
        self.favorites = favorites;
        self.labels = MonitorLabelMap::from_entries(store.load_labels());
        self.state = SurfaceState::Ready;
        info!(
            favorites = self.favorites.len(),
            labels = self.labels.entries().len(),
            "Tray mirror bootstrapped from disk"
        );
    }

    /// A manager connected and was asked for its sets
    pub fn begin_pull(&mut self) {
        self.state = SurfaceState::Loading;
    }

    /// The pull will not be answered. Keeps whatever the mirror holds and returns
    /// whether the surface changed.
    pub fn fail_pull(&mut self) -> bool {
        if self.state != SurfaceState::Loading {
            return false;
        }
        warn!(favorites = self.favorites.len(), "Pull abandoned, showing mirrored state");
        self.state = SurfaceState::Ready;
        true
    }

    pub fn apply(&mut self, message: ManagerMessage) -> MirrorUpdate {
        match message {
            ManagerMessage::FavoritesUpdated(entries) => {
                if entries.is_empty() {
                    debug!("Ignoring empty favorites update");
                    return MirrorUpdate::Unchanged;
                }
                let (favorites, dropped) = FavoriteRegistry::from_entries(entries);
                if dropped > 0 {
                    warn!(dropped, "Dropped invalid favorites from update");
                }
                self.favorites = favorites;
            }
            ManagerMessage::MonitorLabelsUpdated(labels) => {
                if labels.is_empty() {
                    debug!("Ignoring empty label update");
                    return MirrorUpdate::Unchanged;
                }
                self.labels = MonitorLabelMap::from_entries(labels);
            }
            ManagerMessage::FavoritesCleared => self.favorites = FavoriteRegistry::default(),
            ManagerMessage::MonitorLabelsCleared => self.labels = MonitorLabelMap::default(),
            ManagerMessage::Shutdown => return MirrorUpdate::Shutdown,
        }
        self.state = SurfaceState::Ready;
        MirrorUpdate::Rebuild
    }

    /// Global group first, then one group per monitor ordered by id
    pub fn groups(&self) -> Vec<FavoriteGroup> {
        let global = FavoriteGroup {
            title: crate::constants::tray::GLOBAL_GROUP_TITLE.to_string(),
            monitor_id: None,
            entries: self.favorites.list_for(None).into_iter().cloned().collect(),
        };

        let mut per_monitor: BTreeMap<&str, Vec<FavoriteEntry>> = BTreeMap::new();
        for entry in self.favorites.all() {
            if let Some(id) = entry.monitor_id.as_deref() {
                per_monitor.entry(id).or_default().push(entry.clone());
            }
        }

        std::iter::once(global)
            .chain(per_monitor.into_iter().map(|(id, entries)| FavoriteGroup {
                title: self.monitor_title(id),
                monitor_id: Some(id.to_string()),
                entries,
            }))
            .collect()
    }

    pub fn monitor_title(&self, monitor_id: &str) -> String {
        self.labels
            .label_for(monitor_id)
            .map(str::to_string)
            .unwrap_or_else(|| format!("Monitor {monitor_id}"))
    }

    pub fn state(&self) -> SurfaceState {
        self.state
    }

    pub fn favorites(&self) -> &FavoriteRegistry {
        &self.favorites
    }

    pub fn labels(&self) -> &MonitorLabelMap {
        &self.labels
    }

    pub fn dispose(&mut self) {
        self.favorites = FavoriteRegistry::default();
        self.labels = MonitorLabelMap::default();
        self.state = SurfaceState::Uninitialized;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::MonitorLabel;
    use tempfile::tempdir;

    fn favorite(resolution: &str, monitor_id: Option<&str>) -> FavoriteEntry {
        FavoriteEntry {
            resolution: resolution.to_string(),
            monitor_id: monitor_id.map(str::to_string),
            label: None,
        }
    }

    fn label(id: &str, label: &str) -> MonitorLabel {
        MonitorLabel {
            id: id.to_string(),
            label: label.to_string(),
        }
    }

    #[test]
    fn test_lifecycle() {
        let temp = tempdir().unwrap();
        let mut mirror = MirrorState::new();
        assert_eq!(mirror.state(), SurfaceState::Uninitialized);

        mirror.bootstrap(&ConfigStore::new(temp.path()));
        assert_eq!(mirror.state(), SurfaceState::Ready);
        assert!(mirror.favorites().is_empty());

        mirror.begin_pull();
        assert_eq!(mirror.state(), SurfaceState::Loading);
        assert_eq!(mirror.apply(ManagerMessage::FavoritesCleared), MirrorUpdate::Rebuild);
        assert_eq!(mirror.state(), SurfaceState::Ready);

        mirror.dispose();
        assert_eq!(mirror.state(), SurfaceState::Uninitialized);
    }

    #[test]
    fn test_unanswered_pull_ends_ready() {
        let temp = tempdir().unwrap();
        let store = ConfigStore::new(temp.path());
        store.save_labels(&[label("0", "Desk")]).unwrap();
        let mut mirror = MirrorState::new();
        mirror.bootstrap(&store);

        mirror.begin_pull();
        assert!(mirror.fail_pull());
        assert_eq!(mirror.state(), SurfaceState::Ready);
        assert_eq!(mirror.monitor_title("0"), "Desk");

        // Nothing pending any more
        assert!(!mirror.fail_pull());
    }

    #[test]
    fn test_bootstrap_reads_files() {
        let temp = tempdir().unwrap();
        let store = ConfigStore::new(temp.path());
        store
            .save_favorites(&[favorite("1920x1080", Some("0")), favorite("bogus", None)])
            .unwrap();
        store.save_labels(&[label("0", "Desk")]).unwrap();

        let mut mirror = MirrorState::new();
        mirror.bootstrap(&store);
        assert_eq!(mirror.favorites().len(), 1);
        assert_eq!(mirror.monitor_title("0"), "Desk");
    }

    #[test]
    fn test_bootstrap_with_corrupt_files_is_ready_and_empty() {
        let temp = tempdir().unwrap();
        let store = ConfigStore::new(temp.path());
        std::fs::write(store.path(crate::config::ConfigFile::Favorites), "{{{").unwrap();

        let mut mirror = MirrorState::new();
        mirror.bootstrap(&store);
        assert_eq!(mirror.state(), SurfaceState::Ready);
        assert!(mirror.favorites().is_empty());
    }

    #[test]
    fn test_empty_label_push_keeps_mirrored_labels() {
        let mut mirror = MirrorState::new();
        mirror.apply(ManagerMessage::MonitorLabelsUpdated(vec![label("0", "Left")]));

        assert_eq!(
            mirror.apply(ManagerMessage::MonitorLabelsUpdated(Vec::new())),
            MirrorUpdate::Unchanged
        );
        assert_eq!(mirror.labels().label_for("0"), Some("Left"));

        mirror.apply(ManagerMessage::MonitorLabelsCleared);
        assert!(mirror.labels().is_empty());
    }

    #[test]
    fn test_empty_favorites_push_is_ignored() {
        let mut mirror = MirrorState::new();
        mirror.apply(ManagerMessage::FavoritesUpdated(vec![favorite("1280x720", None)]));
        assert_eq!(
            mirror.apply(ManagerMessage::FavoritesUpdated(Vec::new())),
            MirrorUpdate::Unchanged
        );
        assert_eq!(mirror.favorites().len(), 1);
    }

    #[test]
    fn test_push_replaces_whole_set() {
        let mut mirror = MirrorState::new();
        mirror.apply(ManagerMessage::FavoritesUpdated(vec![
            favorite("1280x720", None),
            favorite("1024x768", None),
        ]));
        mirror.apply(ManagerMessage::FavoritesUpdated(vec![favorite("800x600", None)]));

        let all = mirror.favorites().all();
        assert_eq!(all, &[favorite("800x600", None)]);
    }

    #[test]
    fn test_groups() {
        let mut mirror = MirrorState::new();
        mirror.apply(ManagerMessage::FavoritesUpdated(vec![
            favorite("1920x1080", Some("1")),
            favorite("1280x720", None),
            favorite("2560x1440@144", Some("0")),
        ]));
        mirror.apply(ManagerMessage::MonitorLabelsUpdated(vec![label("1", "TV")]));

        let groups = mirror.groups();
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].title, "Global Favorites");
        assert_eq!(groups[0].entries, vec![favorite("1280x720", None)]);
        assert_eq!(groups[1].title, "Monitor 0");
        assert_eq!(groups[1].entries, vec![favorite("2560x1440@144", Some("0"))]);
        assert_eq!(groups[2].title, "TV");
        assert_eq!(groups[2].monitor_id.as_deref(), Some("1"));
    }

    #[test]
    fn test_shutdown() {
        let mut mirror = MirrorState::new();
        assert_eq!(mirror.apply(ManagerMessage::Shutdown), MirrorUpdate::Shutdown);
    }
}
