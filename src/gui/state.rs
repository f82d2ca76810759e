//! Manager-side reconciliation model
//!
//! Every user action goes through here: validate, mutate the in-memory catalog,
//! registry or label map, persist, then push the full set to the tray. A failed
//! write rolls the in-memory change back; if restoring the file fails as well the
//! user gets an error notice.

use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

use crate::autostart::Autostart;
use crate::catalog::ResolutionCatalog;
use crate::config::{ConfigStore, LastResolution, MonitorConfig, RecentResolutions, Settings};
use crate::display::DisplayBackend;
use crate::error::{ManagerError, ManagerResult};
use crate::favorites::{FavoriteEntry, FavoriteRegistry, Toggled};
use crate::ipc::{ManagerMessage, TrayMessage};
use crate::labels::MonitorLabelMap;
use crate::types::{Monitor, Resolution};

/// Receives the messages the manager pushes to the tray
pub trait Publisher {
    fn publish(&mut self, message: ManagerMessage);
}

impl Publisher for Vec<ManagerMessage> {
    fn publish(&mut self, message: ManagerMessage) {
        self.push(message);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// One line in the manager's status area
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

/// What the window should do after a tray command was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowRequest {
    None,
    Show,
    Quit,
}

pub struct ManagerState {
    store: ConfigStore,
    backend: Box<dyn DisplayBackend>,
    autostart: Autostart,
    settings: Settings,
    catalog: ResolutionCatalog,
    favorites: FavoriteRegistry,
    labels: MonitorLabelMap,
    monitors: Vec<Monitor>,
    saved: BTreeMap<String, MonitorConfig>,
    recent: RecentResolutions,
    notices: Vec<Notice>,
}

impl ManagerState {
    /// Bootstrap the store and load every concern
    pub fn load(store: ConfigStore, backend: Box<dyn DisplayBackend>, autostart: Autostart) -> Self {
        let mut state = Self {
            settings: Settings::default(),
            catalog: ResolutionCatalog::default(),
            favorites: FavoriteRegistry::default(),
            labels: MonitorLabelMap::default(),
            monitors: Vec::new(),
            saved: BTreeMap::new(),
            recent: RecentResolutions::default(),
            notices: Vec::new(),
            store,
            backend,
            autostart,
        };

        for (file, result) in state.store.create_missing_files() {
            if let Err(e) = result {
                state.notify(NoticeLevel::Warning, format!("Could not create {}: {e}", file.file_name()));
            }
        }

        for (file, reason) in state.store.check_documents() {
            state.notify(
                NoticeLevel::Warning,
                format!("{} could not be fully read ({reason}), using defaults", file.file_name()),
            );
        }

        state.settings = state.store.load_settings();
        state.catalog = ResolutionCatalog::new(
            state.store.load_default_resolutions(),
            state.store.load_custom_resolutions(),
        );
        state.load_favorites();
        state.labels = MonitorLabelMap::from_entries(state.store.load_labels());
        state.saved = state.store.load_monitor_configs();
        state.refresh_monitors();

        info!(
            backend = state.backend.name(),
            resolutions = state.catalog.sorted().len(),
            favorites = state.favorites.len(),
            monitors = state.monitors.len(),
            "Manager state loaded"
        );
        state
    }

    /// Load favorites, persisting the cleaned set when entries were dropped or
    /// rewritten to canonical signatures
    fn load_favorites(&mut self) {
        let (entries, skipped) = self.store.load_favorites();
        let (registry, dropped) = FavoriteRegistry::from_entries(entries.clone());
        self.favorites = registry;
        if dropped > 0 {
            self.notify(
                NoticeLevel::Warning,
                format!("Removed {dropped} invalid or duplicate favorites"),
            );
        }
        if skipped > 0 || self.favorites.all() != entries.as_slice() {
            warn!(skipped, dropped, "Cleaning invalid favorites");
            if let Err(e) = self.store.save_favorites(self.favorites.all()) {
                self.notify(NoticeLevel::Warning, format!("Could not save cleaned favorites: {e}"));
            }
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn catalog(&self) -> &ResolutionCatalog {
        &self.catalog
    }

    pub fn favorites(&self) -> &FavoriteRegistry {
        &self.favorites
    }

    pub fn labels(&self) -> &MonitorLabelMap {
        &self.labels
    }

    pub fn monitors(&self) -> &[Monitor] {
        &self.monitors
    }

    pub fn recent(&self) -> &[Resolution] {
        self.recent.entries()
    }

    pub fn saved_config(&self, monitor_id: &str) -> Option<&MonitorConfig> {
        self.saved.get(monitor_id)
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn config_dir(&self) -> PathBuf {
        self.store.dir().to_path_buf()
    }

    /// Label if set, else the system name
    pub fn monitor_display_name(&self, monitor: &Monitor) -> String {
        match self.labels.label_for(&monitor.id) {
            Some(label) => label.to_string(),
            None => monitor.system_name(),
        }
    }

    pub fn primary_monitor(&self) -> Option<&Monitor> {
        self.monitors
            .iter()
            .find(|m| m.is_primary)
            .or_else(|| self.monitors.first())
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn dismiss_notices(&mut self) {
        self.notices.clear();
    }

    /// Record a user-facing message and log it
    pub fn notify(&mut self, level: NoticeLevel, text: impl Into<String>) {
        let text = text.into();
        match level {
            NoticeLevel::Info => info!(notice = %text),
            NoticeLevel::Warning => warn!(notice = %text),
            NoticeLevel::Error => error!(notice = %text),
        }
        self.notices.push(Notice { level, text });
    }

    /// Report an operation outcome as a notice and hand it back
    pub fn report<T>(&mut self, result: ManagerResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                let level = match e {
                    ManagerError::Validation(_) | ManagerError::NotFound(_) => NoticeLevel::Warning,
                    ManagerError::Persistence { .. } | ManagerError::Capability(_) => NoticeLevel::Error,
                };
                self.notify(level, e.to_string());
                None
            }
        }
    }

    // ------------------------------------------------------------------
    // Bridge
    // ------------------------------------------------------------------

    /// Full favorite set, or the explicit clear when there is none
    pub fn favorites_message(&self) -> ManagerMessage {
        if self.favorites.is_empty() {
            ManagerMessage::FavoritesCleared
        } else {
            ManagerMessage::FavoritesUpdated(self.favorites.all().to_vec())
        }
    }

    /// Full label set, or the explicit clear when there is none
    pub fn labels_message(&self) -> ManagerMessage {
        if self.labels.is_empty() {
            ManagerMessage::MonitorLabelsCleared
        } else {
            ManagerMessage::MonitorLabelsUpdated(self.labels.entries().to_vec())
        }
    }

    /// Answer to a tray pull
    pub fn publish_all(&self, publisher: &mut dyn Publisher) {
        publisher.publish(self.favorites_message());
        publisher.publish(self.labels_message());
    }

    pub fn handle_tray_message(
        &mut self,
        message: TrayMessage,
        publisher: &mut dyn Publisher,
    ) -> WindowRequest {
        match message {
            TrayMessage::RequestFavorites => {
                debug!("Tray requested favorites");
                self.publish_all(publisher);
                WindowRequest::None
            }
            TrayMessage::ApplyFavoriteResolution {
                resolution,
                monitor_id,
            } => {
                let result = self.apply_favorite(&resolution, monitor_id.as_deref());
                self.report(result);
                WindowRequest::None
            }
            TrayMessage::ShowManager => WindowRequest::Show,
            TrayMessage::Quit => WindowRequest::Quit,
        }
    }

    // ------------------------------------------------------------------
    // Favorites and labels
    // ------------------------------------------------------------------

    pub fn toggle_favorite(
        &mut self,
        resolution: &Resolution,
        monitor_id: Option<&str>,
        label: Option<&str>,
        publisher: &mut dyn Publisher,
    ) -> ManagerResult<Toggled> {
        let signature = resolution.signature();
        let previous = self.favorites.clone();
        let outcome = self.favorites.toggle(&signature, monitor_id, label)?;
        if let Err(e) = self.store.save_favorites(self.favorites.all()) {
            self.favorites = previous;
            return Err(e);
        }
        publisher.publish(self.favorites_message());
        Ok(outcome)
    }

    pub fn set_label(
        &mut self,
        monitor_id: &str,
        label: &str,
        publisher: &mut dyn Publisher,
    ) -> ManagerResult<()> {
        if !self.monitors.iter().any(|m| m.id == monitor_id) {
            return Err(ManagerError::not_found(format!("monitor {monitor_id}")));
        }
        let previous = self.labels.clone();
        self.labels.set_label(monitor_id, label)?;
        self.persist_labels(previous, publisher)
    }

    pub fn clear_label(&mut self, monitor_id: &str, publisher: &mut dyn Publisher) -> ManagerResult<()> {
        let previous = self.labels.clone();
        self.labels.clear_label(monitor_id)?;
        self.persist_labels(previous, publisher)
    }

    fn persist_labels(
        &mut self,
        previous: MonitorLabelMap,
        publisher: &mut dyn Publisher,
    ) -> ManagerResult<()> {
        if let Err(e) = self.store.save_labels(self.labels.entries()) {
            self.labels = previous;
            return Err(e);
        }
        publisher.publish(self.labels_message());
        Ok(())
    }

    // ------------------------------------------------------------------
    // Custom resolutions
    // ------------------------------------------------------------------

    pub fn add_custom(&mut self, resolution: Resolution) -> ManagerResult<()> {
        let previous = self.catalog.clone();
        self.catalog.add_custom(resolution)?;
        if let Err(e) = self.store.save_custom_resolutions(self.catalog.custom()) {
            self.catalog = previous;
            return Err(e);
        }
        Ok(())
    }

    /// Remove a custom resolution and every favorite pointing at it
    pub fn remove_custom(
        &mut self,
        resolution: &Resolution,
        publisher: &mut dyn Publisher,
    ) -> ManagerResult<()> {
        let previous = (self.catalog.clone(), self.favorites.clone());
        self.catalog.remove_custom(resolution)?;
        let dropped = self.favorites.remove_signature(&resolution.signature());
        self.persist_catalog_and_favorites(previous, dropped > 0, publisher)
    }

    /// Edit a custom resolution, carrying its favorites over to the new signature
    pub fn edit_custom(
        &mut self,
        old: &Resolution,
        new: Resolution,
        publisher: &mut dyn Publisher,
    ) -> ManagerResult<()> {
        let previous = (self.catalog.clone(), self.favorites.clone());
        self.catalog.replace_custom(old, new)?;
        let renamed = match self
            .favorites
            .rename_signature(&old.signature(), &new.signature())
        {
            Ok(renamed) => renamed,
            Err(e) => {
                (self.catalog, self.favorites) = previous;
                return Err(e);
            }
        };
        let favorites_changed = renamed > 0 || previous.1.all() != self.favorites.all();
        self.persist_catalog_and_favorites(previous, favorites_changed, publisher)
    }

    fn persist_catalog_and_favorites(
        &mut self,
        previous: (ResolutionCatalog, FavoriteRegistry),
        favorites_changed: bool,
        publisher: &mut dyn Publisher,
    ) -> ManagerResult<()> {
        let saved = self
            .store
            .save_custom_resolutions(self.catalog.custom())
            .and_then(|()| {
                if favorites_changed {
                    self.store.save_favorites(self.favorites.all())
                } else {
                    Ok(())
                }
            });
        if let Err(e) = saved {
            (self.catalog, self.favorites) = previous;
            // Put the custom file back in step with memory
            if let Err(restore) = self.store.save_custom_resolutions(self.catalog.custom()) {
                self.notify(
                    NoticeLevel::Error,
                    format!("Custom resolutions on disk no longer match the list shown: {restore}"),
                );
            }
            return Err(e);
        }
        if favorites_changed {
            publisher.publish(self.favorites_message());
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Monitors and modes
    // ------------------------------------------------------------------

    /// Re-enumerate; on failure the previous list is kept
    pub fn refresh_monitors(&mut self) {
        match self.backend.enumerate() {
            Ok(monitors) => {
                debug!(count = monitors.len(), "Monitors refreshed");
                self.monitors = monitors;
            }
            Err(e) => self.notify(NoticeLevel::Warning, format!("Could not list monitors: {e}")),
        }
    }

    pub fn available_modes(&mut self, monitor_id: &str) -> Vec<Resolution> {
        let result = self.backend.available_modes(monitor_id);
        self.report(result).unwrap_or_default()
    }

    fn require_monitor(&self, monitor_id: &str) -> ManagerResult<()> {
        if self.monitors.iter().any(|m| m.id == monitor_id) {
            Ok(())
        } else {
            Err(ManagerError::not_found(format!("monitor {monitor_id}")))
        }
    }

    /// Switch a monitor's mode and record it
    pub fn apply_resolution(&mut self, monitor_id: &str, resolution: &Resolution) -> ManagerResult<()> {
        self.require_monitor(monitor_id)?;
        self.backend.apply(monitor_id, resolution)?;
        info!(monitor = %monitor_id, resolution = %resolution, "Resolution applied");

        self.recent.push(*resolution);

        let config = MonitorConfig::new(monitor_id, resolution);
        if let Err(e) = self.store.save_monitor_config(config.clone()) {
            self.notify(NoticeLevel::Warning, format!("Applied, but could not save configuration: {e}"));
        }
        self.saved.insert(monitor_id.to_string(), config);

        if self.settings.use_last_resolution {
            if let Err(e) = self
                .store
                .save_last_resolution(&LastResolution::new(monitor_id, resolution))
            {
                self.notify(NoticeLevel::Warning, format!("Could not save last resolution: {e}"));
            }
        }

        self.refresh_monitors();
        Ok(())
    }

    pub fn apply_saved_configuration(&mut self, monitor_id: &str) -> ManagerResult<()> {
        let resolution = self
            .saved
            .get(monitor_id)
            .ok_or_else(|| ManagerError::not_found(format!("saved configuration for {monitor_id}")))?
            .resolution()?;
        self.apply_resolution(monitor_id, &resolution)
    }

    /// Restore lastResolution.json. Returns false when there was nothing to restore.
    pub fn apply_last_resolution(&mut self) -> ManagerResult<bool> {
        let Some(last) = self.store.load_last_resolution() else {
            return Ok(false);
        };
        if last.is_placeholder() {
            debug!("Last resolution is the first-run placeholder, skipping");
            return Ok(false);
        }
        let resolution = last.to_resolution()?;
        self.apply_resolution(&last.monitor, &resolution)?;
        Ok(true)
    }

    /// Apply a favorite by signature. No monitor means the primary monitor.
    pub fn apply_favorite(&mut self, signature: &str, monitor_id: Option<&str>) -> ManagerResult<()> {
        let resolution = Resolution::from_signature(signature)?;
        let target = match monitor_id {
            Some(id) => id.to_string(),
            None => self
                .primary_monitor()
                .map(|m| m.id.clone())
                .ok_or_else(|| ManagerError::not_found("primary monitor"))?,
        };
        self.apply_resolution(&target, &resolution)
    }

    /// Favorites shown in a monitor's view: (scoped to it, global)
    pub fn favorites_for_monitor(&self, monitor_id: &str) -> (Vec<&FavoriteEntry>, Vec<&FavoriteEntry>) {
        (self.favorites.list_for(Some(monitor_id)), self.favorites.list_for(None))
    }

    // ------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------

    fn update_settings(&mut self, change: impl FnOnce(&mut Settings)) -> ManagerResult<()> {
        let previous = self.settings.clone();
        change(&mut self.settings);
        if let Err(e) = self.store.save_settings(&self.settings) {
            self.settings = previous;
            return Err(e);
        }
        Ok(())
    }

    pub fn set_use_last_resolution(&mut self, enabled: bool) -> ManagerResult<()> {
        self.update_settings(|s| s.use_last_resolution = enabled)
    }

    pub fn set_minimize_to_tray(&mut self, enabled: bool) -> ManagerResult<()> {
        self.update_settings(|s| s.minimize_to_tray = enabled)
    }

    /// Persist the toggle and write or remove the autostart entry
    pub fn set_start_on_startup(&mut self, enabled: bool) -> ManagerResult<()> {
        let exe = std::env::current_exe()
            .map_err(|e| ManagerError::persistence(self.autostart.entry_path(), e))?;
        let was_enabled = self.autostart.is_enabled();
        self.autostart.set_enabled(enabled, &exe)?;
        if let Err(e) = self.update_settings(|s| s.start_on_startup = enabled) {
            if let Err(undo) = self.autostart.set_enabled(was_enabled, &exe) {
                error!(error = %undo, "Failed to restore autostart entry");
            }
            return Err(e);
        }
        Ok(())
    }
}
