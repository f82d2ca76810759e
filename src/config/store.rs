//! JSON configuration file store
//!
//! Reads never fail the caller: a missing, unreadable or malformed document falls
//! back to the empty default for that concern and logs a warning. Writes return
//! `ManagerError::Persistence` so the manager can surface them.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::saved::{LastResolution, MonitorConfig};
use super::settings::Settings;
use crate::constants::{config, resolutions};
use crate::error::{ManagerError, ManagerResult};
use crate::favorites::FavoriteEntry;
use crate::labels::MonitorLabel;
use crate::types::Resolution;

/// Every document kept in the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConfigFile {
    Settings,
    DefaultResolutions,
    CustomResolutions,
    Favorites,
    MonitorLabels,
    LastResolution,
    MonitorConfigurations,
}

impl ConfigFile {
    pub const ALL: [ConfigFile; 7] = [
        ConfigFile::Settings,
        ConfigFile::DefaultResolutions,
        ConfigFile::CustomResolutions,
        ConfigFile::Favorites,
        ConfigFile::MonitorLabels,
        ConfigFile::LastResolution,
        ConfigFile::MonitorConfigurations,
    ];

    /// Documents created with default contents on first run
    pub const BOOTSTRAP: [ConfigFile; 5] = [
        ConfigFile::Settings,
        ConfigFile::DefaultResolutions,
        ConfigFile::LastResolution,
        ConfigFile::MonitorConfigurations,
        ConfigFile::MonitorLabels,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            ConfigFile::Settings => config::SETTINGS_FILE,
            ConfigFile::DefaultResolutions => config::DEFAULT_RESOLUTIONS_FILE,
            ConfigFile::CustomResolutions => config::CUSTOM_RESOLUTIONS_FILE,
            ConfigFile::Favorites => config::FAVORITES_FILE,
            ConfigFile::MonitorLabels => config::MONITOR_LABELS_FILE,
            ConfigFile::LastResolution => config::LAST_RESOLUTION_FILE,
            ConfigFile::MonitorConfigurations => config::MONITOR_CONFIGURATIONS_FILE,
        }
    }

    fn default_contents(self) -> serde_json::Value {
        match self {
            ConfigFile::Settings => serde_json::json!({
                "startOnStartup": false,
                "useLastResolution": false,
                "minimizeToTray": false,
            }),
            ConfigFile::DefaultResolutions => serde_json::json!(builtin_defaults()),
            ConfigFile::LastResolution => serde_json::json!(LastResolution::placeholder()),
            ConfigFile::MonitorConfigurations => serde_json::json!({}),
            ConfigFile::CustomResolutions
            | ConfigFile::Favorites
            | ConfigFile::MonitorLabels => serde_json::json!([]),
        }
    }
}

/// The built-in default resolution list
pub fn builtin_defaults() -> Vec<Resolution> {
    resolutions::DEFAULTS
        .iter()
        .filter_map(|&(w, h)| Resolution::new(w, h, None).ok())
        .collect()
}

#[derive(Debug, Clone)]
pub struct ConfigStore {
    dir: PathBuf,
}

impl ConfigStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `$XDG_CONFIG_HOME/resolution-manager`, or `./resolution-manager` without a config dir
    pub fn default_dir() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(config::APP_DIR);
        path
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, file: ConfigFile) -> PathBuf {
        self.dir.join(file.file_name())
    }

    pub fn exists(&self, file: ConfigFile) -> bool {
        self.path(file).exists()
    }

    // ------------------------------------------------------------------
    // Bootstrap
    // ------------------------------------------------------------------

    /// Existence of each bootstrap document
    pub fn check_files(&self) -> Vec<(ConfigFile, bool)> {
        ConfigFile::BOOTSTRAP
            .iter()
            .map(|&file| (file, self.exists(file)))
            .collect()
    }

    /// Write every missing bootstrap document with its default contents
    pub fn create_missing_files(&self) -> Vec<(ConfigFile, ManagerResult<()>)> {
        self.check_files()
            .into_iter()
            .filter(|(_, exists)| !exists)
            .map(|(file, _)| {
                let result = self.write(file, &file.default_contents());
                match &result {
                    Ok(()) => info!(path = %self.path(file).display(), "Created default config file"),
                    Err(e) => warn!(error = %e, "Failed to create default config file"),
                }
                (file, result)
            })
            .collect()
    }

    /// Documents that are present but unreadable, malformed or partly skipped,
    /// with the reason. The loaders fall back to defaults for these.
    pub fn check_documents(&self) -> Vec<(ConfigFile, String)> {
        ConfigFile::ALL
            .iter()
            .filter_map(|&file| {
                self.check_document(file)
                    .err()
                    .map(|reason| (file, reason))
            })
            .collect()
    }

    fn check_document(&self, file: ConfigFile) -> Result<(), String> {
        let parsed = match file {
            ConfigFile::Settings => self.read::<Settings>(file).map(drop),
            ConfigFile::LastResolution => self.read::<LastResolution>(file).map(drop),
            ConfigFile::MonitorConfigurations => {
                self.read::<BTreeMap<String, MonitorConfig>>(file).map(drop)
            }
            ConfigFile::DefaultResolutions | ConfigFile::CustomResolutions => {
                return self.check_list::<Resolution>(file);
            }
            ConfigFile::Favorites => return self.check_list::<FavoriteEntry>(file),
            ConfigFile::MonitorLabels => return self.check_list::<MonitorLabel>(file),
        };
        parsed.map_err(|e| e.to_string())
    }

    fn check_list<T: DeserializeOwned>(&self, file: ConfigFile) -> Result<(), String> {
        let raw = match self.read::<Vec<serde_json::Value>>(file) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Ok(()),
            Err(e) => return Err(e.to_string()),
        };
        let malformed = raw
            .into_iter()
            .map(serde_json::from_value::<T>)
            .filter(Result::is_err)
            .count();
        match malformed {
            0 => Ok(()),
            n => Err(format!("{n} malformed entries skipped")),
        }
    }

    // ------------------------------------------------------------------
    // Per-concern access
    // ------------------------------------------------------------------

    pub fn load_settings(&self) -> Settings {
        self.read_or_default(ConfigFile::Settings)
    }

    /// Persist settings, keeping any keys in the existing document this version
    /// does not know about
    pub fn save_settings(&self, settings: &Settings) -> ManagerResult<()> {
        let mut document = match self.read::<serde_json::Value>(ConfigFile::Settings) {
            Ok(Some(serde_json::Value::Object(map))) => map,
            _ => serde_json::Map::new(),
        };
        let current = serde_json::to_value(settings)
            .map_err(|e| ManagerError::persistence(self.path(ConfigFile::Settings), e))?;
        if let serde_json::Value::Object(fields) = current {
            document.extend(fields);
        }
        self.write(ConfigFile::Settings, &document)
    }

    /// Silent read used before logging is initialised
    pub fn read_log_level(&self) -> Option<String> {
        fs::read_to_string(self.path(ConfigFile::Settings))
            .ok()
            .and_then(|contents| serde_json::from_str::<Settings>(&contents).ok())
            .map(|settings| settings.log_level)
    }

    /// Missing file yields the built-in list
    pub fn load_default_resolutions(&self) -> Vec<Resolution> {
        if !self.exists(ConfigFile::DefaultResolutions) {
            return builtin_defaults();
        }
        self.read_list(ConfigFile::DefaultResolutions).0
    }

    pub fn load_custom_resolutions(&self) -> Vec<Resolution> {
        self.read_list(ConfigFile::CustomResolutions).0
    }

    pub fn save_custom_resolutions(&self, custom: &[Resolution]) -> ManagerResult<()> {
        self.write(ConfigFile::CustomResolutions, custom)
    }

    /// Entries plus the number of structurally malformed ones that were skipped
    pub fn load_favorites(&self) -> (Vec<FavoriteEntry>, usize) {
        self.read_list(ConfigFile::Favorites)
    }

    pub fn save_favorites(&self, favorites: &[FavoriteEntry]) -> ManagerResult<()> {
        self.write(ConfigFile::Favorites, favorites)
    }

    pub fn load_labels(&self) -> Vec<MonitorLabel> {
        self.read_list(ConfigFile::MonitorLabels).0
    }

    pub fn save_labels(&self, labels: &[MonitorLabel]) -> ManagerResult<()> {
        self.write(ConfigFile::MonitorLabels, labels)
    }

    pub fn load_last_resolution(&self) -> Option<LastResolution> {
        match self.read(ConfigFile::LastResolution) {
            Ok(last) => last,
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable last resolution");
                None
            }
        }
    }

    pub fn save_last_resolution(&self, last: &LastResolution) -> ManagerResult<()> {
        self.write(ConfigFile::LastResolution, last)
    }

    pub fn load_monitor_configs(&self) -> BTreeMap<String, MonitorConfig> {
        self.read_or_default(ConfigFile::MonitorConfigurations)
    }

    /// Record the configuration for one monitor, keeping the others
    pub fn save_monitor_config(&self, monitor_config: MonitorConfig) -> ManagerResult<()> {
        let mut configs = self.load_monitor_configs();
        configs.insert(monitor_config.id.clone(), monitor_config);
        self.write(ConfigFile::MonitorConfigurations, &configs)
    }

    // ------------------------------------------------------------------
    // Raw access
    // ------------------------------------------------------------------

    /// `Ok(None)` when the document does not exist
    fn read<T: DeserializeOwned>(&self, file: ConfigFile) -> ManagerResult<Option<T>> {
        let path = self.path(file);
        if !path.exists() {
            return Ok(None);
        }
        let contents =
            fs::read_to_string(&path).map_err(|e| ManagerError::persistence(&path, e))?;
        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|e| ManagerError::persistence(&path, e))
    }

    fn read_or_default<T: DeserializeOwned + Default>(&self, file: ConfigFile) -> T {
        match self.read(file) {
            Ok(Some(value)) => value,
            Ok(None) => {
                debug!(file = file.file_name(), "Config file absent, using defaults");
                T::default()
            }
            Err(e) => {
                warn!(error = %e, "Falling back to defaults");
                T::default()
            }
        }
    }

    /// Read an array document element by element, skipping elements that do not
    /// deserialize. Returns the elements and the number skipped.
    fn read_list<T: DeserializeOwned>(&self, file: ConfigFile) -> (Vec<T>, usize) {
        let raw: Vec<serde_json::Value> = match self.read(file) {
            Ok(Some(raw)) => raw,
            Ok(None) => return (Vec::new(), 0),
            Err(e) => {
                warn!(error = %e, "Falling back to an empty list");
                return (Vec::new(), 0);
            }
        };
        let total = raw.len();
        let items: Vec<T> = raw
            .into_iter()
            .filter_map(|value| match serde_json::from_value(value) {
                Ok(item) => Some(item),
                Err(e) => {
                    warn!(file = file.file_name(), error = %e, "Skipping malformed entry");
                    None
                }
            })
            .collect();
        let skipped = total - items.len();
        (items, skipped)
    }

    fn write<T: Serialize + ?Sized>(&self, file: ConfigFile, value: &T) -> ManagerResult<()> {
        let path = self.path(file);
        fs::create_dir_all(&self.dir).map_err(|e| ManagerError::persistence(&self.dir, e))?;
        let json =
            serde_json::to_string_pretty(value).map_err(|e| ManagerError::persistence(&path, e))?;
        fs::write(&path, json).map_err(|e| ManagerError::persistence(&path, e))?;
        debug!(path = %path.display(), "Saved config file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn res(width: u32, height: u32, refresh: Option<u32>) -> Resolution {
        Resolution::new(width, height, refresh).unwrap()
    }

    #[test]
    fn test_check_documents_reports_broken_files() {
        let temp = tempdir().unwrap();
        let store = ConfigStore::new(temp.path());
        store.create_missing_files();
        assert!(store.check_documents().is_empty());

        fs::write(store.path(ConfigFile::CustomResolutions), "{{{").unwrap();
        fs::write(
            store.path(ConfigFile::MonitorLabels),
            r#"[{"id":"0","label":"Desk"},{"id":7}]"#,
        )
        .unwrap();

        let problems = store.check_documents();
        let files: Vec<ConfigFile> = problems.iter().map(|(file, _)| *file).collect();
        assert_eq!(files, vec![ConfigFile::CustomResolutions, ConfigFile::MonitorLabels]);
        assert!(problems[1].1.contains("1 malformed"));
    }

    #[test]
    fn test_create_missing_files() {
        let temp = tempdir().unwrap();
        let store = ConfigStore::new(temp.path());

        assert!(store.check_files().iter().all(|(_, exists)| !exists));

        let results = store.create_missing_files();
        assert_eq!(results.len(), ConfigFile::BOOTSTRAP.len());
        assert!(results.iter().all(|(_, r)| r.is_ok()));
        assert!(store.check_files().iter().all(|(_, exists)| *exists));

        // second run has nothing to do
        assert!(store.create_missing_files().is_empty());
    }

    #[test]
    fn test_bootstrap_contents() {
        let temp = tempdir().unwrap();
        let store = ConfigStore::new(temp.path());
        store.create_missing_files();

        assert_eq!(store.load_settings(), Settings::default());
        assert_eq!(store.load_default_resolutions().len(), resolutions::DEFAULTS.len());
        assert_eq!(store.load_default_resolutions()[0], res(1920, 1080, None));
        assert!(store.load_last_resolution().unwrap().is_placeholder());
        assert!(store.load_monitor_configs().is_empty());
        assert!(store.load_labels().is_empty());
    }

    #[test]
    fn test_bootstrap_keeps_existing_file() {
        let temp = tempdir().unwrap();
        let store = ConfigStore::new(temp.path());
        std::fs::write(store.path(ConfigFile::MonitorLabels), r#"[{"id":"0","label":"Main"}]"#)
            .unwrap();

        store.create_missing_files();
        assert_eq!(store.load_labels().len(), 1);
    }

    #[test]
    fn test_malformed_document_falls_back() {
        let temp = tempdir().unwrap();
        let store = ConfigStore::new(temp.path());
        std::fs::write(store.path(ConfigFile::Settings), "{not json").unwrap();
        std::fs::write(store.path(ConfigFile::CustomResolutions), "42").unwrap();

        assert_eq!(store.load_settings(), Settings::default());
        assert!(store.load_custom_resolutions().is_empty());
    }

    #[test]
    fn test_custom_resolutions_lenient_load() {
        let temp = tempdir().unwrap();
        let store = ConfigStore::new(temp.path());
        std::fs::write(
            store.path(ConfigFile::CustomResolutions),
            r#"[{"width":"2560","height":"1440","refreshRate":"144"},{"width":"abc","height":1},{"width":800,"height":600}]"#,
        )
        .unwrap();

        assert_eq!(
            store.load_custom_resolutions(),
            vec![res(2560, 1440, Some(144)), res(800, 600, None)]
        );
    }

    #[test]
    fn test_favorites_skip_structurally_broken_entries() {
        let temp = tempdir().unwrap();
        let store = ConfigStore::new(temp.path());
        std::fs::write(
            store.path(ConfigFile::Favorites),
            r#"[{"resolution":"1920x1080@60"},{"resolution":5},"junk"]"#,
        )
        .unwrap();

        let (favorites, skipped) = store.load_favorites();
        assert_eq!(favorites.len(), 1);
        assert_eq!(skipped, 2);
    }

    #[test]
    fn test_save_settings_preserves_unknown_keys() {
        let temp = tempdir().unwrap();
        let store = ConfigStore::new(temp.path());
        std::fs::write(
            store.path(ConfigFile::Settings),
            r#"{"useLastResolution":false,"theme":"dark"}"#,
        )
        .unwrap();

        let settings = Settings {
            use_last_resolution: true,
            ..Settings::default()
        };
        store.save_settings(&settings).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(store.path(ConfigFile::Settings)).unwrap())
                .unwrap();
        assert_eq!(raw["theme"], "dark");
        assert_eq!(raw["useLastResolution"], true);
        assert!(store.load_settings().use_last_resolution);
    }

    #[test]
    fn test_save_monitor_config_keeps_other_monitors() {
        let temp = tempdir().unwrap();
        let store = ConfigStore::new(temp.path());

        store
            .save_monitor_config(MonitorConfig::new("DP-1", &res(2560, 1440, Some(144))))
            .unwrap();
        store
            .save_monitor_config(MonitorConfig::new("HDMI-1", &res(1920, 1080, None)))
            .unwrap();
        store
            .save_monitor_config(MonitorConfig::new("DP-1", &res(1920, 1080, Some(60))))
            .unwrap();

        let configs = store.load_monitor_configs();
        assert_eq!(configs.len(), 2);
        assert_eq!(configs["DP-1"].resolution().unwrap(), res(1920, 1080, Some(60)));
    }

    #[test]
    fn test_missing_default_resolutions_uses_builtin() {
        let temp = tempdir().unwrap();
        let store = ConfigStore::new(temp.path());
        assert_eq!(store.load_default_resolutions(), builtin_defaults());
    }

    #[test]
    fn test_write_failure_is_persistence_error() {
        let temp = tempdir().unwrap();
        let blocker = temp.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();
        let store = ConfigStore::new(&blocker);

        let err = store.save_labels(&[]).unwrap_err();
        assert!(matches!(err, ManagerError::Persistence { .. }));
    }

    #[test]
    fn test_read_log_level() {
        let temp = tempdir().unwrap();
        let store = ConfigStore::new(temp.path());
        assert_eq!(store.read_log_level(), None);

        std::fs::write(store.path(ConfigFile::Settings), r#"{"logLevel":"debug"}"#).unwrap();
        assert_eq!(store.read_log_level().as_deref(), Some("debug"));
    }
}
