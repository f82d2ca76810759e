//! Run-on-login via an XDG autostart desktop entry

use std::path::{Path, PathBuf};
use tracing::info;

use crate::constants::{autostart, tray};
use crate::error::{ManagerError, ManagerResult};

#[derive(Debug, Clone)]
pub struct Autostart {
    dir: PathBuf,
}

impl Autostart {
    /// `$XDG_CONFIG_HOME/autostart`
    pub fn user() -> Self {
        let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::in_dir(base.join(autostart::DIR))
    }

    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn entry_path(&self) -> PathBuf {
        self.dir.join(autostart::DESKTOP_FILE)
    }

    pub fn is_enabled(&self) -> bool {
        self.entry_path().exists()
    }

    /// Write or remove the desktop entry
    pub fn set_enabled(&self, enabled: bool, exe: &Path) -> ManagerResult<()> {
        let path = self.entry_path();
        if enabled {
            std::fs::create_dir_all(&self.dir)
                .map_err(|e| ManagerError::persistence(&self.dir, e))?;
            std::fs::write(&path, desktop_entry(exe))
                .map_err(|e| ManagerError::persistence(&path, e))?;
            info!(path = %path.display(), "Enabled start on login");
        } else if path.exists() {
            std::fs::remove_file(&path).map_err(|e| ManagerError::persistence(&path, e))?;
            info!(path = %path.display(), "Disabled start on login");
        }
        Ok(())
    }
}

fn desktop_entry(exe: &Path) -> String {
    format!(
        "[Desktop Entry]\n\
         Type=Application\n\
         Name={name}\n\
         Comment=Change monitor resolutions from the system tray\n\
         Exec=\"{exe}\"\n\
         Icon={icon}\n\
         Terminal=false\n\
         X-GNOME-Autostart-enabled=true\n",
        name = tray::TITLE,
        exe = exe.display(),
        icon = tray::ICON_NAME,
    )
}
