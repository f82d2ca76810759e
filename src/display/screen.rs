//! Generic fallback: the core X11 root screen, no mode switching

use tracing::{debug, warn};
use x11rb::connection::Connection;
use x11rb::rust_connection::RustConnection;

use super::{DisplayBackend, normalize_modes};
use crate::config::store::builtin_defaults;
use crate::constants::{display, resolutions};
use crate::error::{ManagerError, ManagerResult};
use crate::types::{CurrentMode, Monitor, Resolution};

pub struct CoreBackend {
    /// Root screen size, `None` when no X display could be reached
    screen: Option<(u32, u32)>,
}

impl CoreBackend {
    pub fn connect() -> Self {
        let screen = match RustConnection::connect(None) {
            Ok((conn, screen_num)) => conn.setup().roots.get(screen_num).map(|root| {
                (
                    u32::from(root.width_in_pixels),
                    u32::from(root.height_in_pixels),
                )
            }),
            Err(e) => {
                warn!(error = %e, "No X display available");
                None
            }
        };
        debug!(?screen, "Core screen backend ready");
        Self { screen }
    }

    #[cfg(test)]
    pub(crate) fn with_screen(screen: Option<(u32, u32)>) -> Self {
        Self { screen }
    }

    fn screen(&self) -> ManagerResult<(u32, u32)> {
        self.screen
            .ok_or_else(|| ManagerError::capability("no X display available"))
    }

    fn check_monitor(monitor_id: &str) -> ManagerResult<()> {
        if monitor_id != display::CORE_SCREEN_ID {
            return Err(ManagerError::not_found(format!("monitor {monitor_id}")));
        }
        Ok(())
    }
}

impl DisplayBackend for CoreBackend {
    fn name(&self) -> &'static str {
        "core"
    }

    fn enumerate(&self) -> ManagerResult<Vec<Monitor>> {
        let (width, height) = self.screen()?;
        Ok(vec![Monitor {
            id: display::CORE_SCREEN_ID.to_string(),
            name: format!("Screen {}", display::CORE_SCREEN_ID),
            current_mode: Some(CurrentMode {
                width,
                height,
                x: 0,
                y: 0,
                refresh_rate: resolutions::DISPLAY_REFRESH_FALLBACK,
            }),
            is_primary: true,
        }])
    }

    fn available_modes(&self, monitor_id: &str) -> ManagerResult<Vec<Resolution>> {
        Self::check_monitor(monitor_id)?;
        let (width, height) = self.screen()?;
        let mut modes = builtin_defaults();
        modes.push(Resolution::new(width, height, None)?);
        Ok(normalize_modes(modes))
    }

    fn apply(&self, monitor_id: &str, resolution: &Resolution) -> ManagerResult<()> {
        Self::check_monitor(monitor_id)?;
        let (width, height) = self.screen()?;
        if resolution.width == width && resolution.height == height {
            debug!(%resolution, "Requested mode is already active");
            return Ok(());
        }
        Err(ManagerError::capability(
            "changing the resolution requires the XRandR extension",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_primary_screen() {
        let backend = CoreBackend::with_screen(Some((2560, 1440)));
        let monitors = backend.enumerate().unwrap();

        assert_eq!(monitors.len(), 1);
        assert!(monitors[0].is_primary);
        assert_eq!(monitors[0].current_mode.unwrap().width, 2560);
    }

    #[test]
    fn test_modes_include_current_size() {
        let backend = CoreBackend::with_screen(Some((2560, 1440)));
        let modes = backend.available_modes("0").unwrap();
        assert_eq!(modes[0], Resolution::new(2560, 1440, None).unwrap());
        assert!(modes.len() > resolutions::DEFAULTS.len());
    }

    #[test]
    fn test_apply_only_accepts_current_size() {
        let backend = CoreBackend::with_screen(Some((1920, 1080)));
        assert!(backend.apply("0", &Resolution::new(1920, 1080, None).unwrap()).is_ok());
        assert!(matches!(
            backend.apply("0", &Resolution::new(1280, 720, None).unwrap()),
            Err(ManagerError::Capability(_))
        ));
        assert!(matches!(
            backend.apply("HDMI-1", &Resolution::new(1920, 1080, None).unwrap()),
            Err(ManagerError::NotFound(_))
        ));
    }

    #[test]
    fn test_no_display() {
        let backend = CoreBackend::with_screen(None);
        assert!(matches!(backend.enumerate(), Err(ManagerError::Capability(_))));
    }
}
