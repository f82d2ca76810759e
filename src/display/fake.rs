//! In-memory backend for manager state tests

use std::cell::RefCell;

use super::DisplayBackend;
use crate::error::{ManagerError, ManagerResult};
use crate::types::{CurrentMode, Monitor, Resolution};

#[derive(Default)]
pub struct FakeBackend {
    pub monitors: RefCell<Vec<Monitor>>,
    pub modes: Vec<Resolution>,
    /// Every successful apply, in order
    pub applied: RefCell<Vec<(String, Resolution)>>,
    pub fail_apply: bool,
    pub fail_enumerate: bool,
}

impl FakeBackend {
    /// Primary "0" at 1920x1080@60 and secondary "1" at 1280x720@60
    pub fn two_monitors() -> Self {
        let monitor = |id: &str, width, height, is_primary| Monitor {
            id: id.to_string(),
            name: format!("Fake {id}"),
            current_mode: Some(CurrentMode {
                width,
                height,
                x: 0,
                y: 0,
                refresh_rate: 60,
            }),
            is_primary,
        };
        Self {
            monitors: RefCell::new(vec![
                monitor("0", 1920, 1080, true),
                monitor("1", 1280, 720, false),
            ]),
            ..Self::default()
        }
    }
}

impl DisplayBackend for FakeBackend {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn enumerate(&self) -> ManagerResult<Vec<Monitor>> {
        if self.fail_enumerate {
            return Err(ManagerError::capability("enumeration disabled"));
        }
        Ok(self.monitors.borrow().clone())
    }

    fn available_modes(&self, _monitor_id: &str) -> ManagerResult<Vec<Resolution>> {
        Ok(self.modes.clone())
    }

    fn apply(&self, monitor_id: &str, resolution: &Resolution) -> ManagerResult<()> {
        if self.fail_apply {
            return Err(ManagerError::capability("mode rejected"));
        }
        let mut monitors = self.monitors.borrow_mut();
        let monitor = monitors
            .iter_mut()
            .find(|m| m.id == monitor_id)
            .ok_or_else(|| ManagerError::not_found(format!("monitor {monitor_id}")))?;
        if let Some(mode) = monitor.current_mode.as_mut() {
            mode.width = resolution.width;
            mode.height = resolution.height;
            mode.refresh_rate = resolution.refresh_rate.unwrap_or(60);
        }
        self.applied
            .borrow_mut()
            .push((monitor_id.to_string(), *resolution));
        Ok(())
    }
}
