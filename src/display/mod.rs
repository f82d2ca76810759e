//! Monitor Resolution Service
//!
//! The manager talks to the display server only through [`DisplayBackend`]. Two
//! implementations exist: [`RandrBackend`] drives XRandR per output, and
//! [`CoreBackend`] reports the single core X11 screen with the built-in mode list
//! when XRandR is missing. [`probe`] picks one at startup and it is kept for the
//! lifetime of the process.

mod screen;
mod randr;

#[cfg(test)]
pub mod fake;

pub use self::screen::CoreBackend;
pub use self::randr::RandrBackend;

use std::fmt::Display;
use tracing::{info, warn};

use crate::error::{ManagerError, ManagerResult};
use crate::types::{Monitor, Resolution};

pub trait DisplayBackend {
    /// Short name shown in the manager status line
    fn name(&self) -> &'static str;

    fn enumerate(&self) -> ManagerResult<Vec<Monitor>>;

    /// Modes the monitor supports, sorted like the catalog
    fn available_modes(&self, monitor_id: &str) -> ManagerResult<Vec<Resolution>>;

    /// Switch `monitor_id` to `resolution`. A missing refresh rate lets the
    /// backend pick the highest rate available for that size.
    fn apply(&self, monitor_id: &str, resolution: &Resolution) -> ManagerResult<()>;
}

/// Select the backend once, preferring XRandR
pub fn probe() -> Box<dyn DisplayBackend> {
    match RandrBackend::connect() {
        Ok(backend) => {
            info!(backend = backend.name(), "Using XRandR display backend");
            Box::new(backend)
        }
        Err(e) => {
            warn!(error = %format!("{e:#}"), "XRandR unavailable, falling back to core X11 screen");
            Box::new(CoreBackend::connect())
        }
    }
}

/// `anyhow`-style context for display server errors
pub(crate) trait CapabilityContext<T> {
    fn capability(self, what: &str) -> ManagerResult<T>;
}

impl<T, E: Display> CapabilityContext<T> for Result<T, E> {
    fn capability(self, what: &str) -> ManagerResult<T> {
        self.map_err(|e| ManagerError::capability(format!("{what}: {e}")))
    }
}

/// Deduplicate by signature and sort in catalog order
pub(crate) fn normalize_modes(mut modes: Vec<Resolution>) -> Vec<Resolution> {
    modes.sort_by(Resolution::cmp_descending);
    modes.dedup();
    modes
}
