//! Resolution catalog: the built-in defaults merged with user-added resolutions
//!
//! The combined list is recomputed from scratch on every change of the custom set
//! and is always sorted by width, height, then refresh rate, descending.

use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::error::{ManagerError, ManagerResult};
use crate::types::Resolution;

#[derive(Debug, Clone, Default)]
pub struct ResolutionCatalog {
    defaults: Vec<Resolution>,
    custom: Vec<Resolution>,
    sorted: Vec<Resolution>,
}

impl ResolutionCatalog {
    /// Build from the two persisted sets. Custom entries that duplicate a default
    /// (or each other) are dropped.
    pub fn new(defaults: Vec<Resolution>, custom: Vec<Resolution>) -> Self {
        let mut catalog = Self {
            defaults: dedup(defaults),
            custom: Vec::with_capacity(custom.len()),
            sorted: Vec::new(),
        };
        for res in custom {
            if catalog.contains(&res) {
                warn!(resolution = %res, "Dropping duplicate custom resolution");
                continue;
            }
            catalog.custom.push(res);
        }
        catalog.resort();
        catalog
    }

    pub fn defaults(&self) -> &[Resolution] {
        &self.defaults
    }

    pub fn custom(&self) -> &[Resolution] {
        &self.custom
    }

    /// Full ordered sequence
    pub fn sorted(&self) -> &[Resolution] {
        &self.sorted
    }

    pub fn contains(&self, res: &Resolution) -> bool {
        self.is_default(res) || self.is_custom(res)
    }

    pub fn is_default(&self, res: &Resolution) -> bool {
        self.defaults.contains(res)
    }

    pub fn is_custom(&self, res: &Resolution) -> bool {
        self.custom.contains(res)
    }

    pub fn add_custom(&mut self, res: Resolution) -> ManagerResult<()> {
        if self.contains(&res) {
            return Err(ManagerError::validation(format!(
                "resolution {} already exists",
                res.signature()
            )));
        }
        info!(resolution = %res, "Adding custom resolution");
        self.custom.push(res);
        self.resort();
        Ok(())
    }

    pub fn remove_custom(&mut self, res: &Resolution) -> ManagerResult<()> {
        if self.is_default(res) {
            return Err(ManagerError::validation(format!(
                "cannot delete default resolution {}",
                res.signature()
            )));
        }
        let before = self.custom.len();
        self.custom.retain(|r| r != res);
        if self.custom.len() == before {
            return Err(ManagerError::not_found(format!(
                "custom resolution {}",
                res.signature()
            )));
        }
        info!(resolution = %res, "Removed custom resolution");
        self.resort();
        Ok(())
    }

    /// Swap `old` for `new`. If `new` is rejected the catalog is left untouched.
    pub fn replace_custom(&mut self, old: &Resolution, new: Resolution) -> ManagerResult<()> {
        if old == &new {
            return Ok(());
        }
        if !self.is_custom(old) {
            return Err(ManagerError::validation(format!(
                "only custom resolutions can be edited ({})",
                old.signature()
            )));
        }
        if self.contains(&new) {
            return Err(ManagerError::validation(format!(
                "resolution {} already exists",
                new.signature()
            )));
        }
        if let Some(slot) = self.custom.iter_mut().find(|r| *r == old) {
            *slot = new;
        }
        info!(old = %old, new = %new, "Edited custom resolution");
        self.resort();
        Ok(())
    }

    fn resort(&mut self) {
        let mut seen = HashSet::new();
        let mut merged: Vec<Resolution> = self
            .defaults
            .iter()
            .chain(self.custom.iter())
            .copied()
            .filter(|r| seen.insert(r.signature()))
            .collect();
        merged.sort_by(Resolution::cmp_descending);
        debug!(count = merged.len(), "Re-sorted resolution catalog");
        self.sorted = merged;
    }
}

fn dedup(list: Vec<Resolution>) -> Vec<Resolution> {
    let mut seen = HashSet::new();
    list.into_iter().filter(|r| seen.insert(*r)).collect()
}
