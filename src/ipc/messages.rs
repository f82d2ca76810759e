//! IPC message types for Manager ↔ Tray communication
//!
//! Every frame carries an [`Envelope`] with the protocol version. Both enums are
//! adjacently tagged so the JSON stays readable in socket dumps:
//! `{"version":1,"message":{"type":"FavoritesUpdated","payload":[...]}}`.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::constants::ipc::PROTOCOL_VERSION;
use crate::favorites::FavoriteEntry;
use crate::labels::MonitorLabel;
use crate::types::is_valid_signature;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Envelope<M> {
    pub version: u16,
    pub message: M,
}

impl<M> Envelope<M> {
    pub fn new(message: M) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            message,
        }
    }
}

/// Messages sent from the manager to the tray
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum ManagerMessage {
    /// Full favorite set; replaces the mirror's copy
    FavoritesUpdated(Vec<FavoriteEntry>),

    /// Full label set; replaces the mirror's copy
    MonitorLabelsUpdated(Vec<MonitorLabel>),

    /// The last favorite was removed
    FavoritesCleared,

    /// The last label was removed
    MonitorLabelsCleared,

    /// Manager is exiting, tray should follow
    Shutdown,
}

/// Messages sent from the tray to the manager
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum TrayMessage {
    /// Ask for both full sets (sent on every new connection)
    RequestFavorites,

    /// User clicked a favorite. No monitor means the primary monitor.
    #[serde(rename_all = "camelCase")]
    ApplyFavoriteResolution {
        resolution: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        monitor_id: Option<String>,
    },

    /// Bring the manager window back
    ShowManager,

    /// Exit both processes
    Quit,
}

/// Boundary validation for decoded messages
pub trait Inbound: Sized {
    /// Clean the payload, or `None` when nothing usable is left
    fn sanitize(self) -> Option<Self>;
}

impl Inbound for ManagerMessage {
    fn sanitize(self) -> Option<Self> {
        Some(match self {
            ManagerMessage::FavoritesUpdated(entries) => {
                let total = entries.len();
                let valid: Vec<FavoriteEntry> =
                    entries.into_iter().filter(FavoriteEntry::is_valid).collect();
                if valid.len() != total {
                    warn!(dropped = total - valid.len(), "Filtered invalid favorites from update");
                }
                ManagerMessage::FavoritesUpdated(valid)
            }
            ManagerMessage::MonitorLabelsUpdated(labels) => {
                let total = labels.len();
                let valid: Vec<MonitorLabel> = labels
                    .into_iter()
                    .filter(|l| !l.id.is_empty() && !l.label.trim().is_empty())
                    .collect();
                if valid.len() != total {
                    warn!(dropped = total - valid.len(), "Filtered blank labels from update");
                }
                ManagerMessage::MonitorLabelsUpdated(valid)
            }
            other => other,
        })
    }
}

impl Inbound for TrayMessage {
    fn sanitize(self) -> Option<Self> {
        match self {
            TrayMessage::ApplyFavoriteResolution { resolution, .. }
                if !is_valid_signature(&resolution) =>
            {
                warn!(%resolution, "Dropping apply request with invalid resolution");
                None
            }
            other => Some(other),
        }
    }
}
