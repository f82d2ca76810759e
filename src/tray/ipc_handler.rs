//! Socket listener for the tray process

use anyhow::{Context, Result};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info, warn};

use super::TrayEvent;
use crate::ipc::{BridgeConnection, BridgeServer, ManagerMessage, TrayMessage};

/// Write half of the active manager connection, shared with menu callbacks.
/// The most recent manager to connect is the active one.
#[derive(Clone, Default)]
pub struct Outbox {
    inner: Arc<Mutex<ActiveConnection>>,
}

#[derive(Default)]
struct ActiveConnection {
    next_id: u64,
    current: Option<(u64, BridgeConnection)>,
}

impl Outbox {
    /// Send to the manager. Returns false when no manager is connected or the
    /// write failed.
    pub fn send(&self, message: TrayMessage) -> bool {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let Some((_, conn)) = guard.current.as_mut() else {
            debug!(?message, "No manager connected");
            return false;
        };
        match conn.send(&message) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = ?e, "Failed to send to manager, dropping connection");
                conn.shutdown();
                guard.current = None;
                false
            }
        }
    }

    pub fn is_connected(&self) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .current
            .is_some()
    }

    /// Make `conn` the active connection, closing the one it supersedes
    fn install(&self, conn: BridgeConnection) -> u64 {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((old_id, old)) = guard.current.take() {
            info!(connection = old_id, "Replacing previous manager connection");
            old.shutdown();
        }
        guard.next_id += 1;
        let id = guard.next_id;
        guard.current = Some((id, conn));
        id
    }

    fn is_active(&self, id: u64) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .current
            .as_ref()
            .is_some_and(|(active, _)| *active == id)
    }

    /// Drop connection `id` if it is still the active one
    fn release(&self, id: u64) -> bool {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        match guard.current.take() {
            Some((active, conn)) if active == id => {
                conn.shutdown();
                true
            }
            other => {
                guard.current = other;
                false
            }
        }
    }

    pub fn close(&self) {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((_, conn)) = guard.current.take() {
            conn.shutdown();
        }
    }
}

/// Spawn IPC listener thread to accept manager connections
pub fn spawn_ipc_listener(
    server: BridgeServer,
    outbox: Outbox,
    events: UnboundedSender<TrayEvent>,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        if let Err(e) = run_ipc_loop(&server, &outbox, &events) {
            error!(error = ?e, "IPC listener thread crashed");
        }
    })
}

fn run_ipc_loop(
    server: &BridgeServer,
    outbox: &Outbox,
    events: &UnboundedSender<TrayEvent>,
) -> Result<()> {
    info!(socket = ?server.path(), "IPC listener started");

    loop {
        // Blocks until a manager connects
        let reader = server.accept().context("Failed to accept IPC connection")?;
        let mut writer = reader.try_clone()?;

        // Pull the current sets from the new manager
        if let Err(e) = writer.send(TrayMessage::RequestFavorites) {
            warn!(error = ?e, "Failed to request favorites");
            continue;
        }
        let id = outbox.install(writer);

        if events.send(TrayEvent::Connected).is_err() {
            warn!("Tray event loop is gone, stopping listener");
            break Ok(());
        }
        info!(connection = id, "Manager connected to tray");

        let outbox = outbox.clone();
        let events = events.clone();
        std::thread::spawn(move || read_connection(id, reader, &outbox, &events));
    }
}

/// Forward one manager's messages until it disconnects or is superseded
fn read_connection(
    id: u64,
    mut reader: BridgeConnection,
    outbox: &Outbox,
    events: &UnboundedSender<TrayEvent>,
) {
    loop {
        match reader.recv::<ManagerMessage>() {
            Ok(Some(message)) => {
                if !outbox.is_active(id) {
                    debug!(connection = id, "Ignoring message from superseded manager");
                    break;
                }
                debug!(?message, "Received manager message");
                let shutdown = message == ManagerMessage::Shutdown;
                if events.send(TrayEvent::Message(message)).is_err() || shutdown {
                    return;
                }
            }
            // Quarantined frame, already logged
            Ok(None) => continue,
            Err(e) => {
                debug!(connection = id, error = ?e, "Manager connection closed");
                break;
            }
        }
    }

    if outbox.release(id) {
        info!(connection = id, "Manager disconnected from tray");
        let _ = events.send(TrayEvent::Disconnected);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::unbounded_channel;

    #[test]
    fn test_listener_pulls_and_forwards() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("tray.sock");
        let server = BridgeServer::bind_to(path.clone()).unwrap();
        let (tx, mut rx) = unbounded_channel();
        let outbox = Outbox::default();
        spawn_ipc_listener(server, outbox.clone(), tx);

        let mut manager = BridgeConnection::connect_to(&path).unwrap();
        assert_eq!(
            manager.recv::<TrayMessage>().unwrap(),
            Some(TrayMessage::RequestFavorites)
        );
        assert!(matches!(rx.blocking_recv(), Some(TrayEvent::Connected)));

        manager.send(ManagerMessage::MonitorLabelsCleared).unwrap();
        assert!(matches!(
            rx.blocking_recv(),
            Some(TrayEvent::Message(ManagerMessage::MonitorLabelsCleared))
        ));

        assert!(outbox.send(TrayMessage::ShowManager));
        assert_eq!(
            manager.recv::<TrayMessage>().unwrap(),
            Some(TrayMessage::ShowManager)
        );

        drop(manager);
        assert!(matches!(rx.blocking_recv(), Some(TrayEvent::Disconnected)));
        assert!(!outbox.is_connected());
    }

    #[test]
    fn test_newest_manager_takes_over() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("tray.sock");
        let server = BridgeServer::bind_to(path.clone()).unwrap();
        let (tx, mut rx) = unbounded_channel();
        let outbox = Outbox::default();
        spawn_ipc_listener(server, outbox.clone(), tx);

        let mut first = BridgeConnection::connect_to(&path).unwrap();
        assert_eq!(first.recv::<TrayMessage>().unwrap(), Some(TrayMessage::RequestFavorites));
        assert!(matches!(rx.blocking_recv(), Some(TrayEvent::Connected)));

        let mut second = BridgeConnection::connect_to(&path).unwrap();
        assert_eq!(second.recv::<TrayMessage>().unwrap(), Some(TrayMessage::RequestFavorites));
        assert!(matches!(rx.blocking_recv(), Some(TrayEvent::Connected)));

        // The superseded manager sees its connection close
        assert!(first.recv::<TrayMessage>().is_err());

        second.send(ManagerMessage::FavoritesCleared).unwrap();
        assert!(matches!(
            rx.blocking_recv(),
            Some(TrayEvent::Message(ManagerMessage::FavoritesCleared))
        ));

        assert!(outbox.send(TrayMessage::ShowManager));
        assert_eq!(second.recv::<TrayMessage>().unwrap(), Some(TrayMessage::ShowManager));

        drop(second);
        assert!(matches!(rx.blocking_recv(), Some(TrayEvent::Disconnected)));
        assert!(!outbox.is_connected());
    }

    #[test]
    fn test_outbox_without_manager() {
        let outbox = Outbox::default();
        assert!(!outbox.send(TrayMessage::Quit));
    }
}
