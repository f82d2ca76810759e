//! Tray process - StatusNotifier icon mirroring the manager's favorites
//!
//! Owns the bridge socket. Manager messages arrive on a listener thread and are
//! applied to the [`MirrorState`] held by the tray object, one at a time, on a
//! current-thread tokio runtime.

mod ipc_handler;
mod menu;
mod mirror;

pub use mirror::{FavoriteGroup, MirrorState, MirrorUpdate, SurfaceState};

use anyhow::{Context, Result};
use ksni::TrayMethods;
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use tokio::sync::mpsc::{UnboundedSender, unbounded_channel};
use tracing::{debug, info, warn};

use crate::config::ConfigStore;
use crate::ipc::{BridgeServer, ManagerMessage};
use ipc_handler::{Outbox, spawn_ipc_listener};
use menu::ResolutionTray;

/// Inputs to the tray event loop
#[derive(Debug)]
pub enum TrayEvent {
    /// A manager connected and was asked for its sets
    Connected,
    Message(ManagerMessage),
    Disconnected,
    /// Quit chosen from the menu
    Quit,
    /// SIGTERM or SIGINT
    Signal(i32),
}

/// Entry point for `--tray`
pub fn run_tray(store: ConfigStore) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build tray runtime")?;
    runtime.block_on(serve(store))
}

async fn serve(store: ConfigStore) -> Result<()> {
    info!(config_dir = %store.dir().display(), "Starting tray");

    let mut mirror = MirrorState::new();
    mirror.bootstrap(&store);

    let server = BridgeServer::bind().context("Failed to bind tray socket")?;
    let socket_path = server.path().to_path_buf();

    let (event_tx, mut event_rx) = unbounded_channel();
    let outbox = Outbox::default();
    spawn_ipc_listener(server, outbox.clone(), event_tx.clone());
    spawn_signal_listener(event_tx.clone())?;

    let handle = ResolutionTray::new(mirror, outbox.clone(), event_tx)
        .spawn()
        .await
        .context("Failed to register tray icon (is a StatusNotifier host running?)")?;
    info!("Tray icon registered");

    while let Some(event) = event_rx.recv().await {
        match event {
            TrayEvent::Connected => {
                handle.update(|tray| tray.mirror.begin_pull()).await;
            }
            TrayEvent::Message(message) => {
                let update = handle.update(|tray| tray.mirror.apply(message)).await;
                match update {
                    Some(MirrorUpdate::Shutdown) => {
                        info!("Manager requested shutdown");
                        break;
                    }
                    Some(MirrorUpdate::Rebuild) => debug!("Tray menu rebuilt"),
                    Some(MirrorUpdate::Unchanged) => {}
                    None => {
                        warn!("Tray service stopped");
                        break;
                    }
                }
            }
            TrayEvent::Disconnected => {
                info!("Manager went away, keeping last mirrored state");
                handle.update(|tray| tray.mirror.fail_pull()).await;
            }
            TrayEvent::Quit => {
                info!("Quit requested from tray menu");
                break;
            }
            TrayEvent::Signal(signal) => {
                info!(signal, "Received termination signal");
                break;
            }
        }
    }

    handle.update(|tray| tray.mirror.dispose()).await;
    handle.shutdown().await;
    outbox.close();
    // The listener thread stays blocked in accept(), so remove the socket here
    if let Err(e) = std::fs::remove_file(&socket_path) {
        debug!(error = %e, "Socket already removed");
    }
    info!("Tray exiting");
    Ok(())
}

fn spawn_signal_listener(events: UnboundedSender<TrayEvent>) -> Result<()> {
    let mut signals =
        Signals::new([SIGTERM, SIGINT]).context("Failed to register signal handlers")?;
    std::thread::spawn(move || {
        if let Some(signal) = signals.forever().next() {
            let _ = events.send(TrayEvent::Signal(signal));
        }
    });
    Ok(())
}
