//! Manager side of the bridge: owns the tray child process and the connection to it

use std::path::PathBuf;
use std::process::{Child, Command};
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use eframe::egui;
use tracing::{debug, error, info, warn};

use super::constants::*;
use super::state::Publisher;
use crate::constants::{ipc, tray};
use crate::ipc::{BridgeConnection, ManagerMessage, TrayMessage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayStatus {
    /// Started with --no-tray
    Disabled,
    Starting,
    Connected,
    Disconnected,
    Exited(Option<i32>),
}

impl TrayStatus {
    pub fn color(&self) -> egui::Color32 {
        match self {
            TrayStatus::Connected => STATUS_RUNNING,
            TrayStatus::Starting => STATUS_STARTING,
            _ => STATUS_STOPPED,
        }
    }

    pub fn label(&self) -> String {
        match self {
            TrayStatus::Disabled => "\u{25CF}  Tray disabled".to_string(),
            TrayStatus::Starting => "\u{25CF}  Tray starting...".to_string(),
            TrayStatus::Connected => "\u{25CF}  Tray connected".to_string(),
            TrayStatus::Disconnected => "\u{25CF}  Tray disconnected".to_string(),
            TrayStatus::Exited(code) => match code {
                Some(code) => format!("\u{25CF}  Tray exited (code {code})"),
                None => "\u{25CF}  Tray exited".to_string(),
            },
        }
    }
}

enum LinkEvent {
    /// Write half of a fresh connection
    Connected(BridgeConnection),
    Message(TrayMessage),
    Disconnected,
    ConnectFailed(String),
}

/// Arguments forwarded to the tray child
#[derive(Debug, Clone, Default)]
pub struct TrayLaunch {
    pub config_dir: Option<PathBuf>,
    pub log_level: Option<String>,
}

pub struct TrayLink {
    launch: TrayLaunch,
    child: Option<Child>,
    writer: Option<BridgeConnection>,
    status: TrayStatus,
    events_tx: Sender<LinkEvent>,
    events_rx: Receiver<LinkEvent>,
    last_health_check: Instant,
}

impl TrayLink {
    pub fn disabled() -> Self {
        let (events_tx, events_rx) = mpsc::channel();
        Self {
            launch: TrayLaunch::default(),
            child: None,
            writer: None,
            status: TrayStatus::Disabled,
            events_tx,
            events_rx,
            last_health_check: Instant::now(),
        }
    }

    /// Attach to a running tray, or start one
    pub fn start(launch: TrayLaunch, ctx: &egui::Context) -> Self {
        let mut link = Self {
            launch,
            ..Self::disabled()
        };
        link.status = TrayStatus::Starting;

        match BridgeConnection::connect() {
            Ok(conn) => {
                info!("Attached to running tray");
                spawn_reader(conn, link.events_tx.clone(), ctx.clone());
            }
            Err(e) => {
                debug!(error = %format!("{e:#}"), "No running tray");
                link.launch_tray(ctx);
            }
        }
        link
    }

    pub fn status(&self) -> TrayStatus {
        self.status
    }

    pub fn is_connected(&self) -> bool {
        self.writer.is_some()
    }

    pub fn child_pid(&self) -> Option<u32> {
        self.child.as_ref().map(Child::id)
    }

    fn launch_tray(&mut self, ctx: &egui::Context) {
        match spawn_tray_process(&self.launch) {
            Ok(child) => {
                info!(pid = child.id(), "Started tray process");
                self.child = Some(child);
                self.status = TrayStatus::Starting;
                spawn_connector(self.events_tx.clone(), ctx.clone());
            }
            Err(e) => {
                error!(error = ?e, "Failed to start tray process");
                self.status = TrayStatus::Exited(None);
            }
        }
    }

    /// Restart the tray after it exited
    pub fn restart(&mut self, ctx: &egui::Context) {
        if matches!(self.status, TrayStatus::Disabled) {
            return;
        }
        self.stop();
        self.launch_tray(ctx);
    }

    /// Drain bridge events; returns the tray commands received since the last call
    pub fn poll(&mut self) -> Vec<TrayMessage> {
        let mut messages = Vec::new();
        while let Ok(event) = self.events_rx.try_recv() {
            match event {
                LinkEvent::Connected(writer) => {
                    info!("Connected to tray");
                    self.writer = Some(writer);
                    self.status = TrayStatus::Connected;
                }
                LinkEvent::Message(message) => messages.push(message),
                LinkEvent::Disconnected => {
                    warn!("Tray connection closed");
                    self.writer = None;
                    self.status = TrayStatus::Disconnected;
                }
                LinkEvent::ConnectFailed(reason) => {
                    warn!(%reason, "Could not connect to tray");
                    self.status = TrayStatus::Disconnected;
                }
            }
        }
        self.poll_child();
        messages
    }

    fn poll_child(&mut self) {
        if self.last_health_check.elapsed() < Duration::from_millis(TRAY_CHECK_INTERVAL_MS) {
            return;
        }
        self.last_health_check = Instant::now();

        if let Some(child) = self.child.as_mut() {
            match child.try_wait() {
                Ok(Some(status)) => {
                    warn!(pid = child.id(), exit = ?status.code(), "Tray process exited");
                    self.child = None;
                    self.writer = None;
                    self.status = TrayStatus::Exited(status.code());
                }
                Ok(None) => {}
                Err(e) => error!(error = ?e, "Failed to query tray status"),
            }
        }
    }

    /// Ask the tray to exit and reap the child
    pub fn stop(&mut self) {
        self.publish(ManagerMessage::Shutdown);
        if let Some(writer) = self.writer.take() {
            writer.shutdown();
        }
        if let Some(child) = self.child.take() {
            if let Err(e) = reap(child) {
                error!(error = ?e, "Failed to stop tray process");
            }
        }
    }
}

impl Publisher for TrayLink {
    fn publish(&mut self, message: ManagerMessage) {
        let Some(writer) = self.writer.as_mut() else {
            debug!(?message, "Tray not connected, update will be pulled on connect");
            return;
        };
        if let Err(e) = writer.send(&message) {
            warn!(error = ?e, "Failed to push to tray");
            writer.shutdown();
            self.writer = None;
            self.status = TrayStatus::Disconnected;
        }
    }
}

fn spawn_tray_process(launch: &TrayLaunch) -> Result<Child> {
    let exe_path = std::env::current_exe().context("Failed to resolve executable path")?;
    let mut command = Command::new(exe_path);
    command.arg(tray::FLAG);
    if let Some(dir) = &launch.config_dir {
        command.arg("--config-dir").arg(dir);
    }
    if let Some(level) = &launch.log_level {
        command.arg("--log-level").arg(level);
    }
    command.spawn().context("Failed to spawn tray process")
}

/// Retry until the tray has bound its socket
fn spawn_connector(events: Sender<LinkEvent>, ctx: egui::Context) {
    std::thread::spawn(move || {
        let mut last_error = String::new();
        for attempt in 1..=ipc::CONNECT_ATTEMPTS {
            std::thread::sleep(Duration::from_millis(ipc::CONNECT_RETRY_MS));
            match BridgeConnection::connect() {
                Ok(conn) => {
                    debug!(attempt, "Tray socket is up");
                    spawn_reader(conn, events, ctx);
                    return;
                }
                Err(e) => last_error = format!("{e:#}"),
            }
        }
        let _ = events.send(LinkEvent::ConnectFailed(last_error));
        ctx.request_repaint();
    });
}

/// Forward tray commands to the UI thread until the connection closes
fn spawn_reader(conn: BridgeConnection, events: Sender<LinkEvent>, ctx: egui::Context) {
    let writer = match conn.try_clone() {
        Ok(writer) => writer,
        Err(e) => {
            let _ = events.send(LinkEvent::ConnectFailed(format!("{e:#}")));
            return;
        }
    };
    if events.send(LinkEvent::Connected(writer)).is_err() {
        return;
    }
    ctx.request_repaint();

    std::thread::spawn(move || {
        let mut reader = conn;
        loop {
            match reader.recv::<TrayMessage>() {
                Ok(Some(message)) => {
                    debug!(?message, "Received tray message");
                    if events.send(LinkEvent::Message(message)).is_err() {
                        return;
                    }
                    ctx.request_repaint();
                }
                Ok(None) => continue,
                Err(e) => {
                    debug!(error = ?e, "Tray reader stopped");
                    let _ = events.send(LinkEvent::Disconnected);
                    ctx.request_repaint();
                    return;
                }
            }
        }
    });
}

/// Wait for the child to exit after Shutdown, escalating to SIGTERM
fn reap(mut child: Child) -> Result<()> {
    let deadline = Instant::now() + Duration::from_millis(TRAY_EXIT_GRACE_MS);
    while Instant::now() < deadline {
        if child.try_wait().context("Failed to poll tray process")?.is_some() {
            return Ok(());
        }
        std::thread::sleep(Duration::from_millis(50));
    }

    let pid = i32::try_from(child.id()).context("Tray PID out of range")?;
    info!(pid, "Tray did not exit, sending SIGTERM");
    nix::sys::signal::kill(nix::unistd::Pid::from_raw(pid), nix::sys::signal::Signal::SIGTERM)
        .context("Failed to signal tray process")?;
    child.wait().context("Failed to wait for tray exit")?;
    Ok(())
}
