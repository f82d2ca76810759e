//! IPC (Inter-Process Communication) via Unix sockets
//!
//! Carries the Mirror/Sync bridge between the manager window and the tray process.
//! The tray owns the socket; the manager connects to it. Frames are length-prefixed
//! JSON (u32 little-endian) wrapped in a versioned [`Envelope`].

use anyhow::{Context, Result, anyhow};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::{Read, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

mod messages;
pub use messages::{Envelope, Inbound, ManagerMessage, TrayMessage};

use crate::constants::ipc::{MAX_MESSAGE_SIZE, PROTOCOL_VERSION, SOCKET_DIR, SOCKET_FILE};

/// Get default socket path (XDG_RUNTIME_DIR with fallback to cache)
pub fn default_socket_path() -> Result<PathBuf> {
    let base = match std::env::var_os("XDG_RUNTIME_DIR") {
        Some(runtime_dir) => PathBuf::from(runtime_dir),
        None => dirs::cache_dir()
            .context("Failed to determine cache directory (no XDG_RUNTIME_DIR or HOME)")?,
    };
    Ok(base.join(SOCKET_DIR).join(SOCKET_FILE))
}

/// One end of an established bridge connection
pub struct BridgeConnection {
    stream: UnixStream,
}

impl BridgeConnection {
    /// Connect to the tray socket
    pub fn connect() -> Result<Self> {
        let path = default_socket_path()?;
        Self::connect_to(&path)
    }

    /// Connect to specific socket path
    pub fn connect_to(path: &Path) -> Result<Self> {
        let stream = UnixStream::connect(path)
            .with_context(|| format!("Failed to connect to tray at {}", path.display()))?;
        Ok(Self { stream })
    }

    pub fn from_stream(stream: UnixStream) -> Self {
        Self { stream }
    }

    /// Second handle on the same socket, so reads and writes can live on
    /// different threads
    pub fn try_clone(&self) -> Result<Self> {
        let stream = self
            .stream
            .try_clone()
            .context("Failed to clone bridge socket")?;
        Ok(Self { stream })
    }

    pub fn send<M: Serialize>(&mut self, message: M) -> Result<()> {
        write_frame(&mut self.stream, &Envelope::new(message))
    }

    /// Block for the next frame. `Ok(None)` means the frame was quarantined;
    /// `Err` means the connection is gone.
    pub fn recv<M: DeserializeOwned + Inbound>(&mut self) -> Result<Option<M>> {
        let frame = read_frame(&mut self.stream)?;
        Ok(decode(&frame))
    }

    /// Close both directions; a reader blocked on the other handle wakes with EOF
    pub fn shutdown(&self) {
        let _ = self.stream.shutdown(std::net::Shutdown::Both);
    }
}

/// Listening side, owned by the tray process
pub struct BridgeServer {
    listener: UnixListener,
    socket_path: PathBuf,
}

impl BridgeServer {
    /// Create server and bind to default socket path
    pub fn bind() -> Result<Self> {
        let socket_path = default_socket_path()?;
        Self::bind_to(socket_path)
    }

    /// Create server and bind to specific socket path
    pub fn bind_to(socket_path: PathBuf) -> Result<Self> {
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create socket directory: {}", parent.display())
            })?;
        }

        // Remove stale socket if exists
        if socket_path.exists() {
            std::fs::remove_file(&socket_path).with_context(|| {
                format!("Failed to remove stale socket: {}", socket_path.display())
            })?;
        }

        let listener = UnixListener::bind(&socket_path)
            .with_context(|| format!("Failed to bind socket at {}", socket_path.display()))?;

        // Owner only
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&socket_path, std::fs::Permissions::from_mode(0o700))
                .context("Failed to set socket permissions")?;
        }

        Ok(Self {
            listener,
            socket_path,
        })
    }

    /// Accept incoming connection (blocking)
    pub fn accept(&self) -> Result<BridgeConnection> {
        let (stream, _addr) = self
            .listener
            .accept()
            .context("Failed to accept IPC connection")?;
        Ok(BridgeConnection { stream })
    }

    pub fn path(&self) -> &Path {
        &self.socket_path
    }
}

impl Drop for BridgeServer {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

/// Write length-prefixed message to stream
pub fn write_frame<W: Write, T: Serialize>(stream: &mut W, msg: &T) -> Result<()> {
    let json = serde_json::to_vec(msg).context("Failed to serialize message to JSON")?;
    if json.len() > MAX_MESSAGE_SIZE {
        return Err(anyhow!(
            "Message too large: {} bytes (max: {})",
            json.len(),
            MAX_MESSAGE_SIZE
        ));
    }

    let len = u32::try_from(json.len()).context("Message length exceeds u32")?;
    stream
        .write_all(&len.to_le_bytes())
        .context("Failed to write message length")?;
    stream
        .write_all(&json)
        .context("Failed to write message payload")?;
    stream.flush().context("Failed to flush stream")?;

    Ok(())
}

/// Read one length-prefixed frame from stream
pub fn read_frame<R: Read>(stream: &mut R) -> Result<Vec<u8>> {
    let mut len_buf = [0u8; 4];
    stream
        .read_exact(&mut len_buf)
        .context("Failed to read message length")?;
    let len = u32::from_le_bytes(len_buf) as usize;

    // Sanity check (prevent DoS via huge allocation)
    if len > MAX_MESSAGE_SIZE {
        return Err(anyhow!(
            "Message too large: {} bytes (max: {})",
            len,
            MAX_MESSAGE_SIZE
        ));
    }

    let mut json_buf = vec![0u8; len];
    stream
        .read_exact(&mut json_buf)
        .context("Failed to read message payload")?;
    Ok(json_buf)
}

/// Decode a frame, quarantining malformed or wrong-version envelopes
pub fn decode<M: DeserializeOwned + Inbound>(frame: &[u8]) -> Option<M> {
    let envelope: Envelope<serde_json::Value> = match serde_json::from_slice(frame) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!(error = %e, "Quarantined malformed envelope");
            return None;
        }
    };
    if envelope.version != PROTOCOL_VERSION {
        warn!(
            version = envelope.version,
            expected = PROTOCOL_VERSION,
            "Quarantined envelope with unsupported version"
        );
        return None;
    }
    match serde_json::from_value::<M>(envelope.message) {
        Ok(message) => message.sanitize(),
        Err(e) => {
            warn!(error = %e, "Quarantined envelope with unknown message");
            debug!(frame = %String::from_utf8_lossy(frame), "Quarantined frame");
            None
        }
    }
}
