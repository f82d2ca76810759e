//! XRandR backend: one monitor per connected output

use anyhow::{Context, Result};
use tracing::{debug, info, warn};
use x11rb::connection::Connection;
use x11rb::protocol::randr::{
    ConnectionExt as RandrExt, Connection as OutputConnection, Crtc, GetOutputInfoReply,
    GetScreenResourcesCurrentReply, ModeFlag, ModeInfo, Output, Rotation, SetConfig,
};
use x11rb::protocol::xproto::{Atom, ConnectionExt as XprotoExt, Window};
use x11rb::rust_connection::RustConnection;

use super::{CapabilityContext, DisplayBackend, normalize_modes};
use crate::constants::display;
use crate::error::{ManagerError, ManagerResult};
use crate::types::{CurrentMode, Monitor, Resolution};

/// Output or CRTC id meaning "none"
const NONE: u32 = 0;

pub struct RandrBackend {
    conn: RustConnection,
    root: Window,
    edid_atom: Atom,
}

/// A connected output with its info, resolved once per request
struct OutputEntry {
    output: Output,
    name: String,
    info: GetOutputInfoReply,
}

impl RandrBackend {
    /// Connect to the X server and require RandR 1.2 or later
    pub fn connect() -> Result<Self> {
        let (conn, screen_num) =
            RustConnection::connect(None).context("Failed to connect to X11 server")?;
        let root = conn
            .setup()
            .roots
            .get(screen_num)
            .context("X11 server reported no screens")?
            .root;

        let version = conn
            .randr_query_version(1, 5)
            .context("Failed to query RandR version")?
            .reply()
            .context("RandR extension not available")?;
        if (version.major_version, version.minor_version) < (1, 2) {
            anyhow::bail!(
                "RandR {}.{} is too old, 1.2 required",
                version.major_version,
                version.minor_version
            );
        }

        let edid_atom = conn
            .intern_atom(false, b"EDID")
            .context("Failed to intern EDID atom")?
            .reply()
            .context("Failed to get reply for EDID atom")?
            .atom;

        info!(
            major = version.major_version,
            minor = version.minor_version,
            "Connected to XRandR"
        );
        Ok(Self {
            conn,
            root,
            edid_atom,
        })
    }

    fn resources(&self) -> ManagerResult<GetScreenResourcesCurrentReply> {
        self.conn
            .randr_get_screen_resources_current(self.root)
            .capability("query screen resources")?
            .reply()
            .capability("read screen resources")
    }

    fn connected_outputs(
        &self,
        resources: &GetScreenResourcesCurrentReply,
    ) -> ManagerResult<Vec<OutputEntry>> {
        let mut outputs = Vec::new();
        for &output in &resources.outputs {
            let info = self
                .conn
                .randr_get_output_info(output, resources.config_timestamp)
                .capability("query output")?
                .reply()
                .capability("read output info")?;
            if info.connection != OutputConnection::CONNECTED {
                continue;
            }
            let name = String::from_utf8_lossy(&info.name).into_owned();
            outputs.push(OutputEntry { output, name, info });
        }
        Ok(outputs)
    }

    fn find_output(
        &self,
        resources: &GetScreenResourcesCurrentReply,
        monitor_id: &str,
    ) -> ManagerResult<OutputEntry> {
        self.connected_outputs(resources)?
            .into_iter()
            .find(|entry| entry.name == monitor_id)
            .ok_or_else(|| ManagerError::not_found(format!("monitor {monitor_id}")))
    }

    fn primary_output(&self) -> Output {
        self.conn
            .randr_get_output_primary(self.root)
            .ok()
            .and_then(|cookie| cookie.reply().ok())
            .map(|reply| reply.output)
            .unwrap_or(NONE)
    }

    /// Monitor model name from the EDID, if the output exposes one
    fn edid_name(&self, output: Output) -> Option<String> {
        let reply = self
            .conn
            .randr_get_output_property(output, self.edid_atom, x11rb::NONE, 0, u32::MAX, false, false)
            .ok()?
            .reply()
            .ok()?;
        if reply.format != 8 {
            return None;
        }
        parse_edid_name(&reply.data)
    }

    fn current_mode(
        &self,
        resources: &GetScreenResourcesCurrentReply,
        crtc: Crtc,
    ) -> ManagerResult<Option<CurrentMode>> {
        if crtc == NONE {
            return Ok(None);
        }
        let info = self
            .conn
            .randr_get_crtc_info(crtc, resources.config_timestamp)
            .capability("query crtc")?
            .reply()
            .capability("read crtc info")?;
        if info.mode == NONE {
            return Ok(None);
        }
        let refresh_rate = resources
            .modes
            .iter()
            .find(|mode| mode.id == info.mode)
            .and_then(refresh_rate)
            .unwrap_or(0);
        Ok(Some(CurrentMode {
            width: u32::from(info.width),
            height: u32::from(info.height),
            x: i32::from(info.x),
            y: i32::from(info.y),
            refresh_rate,
        }))
    }

    /// CRTC driving the output, or a free one it can use
    fn crtc_for(
        &self,
        resources: &GetScreenResourcesCurrentReply,
        entry: &OutputEntry,
    ) -> ManagerResult<Crtc> {
        if entry.info.crtc != NONE {
            return Ok(entry.info.crtc);
        }
        for &crtc in &entry.info.crtcs {
            let info = self
                .conn
                .randr_get_crtc_info(crtc, resources.config_timestamp)
                .capability("query crtc")?
                .reply()
                .capability("read crtc info")?;
            if info.outputs.is_empty() {
                return Ok(crtc);
            }
        }
        Err(ManagerError::capability(format!(
            "no free CRTC for output {}",
            entry.name
        )))
    }

    /// Grow the X screen when the new mode would not fit
    fn ensure_screen_size(&self, right: u32, bottom: u32) -> ManagerResult<()> {
        let geometry = self
            .conn
            .get_geometry(self.root)
            .capability("query root geometry")?
            .reply()
            .capability("read root geometry")?;
        let width = right.max(u32::from(geometry.width));
        let height = bottom.max(u32::from(geometry.height));
        if width == u32::from(geometry.width) && height == u32::from(geometry.height) {
            return Ok(());
        }
        let (w, h) = (
            u16::try_from(width).capability("screen width")?,
            u16::try_from(height).capability("screen height")?,
        );
        debug!(width, height, "Growing X screen");
        self.conn
            .randr_set_screen_size(self.root, w, h, millimeters(width), millimeters(height))
            .capability("resize screen")?
            .check()
            .capability("resize screen")
    }
}

impl DisplayBackend for RandrBackend {
    fn name(&self) -> &'static str {
        "xrandr"
    }

    fn enumerate(&self) -> ManagerResult<Vec<Monitor>> {
        let resources = self.resources()?;
        let primary = self.primary_output();
        let mut monitors = Vec::new();
        for entry in self.connected_outputs(&resources)? {
            let current_mode = self.current_mode(&resources, entry.info.crtc)?;
            let name = self
                .edid_name(entry.output)
                .unwrap_or_else(|| entry.name.clone());
            monitors.push(Monitor {
                id: entry.name,
                name,
                current_mode,
                is_primary: entry.output == primary,
            });
        }

        // No explicit primary: treat the first active output as primary
        if !monitors.iter().any(|m| m.is_primary) {
            if let Some(first) = monitors.iter_mut().find(|m| m.current_mode.is_some()) {
                first.is_primary = true;
            }
        }
        debug!(count = monitors.len(), "Enumerated monitors");
        Ok(monitors)
    }

    fn available_modes(&self, monitor_id: &str) -> ManagerResult<Vec<Resolution>> {
        let resources = self.resources()?;
        let entry = self.find_output(&resources, monitor_id)?;
        let modes = output_modes(&resources.modes, &entry.info.modes)
            .filter_map(|mode| {
                Resolution::new(
                    u32::from(mode.width),
                    u32::from(mode.height),
                    refresh_rate(mode),
                )
                .ok()
            })
            .collect();
        Ok(normalize_modes(modes))
    }

    fn apply(&self, monitor_id: &str, resolution: &Resolution) -> ManagerResult<()> {
        let resources = self.resources()?;
        let entry = self.find_output(&resources, monitor_id)?;
        let mode = select_mode(output_modes(&resources.modes, &entry.info.modes), resolution)
            .ok_or_else(|| {
                ManagerError::capability(format!("{resolution} is not supported by {monitor_id}"))
            })?;

        let crtc = self.crtc_for(&resources, &entry)?;
        let crtc_info = self
            .conn
            .randr_get_crtc_info(crtc, resources.config_timestamp)
            .capability("query crtc")?
            .reply()
            .capability("read crtc info")?;

        // Keep position and rotation; a monitor without a CRTC is placed at the origin
        let rotation = if crtc_info.mode == NONE {
            Rotation::ROTATE0
        } else {
            crtc_info.rotation
        };
        let (x, y) = (crtc_info.x, crtc_info.y);
        let (mut width, mut height) = (u32::from(mode.width), u32::from(mode.height));
        if is_rotated(rotation) {
            std::mem::swap(&mut width, &mut height);
        }
        let right = u32::try_from(i32::from(x).max(0)).unwrap_or(0) + width;
        let bottom = u32::try_from(i32::from(y).max(0)).unwrap_or(0) + height;
        self.ensure_screen_size(right, bottom)?;

        let reply = self
            .conn
            .randr_set_crtc_config(
                crtc,
                x11rb::CURRENT_TIME,
                resources.config_timestamp,
                x,
                y,
                mode.id,
                rotation,
                &[entry.output],
            )
            .capability("set crtc config")?
            .reply()
            .capability("set crtc config")?;
        if reply.status != SetConfig::SUCCESS {
            return Err(ManagerError::capability(format!(
                "X server refused {resolution} on {monitor_id} ({:?})",
                reply.status
            )));
        }

        info!(monitor = %monitor_id, mode = %resolution, "Applied mode");
        Ok(())
    }
}

/// Mode infos for the output's mode ids, preferred modes first
fn output_modes<'a>(
    all: &'a [ModeInfo],
    ids: &'a [u32],
) -> impl Iterator<Item = &'a ModeInfo> + 'a {
    ids.iter()
        .filter_map(move |id| all.iter().find(|mode| mode.id == *id))
}

/// Vertical refresh in whole Hz
fn refresh_rate(mode: &ModeInfo) -> Option<u32> {
    let mut vtotal = f64::from(mode.vtotal);
    let flags = u32::from(mode.mode_flags);
    if flags & u32::from(ModeFlag::DOUBLE_SCAN) != 0 {
        vtotal *= 2.0;
    }
    if flags & u32::from(ModeFlag::INTERLACE) != 0 {
        vtotal /= 2.0;
    }
    let total = f64::from(mode.htotal) * vtotal;
    if total <= 0.0 {
        return None;
    }
    let rate = (f64::from(mode.dot_clock) / total).round();
    (rate >= 1.0).then_some(rate as u32)
}

/// Exact size and refresh when one is given, otherwise the fastest mode of that size.
/// Ties keep the earliest (preferred) mode.
fn select_mode<'a>(
    modes: impl Iterator<Item = &'a ModeInfo>,
    resolution: &Resolution,
) -> Option<&'a ModeInfo> {
    let mut best: Option<(&ModeInfo, u32)> = None;
    for mode in modes {
        if u32::from(mode.width) != resolution.width || u32::from(mode.height) != resolution.height
        {
            continue;
        }
        let rate = refresh_rate(mode).unwrap_or(0);
        match resolution.refresh_rate {
            Some(wanted) if rate == wanted => return Some(mode),
            Some(_) => continue,
            None => {
                if best.is_none_or(|(_, best_rate)| rate > best_rate) {
                    best = Some((mode, rate));
                }
            }
        }
    }
    best.map(|(mode, _)| mode)
}

fn is_rotated(rotation: Rotation) -> bool {
    let bits = u32::from(rotation);
    bits & (u32::from(Rotation::ROTATE90) | u32::from(Rotation::ROTATE270)) != 0
}

fn millimeters(pixels: u32) -> u32 {
    (f64::from(pixels) * display::MM_PER_INCH / display::FALLBACK_DPI).round() as u32
}

/// Monitor name from the EDID display descriptor blocks
fn parse_edid_name(edid: &[u8]) -> Option<String> {
    if edid.len() < 128 {
        return None;
    }
    edid[54..126]
        .chunks_exact(18)
        .filter(|block| block[0] == 0 && block[1] == 0 && block[3] == display::EDID_NAME_TAG)
        .map(|block| {
            let text: Vec<u8> = block[5..18]
                .iter()
                .copied()
                .take_while(|&b| b != 0x0A && b != 0x00)
                .collect();
            String::from_utf8_lossy(&text).trim().to_string()
        })
        .find(|name| !name.is_empty())
}
