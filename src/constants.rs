//! Application-wide constants
//!
//! This module contains all magic numbers and string literals used throughout
//! the application, providing a single source of truth for constant values.

/// Configuration file store layout
pub mod config {
    /// Directory under the user config dir holding every JSON document
    pub const APP_DIR: &str = "resolution-manager";

    /// Environment override for the config directory
    pub const DIR_ENV: &str = "RESOLUTION_MANAGER_CONFIG_DIR";

    pub const SETTINGS_FILE: &str = "settings.json";
    pub const DEFAULT_RESOLUTIONS_FILE: &str = "defaultResolutions.json";
    pub const CUSTOM_RESOLUTIONS_FILE: &str = "customResolutions.json";
    pub const FAVORITES_FILE: &str = "favorites.json";
    pub const MONITOR_LABELS_FILE: &str = "monitorLabels.json";
    pub const LAST_RESOLUTION_FILE: &str = "lastResolution.json";
    pub const MONITOR_CONFIGURATIONS_FILE: &str = "monitorConfigurations.json";

    /// Resolution written into a freshly created lastResolution.json
    pub const PLACEHOLDER_LAST_RESOLUTION: &str = "1920x1080";
}

/// Resolution catalog constants
pub mod resolutions {
    /// Built-in list written to defaultResolutions.json on first run.
    /// Also served as the mode list when XRandR is unavailable.
    pub const DEFAULTS: [(u32, u32); 9] = [
        (1920, 1080),
        (1680, 1050),
        (1600, 900),
        (1440, 900),
        (1366, 768),
        (1280, 1024),
        (1280, 800),
        (1280, 720),
        (1024, 768),
    ];

    /// Number of recently applied resolutions kept in memory
    pub const RECENT_LIMIT: usize = 5;

    /// Refresh rate shown in the tray for favorites saved without one
    pub const DISPLAY_REFRESH_FALLBACK: u32 = 60;
}

/// Mirror/Sync bridge constants
pub mod ipc {
    /// Socket directory under XDG_RUNTIME_DIR (or the cache dir)
    pub const SOCKET_DIR: &str = "resolution-manager";

    pub const SOCKET_FILE: &str = "tray.sock";

    /// Maximum message size (10 MB) to prevent DoS via memory exhaustion
    pub const MAX_MESSAGE_SIZE: usize = 10 * 1024 * 1024;

    /// Envelope version; envelopes carrying any other version are quarantined
    pub const PROTOCOL_VERSION: u16 = 1;

    /// Connection attempts made by the manager while the tray starts up
    pub const CONNECT_ATTEMPTS: u32 = 40;

    pub const CONNECT_RETRY_MS: u64 = 250;
}

/// System tray presentation
pub mod tray {
    pub const ID: &str = "com.resolution-manager.tray";
    pub const TITLE: &str = "Resolution Manager";
    pub const ICON_NAME: &str = "video-display";
    pub const GLOBAL_GROUP_TITLE: &str = "Global Favorites";

    /// Command-line flag that starts the tray surface
    pub const FLAG: &str = "--tray";
}

/// Display backend constants
pub mod display {
    /// Identifier of the single screen reported by the core X11 fallback
    pub const CORE_SCREEN_ID: &str = "0";

    /// Used to derive physical screen size when growing the X screen
    pub const FALLBACK_DPI: f64 = 96.0;
    pub const MM_PER_INCH: f64 = 25.4;

    /// EDID descriptor tag carrying the monitor name
    pub const EDID_NAME_TAG: u8 = 0xFC;
}

/// XDG autostart integration
pub mod autostart {
    pub const DIR: &str = "autostart";
    pub const DESKTOP_FILE: &str = "resolution-manager.desktop";
}
