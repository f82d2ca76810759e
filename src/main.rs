#![forbid(unsafe_code)]

mod autostart;
mod catalog;
mod config;
mod constants;
mod display;
mod error;
mod favorites;
mod gui;
mod ipc;
mod labels;
mod tray;
mod types;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{Level as TraceLevel, info};
use tracing_subscriber::FmtSubscriber;

use config::ConfigStore;
use gui::{ManagerOptions, TrayLaunch};

/// Switch monitor resolutions from a window or the system tray
#[derive(Debug, Parser)]
#[command(name = "resolution-manager", version, about)]
struct Cli {
    /// Run the tray process instead of the manager window
    #[arg(long)]
    tray: bool,

    /// Run the manager window without starting a tray
    #[arg(long, conflicts_with = "tray")]
    no_tray: bool,

    /// Directory holding the JSON configuration files
    #[arg(long, env = constants::config::DIR_ENV)]
    config_dir: Option<PathBuf>,

    /// trace, debug, info, warn or error (defaults to LOG_LEVEL, then settings.json)
    #[arg(long)]
    log_level: Option<String>,
}

fn parse_level(level: &str) -> TraceLevel {
    match level.to_lowercase().as_str() {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let store = ConfigStore::new(cli.config_dir.clone().unwrap_or_else(ConfigStore::default_dir));

    // Flag, then LOG_LEVEL, then the persisted setting
    let level_name = cli
        .log_level
        .clone()
        .or_else(|| std::env::var("LOG_LEVEL").ok())
        .or_else(|| store.read_log_level())
        .unwrap_or_else(|| "info".to_string());

    let subscriber = FmtSubscriber::builder()
        .with_max_level(parse_level(&level_name))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if cli.tray {
        info!("Starting in tray mode");
        return tray::run_tray(store);
    }

    info!(config_dir = %store.dir().display(), "Starting manager");
    gui::run_manager(ManagerOptions {
        launch: TrayLaunch {
            config_dir: cli.config_dir,
            log_level: cli.log_level,
        },
        tray: !cli.no_tray,
        store,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_tray_flag() {
        let cli = Cli::try_parse_from(["resolution-manager", "--tray", "--log-level", "debug"]).unwrap();
        assert!(cli.tray);
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_tray_and_no_tray_conflict() {
        assert!(Cli::try_parse_from(["resolution-manager", "--tray", "--no-tray"]).is_err());
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("DEBUG"), TraceLevel::DEBUG);
        assert_eq!(parse_level("verbose"), TraceLevel::INFO);
    }
}
