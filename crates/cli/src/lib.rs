//! co-reader CLI library.
//!
//! Command implementations live here (rather than in `main.rs`) so tests can
//! call them directly. All pipeline logic lives in `co_core`.

pub mod commands;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use co_core::PortalConfig;

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "co-reader.json";

/// Resolve which config file to read, if any.
///
/// An explicit path must exist; the default file is only used when present.
pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
    match explicit {
        Some(p) => Some(PathBuf::from(p)),
        None => {
            let default = Path::new(DEFAULT_CONFIG_FILE);
            default.is_file().then(|| default.to_path_buf())
        }
    }
}

/// Load the effective portal config for a command.
pub fn load_config(explicit: Option<&str>) -> Result<PortalConfig> {
    let path = resolve_config_path(explicit);
    PortalConfig::load_or_default(path.as_deref())
        .with_context(|| format!("Failed to load config {}", path_label(path.as_deref())))
}

fn path_label(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string()).unwrap_or_else(|| "(defaults)".to_string())
}

/// Install the stderr `tracing` subscriber; `RUST_LOG` overrides the default `info` level.
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
