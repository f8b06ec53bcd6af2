use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};

use co_core::PortalConfig;

use crate::load_config;

/// Write the default config to `path`; refuses to clobber unless `force`.
pub fn init_config_command(path: &str, force: bool) -> Result<()> {
    let target = Path::new(path);
    if target.exists() && !force {
        return Err(anyhow!("Config already exists at {} (pass --force to overwrite)", path));
    }
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir: {}", parent.display()))?;
    }
    let body = PortalConfig::default().to_pretty_string(target)?;
    fs::write(target, body).with_context(|| format!("Failed to write config: {}", path))?;
    println!("Wrote default config to {}", target.display());
    Ok(())
}

/// Print the effective config (file values over defaults) as JSON.
pub fn show_config_command(config_path: Option<&str>) -> Result<()> {
    let config = load_config(config_path)?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
