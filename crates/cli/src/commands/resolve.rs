use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::warn;

use co_core::config::NormalizeMode;
use co_core::model::{LocatorOutcome, Resolution};
use co_core::{cancel_pair, BuildingId, CertificateResolver, PortalConfig, RegionCode};

use crate::load_config;

/// Flags that override values from the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub max_attempts: Option<u32>,
    pub unbounded: bool,
    pub pace_ms: Option<u64>,
    pub concurrency: Option<usize>,
    pub passthrough: bool,
    pub fetch_timeout_secs: Option<u64>,
}

impl ConfigOverrides {
    pub fn apply(&self, config: &mut PortalConfig) {
        if self.unbounded {
            config.retry.max_attempts = None;
        } else if let Some(n) = self.max_attempts {
            config.retry.max_attempts = Some(n);
        }
        if let Some(pace) = self.pace_ms {
            config.retry.pace_ms = pace;
        }
        if let Some(n) = self.concurrency {
            config.max_concurrent_documents = n.max(1);
        }
        if self.passthrough {
            config.normalize = NormalizeMode::Passthrough;
        }
        if let Some(secs) = self.fetch_timeout_secs {
            config.fetch_timeout_secs = secs;
        }
    }
}

fn build_resolver(config_path: Option<&str>, overrides: &ConfigOverrides) -> Result<CertificateResolver> {
    let mut config = load_config(config_path)?;
    overrides.apply(&mut config);
    CertificateResolver::from_config(config).context("Failed to initialize HTTP client")
}

/// Resolve a building to its most recent certificate date.
///
/// Ctrl-C cancels the job; `job_timeout` bounds the whole run.
pub async fn resolve_command(
    bin: &str,
    region: &str,
    config_path: Option<&str>,
    overrides: &ConfigOverrides,
    job_timeout: Option<Duration>,
    json: bool,
) -> Result<()> {
    let bin = BuildingId::new(bin)?;
    let region: RegionCode = region.parse()?;
    let resolver = build_resolver(config_path, overrides)?;

    let (handle, signal) = cancel_pair();
    let ctrl_c = handle.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!("interrupt received; cancelling");
            ctrl_c.cancel();
        }
    });
    if let Some(limit) = job_timeout {
        let timer = handle.clone();
        tokio::spawn(async move {
            tokio::time::sleep(limit).await;
            warn!(secs = limit.as_secs(), "job timeout reached; cancelling");
            timer.cancel();
        });
    }

    let resolution = resolver
        .resolve(&bin, region, signal)
        .await
        .with_context(|| format!("Failed to resolve BIN {bin}"))?;
    print_resolution(&resolution, json)
}

pub fn print_resolution(resolution: &Resolution, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(resolution)?);
        return Ok(());
    }
    match resolution.date {
        Some(date) => println!("{date}"),
        None => println!("No certificate date found"),
    }
    eprintln!("{}", outcome_summary(resolution));
    Ok(())
}

/// Summarize per-locator outcomes for human output.
pub fn outcome_summary(resolution: &Resolution) -> String {
    let mut dated = 0;
    let mut undated = 0;
    let mut failed = 0;
    for report in &resolution.locators {
        match report.outcome {
            LocatorOutcome::Dated(_) => dated += 1,
            LocatorOutcome::NoDates => undated += 1,
            LocatorOutcome::Failed(_) => failed += 1,
        }
    }
    format!(
        "{} certificate(s): {dated} dated, {undated} without dates, {failed} failed",
        resolution.locators.len()
    )
}

/// List the certificate locators on file for a building.
pub async fn locators_command(bin: &str, config_path: Option<&str>, json: bool) -> Result<()> {
    let bin = BuildingId::new(bin)?;
    let resolver = build_resolver(config_path, &ConfigOverrides::default())?;
    let (_handle, mut signal) = cancel_pair();
    let (page, locators) = resolver
        .list_locators(&bin, &mut signal)
        .await
        .with_context(|| format!("Failed to list certificates for BIN {bin}"))?;
    if page.timed_out() {
        warn!("listing never cleared the wait page; results may be incomplete");
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&locators)?);
        return Ok(());
    }
    if locators.is_empty() {
        println!("Certificates: (none)");
        return Ok(());
    }
    println!("Certificates:");
    for locator in locators {
        println!("- {locator}");
    }
    Ok(())
}
