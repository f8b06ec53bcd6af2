use std::fs;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;

use co_core::services::harvest::{candidate_dates, harvest};

#[derive(Debug, Serialize)]
pub struct HarvestInfo {
    pub earliest: Option<NaiveDate>,
    pub candidates: Vec<NaiveDate>,
}

/// Harvest dates from extracted certificate text on disk.
pub fn harvest_file(path: &str) -> Result<HarvestInfo> {
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read {path}"))?;
    Ok(HarvestInfo { earliest: harvest(&text), candidates: candidate_dates(&text) })
}

pub fn harvest_command(path: &str, json: bool) -> Result<()> {
    let info = harvest_file(path)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }
    match info.earliest {
        Some(date) => println!("{date}"),
        None => println!("No date found"),
    }
    Ok(())
}
