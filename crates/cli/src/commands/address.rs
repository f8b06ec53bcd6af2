use anyhow::{Context, Result};
use serde::Serialize;

use co_core::model::{DocumentLocator, RegionCode};
use co_core::services::address::synthesize;

use crate::load_config;

#[derive(Debug, Serialize)]
pub struct AddressInfo {
    pub locator: String,
    pub stripped: String,
    pub region: RegionCode,
    pub field3: String,
    pub field4: String,
    pub url: String,
}

/// Build the address info for `locator` without printing it.
pub fn address_info(locator: &str, region: &str, config_path: Option<&str>) -> Result<AddressInfo> {
    let config = load_config(config_path)?;
    let region: RegionCode = region.parse()?;
    let locator = DocumentLocator::new(locator.trim());
    let address =
        synthesize(&locator, region, &config.document_endpoint(), &config.request_id)?;
    let url = address.to_url().context("Failed to render document URL")?;
    Ok(AddressInfo {
        locator: locator.to_string(),
        stripped: locator.stripped().to_string(),
        region,
        field3: address.field3,
        field4: address.field4,
        url,
    })
}

/// Print the synthesized document URL for a locator (no network access).
pub fn address_command(
    locator: &str,
    region: &str,
    config_path: Option<&str>,
    json: bool,
) -> Result<()> {
    let info = address_info(locator, region, config_path)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        println!("{}", info.url);
    }
    Ok(())
}
