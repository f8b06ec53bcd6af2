use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use co_reader::commands::{
    address_command, harvest_command, init_config_command, locators_command, resolve_command,
    show_config_command, ConfigOverrides,
};
use co_reader::{init_logging, DEFAULT_CONFIG_FILE};

/// Certificate of Occupancy date reader.
///
/// This CLI is a thin wrapper around `co-core` (exposed in code as `co_core`).
/// All substantive logic lives in the library so it can be tested thoroughly
/// and reused from other frontends.
#[derive(Parser, Debug)]
#[command(
    name = "co-reader",
    version,
    about = "Find the most recent Certificate of Occupancy date for a NYC building",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve a BIN to the date of its most recent Certificate of Occupancy.
    ///
    /// This will:
    /// - Fetch the certificate listing, waiting out the portal's wait page.
    /// - Download every listed certificate PDF.
    /// - OCR each PDF, extract its text, and take its earliest date.
    /// - Print the latest of those dates.
    Resolve {
        /// Building Identification Number.
        #[arg(long)]
        bin: String,

        /// Borough code: M, X, B, Q, R (or 1-5).
        #[arg(long)]
        region: String,

        /// Config file (JSON or YAML). Defaults to ./co-reader.json when present.
        #[arg(long)]
        config: Option<String>,

        /// Emit the full per-certificate report as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Maximum document requests per certificate.
        #[arg(long)]
        max_attempts: Option<u32>,

        /// Retry the wait page until it clears, with no attempt cap.
        #[arg(long, default_value_t = false, conflicts_with = "max_attempts")]
        unbounded: bool,

        /// Milliseconds between document requests while the wait page is up.
        #[arg(long)]
        pace_ms: Option<u64>,

        /// Certificates processed at once.
        #[arg(long)]
        concurrency: Option<usize>,

        /// Skip OCR and extract text from the downloaded PDF directly.
        #[arg(long, default_value_t = false)]
        passthrough: bool,

        /// Seconds to wait for the listing page to clear the wait page.
        #[arg(long)]
        fetch_timeout_secs: Option<u64>,

        /// Cancel the whole job after this many seconds.
        #[arg(long)]
        timeout_secs: Option<u64>,
    },

    /// List the certificate PDFs on file for a BIN.
    Locators {
        /// Building Identification Number.
        #[arg(long)]
        bin: String,

        /// Config file (JSON or YAML).
        #[arg(long)]
        config: Option<String>,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Print the document URL synthesized for a certificate locator.
    ///
    /// No network access; useful for checking the address encoding.
    Address {
        /// Locator as shown on the listing page (e.g. M1208518-3.PDF).
        #[arg(long)]
        locator: String,

        /// Borough code: M, X, B, Q, R (or 1-5).
        #[arg(long)]
        region: String,

        /// Config file (JSON or YAML).
        #[arg(long)]
        config: Option<String>,

        /// Emit JSON with the individual fields.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Print the earliest MM/DD/YYYY date found in an extracted text file.
    Harvest {
        /// Path to the text file.
        #[arg(long)]
        text_file: String,

        /// Emit JSON with every candidate date.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Write a config file populated with defaults.
    InitConfig {
        /// Destination path; `.yaml`/`.yml` writes YAML, anything else JSON.
        #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
        path: String,

        /// Overwrite an existing file.
        #[arg(long, default_value_t = false)]
        force: bool,
    },

    /// Show the effective configuration as JSON.
    ShowConfig {
        /// Config file (JSON or YAML).
        #[arg(long)]
        config: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Command::Resolve {
            bin,
            region,
            config,
            json,
            max_attempts,
            unbounded,
            pace_ms,
            concurrency,
            passthrough,
            fetch_timeout_secs,
            timeout_secs,
        } => {
            let overrides = ConfigOverrides {
                max_attempts,
                unbounded,
                pace_ms,
                concurrency,
                passthrough,
                fetch_timeout_secs,
            };
            resolve_command(
                &bin,
                &region,
                config.as_deref(),
                &overrides,
                timeout_secs.map(Duration::from_secs),
                json,
            )
            .await?
        }
        Command::Locators { bin, config, json } => {
            locators_command(&bin, config.as_deref(), json).await?
        }
        Command::Address { locator, region, config, json } => {
            address_command(&locator, &region, config.as_deref(), json)?
        }
        Command::Harvest { text_file, json } => harvest_command(&text_file, json)?,
        Command::InitConfig { path, force } => init_config_command(&path, force)?,
        Command::ShowConfig { config } => show_config_command(config.as_deref())?,
    }

    Ok(())
}
