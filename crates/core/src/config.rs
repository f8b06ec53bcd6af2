use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};

/// Env var overriding the OCR tool path.
pub const OCR_BIN_ENV: &str = "CO_READER_OCR_BIN";
/// Env var overriding the text extraction tool path.
pub const TEXT_BIN_ENV: &str = "CO_READER_TEXT_BIN";

/// How a downloaded document is made text-extractable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizeMode {
    /// Re-rasterize and OCR the document to strip its access lock.
    #[default]
    Ocr,
    /// Hand the downloaded file straight to text extraction.
    Passthrough,
}

/// Retry pacing for the document endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub pace_ms: u64,
    /// `None` retries until the wait page clears (or `max_wait_secs` elapses).
    pub max_attempts: Option<u32>,
    pub max_wait_secs: Option<u64>,
    /// Cap for responses that match neither the document nor a known marker.
    pub unrecognized_max_attempts: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { pace_ms: 5_000, max_attempts: Some(60), max_wait_secs: None, unrecognized_max_attempts: 3 }
    }
}

/// External tool commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolPaths {
    pub ocr: String,
    pub text: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self { ocr: "pypdfocr".to_string(), text: "pdf2txt.py".to_string() }
    }
}

impl ToolPaths {
    /// Resolve the OCR tool, preferring `CO_READER_OCR_BIN` when set.
    pub fn ocr_path(&self) -> PathBuf {
        std::env::var_os(OCR_BIN_ENV).map(PathBuf::from).unwrap_or_else(|| PathBuf::from(&self.ocr))
    }

    /// Resolve the text tool, preferring `CO_READER_TEXT_BIN` when set.
    pub fn text_path(&self) -> PathBuf {
        std::env::var_os(TEXT_BIN_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(&self.text))
    }
}

/// Serializable configuration for talking to the Building Information System.
///
/// Every field has a default, so an empty file (or no file at all) is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    /// Portal root, without a trailing slash.
    pub base_url: String,
    /// Locator-listing servlet, relative to `base_url`.
    pub listing_path: String,
    /// Document-content servlet, relative to `base_url`.
    pub document_path: String,
    /// Page title that only appears once the interstitial has cleared.
    pub ready_title: String,
    pub fetch_timeout_secs: u64,
    pub fetch_poll_interval_ms: u64,
    pub wait_marker: String,
    pub not_found_marker: String,
    /// Only this many leading body bytes are inspected for markers.
    pub marker_scan_bytes: usize,
    pub expected_content_type: String,
    pub retry: RetryConfig,
    /// Constant `requestid` sent to the document endpoint.
    pub request_id: String,
    pub tools: ToolPaths,
    pub normalize: NormalizeMode,
    pub max_concurrent_documents: usize,
    pub user_agent: String,
    pub http_timeout_secs: u64,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: "http://a810-bisweb.nyc.gov/bisweb".to_string(),
            listing_path: "COsByLocationServlet".to_string(),
            document_path: "CofoDocumentContentServlet".to_string(),
            ready_title: "Property Overview".to_string(),
            fetch_timeout_secs: 10,
            fetch_poll_interval_ms: 1_000,
            wait_marker: "waiting-main".to_string(),
            not_found_marker: "java.io.FileNotFoundException".to_string(),
            marker_scan_bytes: 500,
            expected_content_type: "application/pdf".to_string(),
            retry: RetryConfig::default(),
            request_id: "5".to_string(),
            tools: ToolPaths::default(),
            normalize: NormalizeMode::Ocr,
            max_concurrent_documents: 1,
            user_agent: format!("co-reader/{}", env!("CARGO_PKG_VERSION")),
            http_timeout_secs: 30,
        }
    }
}

impl PortalConfig {
    /// Load a config file; `.yaml`/`.yml` are read as YAML, anything else as JSON.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let body = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config at {}", path.display()))?;
        if is_yaml(path) {
            serde_yaml::from_str(&body)
                .with_context(|| format!("Failed to parse YAML config at {}", path.display()))
        } else {
            serde_json::from_str(&body)
                .with_context(|| format!("Failed to parse JSON config at {}", path.display()))
        }
    }

    /// Load from `path` when given, otherwise fall back to defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn to_pretty_string(&self, path: &Path) -> Result<String> {
        if is_yaml(path) {
            serde_yaml::to_string(self).context("Failed to serialize config as YAML")
        } else {
            serde_json::to_string_pretty(self).context("Failed to serialize config as JSON")
        }
    }

    pub fn listing_url(&self, bin: &str) -> Result<String> {
        let base = format!("{}/{}", self.base_url, self.listing_path);
        let mut url =
            Url::parse(&base).with_context(|| format!("Invalid listing endpoint: {base}"))?;
        url.query_pairs_mut().append_pair("requestid", "").append_pair("allbin", bin);
        Ok(url.to_string())
    }

    pub fn document_endpoint(&self) -> String {
        format!("{}/{}", self.base_url, self.document_path)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn fetch_poll_interval(&self) -> Duration {
        Duration::from_millis(self.fetch_poll_interval_ms)
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase()).as_deref(),
        Some("yaml") | Some("yml")
    )
}
