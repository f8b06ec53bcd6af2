use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::config::PortalConfig;
use crate::model::RawDocument;
use crate::services::address::{AddressError, RetrievalAddress};
use crate::services::cancel::CancelSignal;
use crate::services::transport::{HttpResponse, HttpTransport, TransportError};

/// Bounded pacing for the document endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub pace: Duration,
    /// Total requests allowed; `None` is unbounded.
    pub max_attempts: Option<u32>,
    pub max_wait: Option<Duration>,
    pub unrecognized_max_attempts: u32,
}

impl RetryPolicy {
    pub fn from_config(config: &PortalConfig) -> Self {
        Self {
            pace: Duration::from_millis(config.retry.pace_ms),
            max_attempts: config.retry.max_attempts,
            max_wait: config.retry.max_wait_secs.map(Duration::from_secs),
            unrecognized_max_attempts: config.retry.unrecognized_max_attempts.max(1),
        }
    }
}

/// How a single document-endpoint response is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseClass {
    Success,
    PermanentNotFound,
    TransientWait,
    Unrecognized,
}

/// Markers used to classify document-endpoint responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseMarkers {
    pub expected_content_type: String,
    pub not_found: String,
    pub wait: String,
    pub scan_bytes: usize,
}

impl ResponseMarkers {
    pub fn from_config(config: &PortalConfig) -> Self {
        Self {
            expected_content_type: config.expected_content_type.to_ascii_lowercase(),
            not_found: config.not_found_marker.clone(),
            wait: config.wait_marker.clone(),
            scan_bytes: config.marker_scan_bytes,
        }
    }

    pub fn classify(&self, response: &HttpResponse) -> ResponseClass {
        if response.media_type() == self.expected_content_type {
            return ResponseClass::Success;
        }
        let end = response.body.len().min(self.scan_bytes);
        let head = String::from_utf8_lossy(&response.body[..end]);
        if head.contains(self.not_found.as_str()) {
            ResponseClass::PermanentNotFound
        } else if head.contains(self.wait.as_str()) {
            ResponseClass::TransientWait
        } else {
            ResponseClass::Unrecognized
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// `retries` counts the paced re-requests before success.
    Downloaded { document: RawDocument, retries: u32 },
    NotFound,
    GaveUp { attempts: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DownloadError {
    #[error(transparent)]
    Address(#[from] AddressError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("Download cancelled")]
    Cancelled,
}

/// Re-requests a synthesized address until the PDF arrives.
pub struct PollingDownloader {
    transport: Arc<dyn HttpTransport>,
    policy: RetryPolicy,
    markers: ResponseMarkers,
}

impl PollingDownloader {
    pub fn new(transport: Arc<dyn HttpTransport>, policy: RetryPolicy, markers: ResponseMarkers) -> Self {
        Self { transport, policy, markers }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub async fn download(
        &self,
        address: &RetrievalAddress,
        cancel: &mut CancelSignal,
    ) -> Result<DownloadOutcome, DownloadError> {
        let url = address.to_url()?;
        let locator = address.locator.as_str();
        let started = Instant::now();
        let mut attempts = 0u32;
        let mut unrecognized = 0u32;

        loop {
            if cancel.is_cancelled() {
                return Err(DownloadError::Cancelled);
            }
            attempts += 1;
            let response = tokio::select! {
                _ = cancel.cancelled() => return Err(DownloadError::Cancelled),
                r = self.transport.get(&url) => r?,
            };

            match self.markers.classify(&response) {
                ResponseClass::Success => {
                    info!(locator, attempts, "certificate retrieved");
                    let document = RawDocument {
                        locator: address.locator.clone(),
                        content_type: response.content_type,
                        bytes: response.body,
                    };
                    return Ok(DownloadOutcome::Downloaded { document, retries: attempts - 1 });
                }
                ResponseClass::PermanentNotFound => {
                    warn!(locator, "portal reported file not found; address encoding is likely wrong");
                    return Ok(DownloadOutcome::NotFound);
                }
                ResponseClass::TransientWait => {
                    debug!(locator, attempts, "got the wait page");
                }
                ResponseClass::Unrecognized => {
                    unrecognized += 1;
                    warn!(
                        locator,
                        attempts,
                        status = response.status,
                        content_type = %response.content_type,
                        "unrecognized response; treating as wait page"
                    );
                    if unrecognized >= self.policy.unrecognized_max_attempts {
                        return Ok(DownloadOutcome::GaveUp { attempts });
                    }
                }
            }

            if self.policy.max_attempts.is_some_and(|max| attempts >= max) {
                warn!(locator, attempts, "retry budget exhausted");
                return Ok(DownloadOutcome::GaveUp { attempts });
            }
            if let Some(max_wait) = self.policy.max_wait {
                if started.elapsed() + self.policy.pace > max_wait {
                    warn!(locator, attempts, "wait budget exhausted");
                    return Ok(DownloadOutcome::GaveUp { attempts });
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => return Err(DownloadError::Cancelled),
                _ = sleep(self.policy.pace) => {}
            }
        }
    }
}
