use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use scraper::{Html, Selector};
use tokio::time::{sleep, timeout_at, Instant};
use tracing::{debug, warn};

use crate::services::transport::{HttpTransport, TransportError};

/// Signal that the portal has served the real page rather than the interstitial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadyCondition {
    /// The document `<title>` equals this text (whitespace-trimmed).
    TitleIs(String),
    /// The page contains this marker.
    Contains(String),
    /// The page does not contain this marker.
    Lacks(String),
}

impl ReadyCondition {
    pub fn is_ready(&self, page: &str) -> bool {
        match self {
            ReadyCondition::TitleIs(expected) => page_title(page).as_deref() == Some(expected.trim()),
            ReadyCondition::Contains(marker) => page.contains(marker.as_str()),
            ReadyCondition::Lacks(marker) => !page.contains(marker.as_str()),
        }
    }
}

fn page_title(page: &str) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    let document = Html::parse_document(page);
    let title = document.select(&selector).next()?;
    Some(title.text().collect::<String>().trim().to_string())
}

/// Page content plus whether the ready condition was met before the deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub content: String,
    pub ready: bool,
    pub attempts: u32,
}

impl FetchedPage {
    pub fn timed_out(&self) -> bool {
        !self.ready
    }
}

/// "Fetch a page, block until ready or timeout."
///
/// A timeout is not an error: the last content seen is returned with `ready == false`.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(
        &self,
        url: &str,
        ready: &ReadyCondition,
        timeout: Duration,
    ) -> Result<FetchedPage, TransportError>;
}

/// Deadline used when `now + timeout` does not fit in an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout).unwrap_or_else(|| now + FAR_FUTURE)
}

/// Re-requests the page over plain HTTP until the interstitial clears.
pub struct WaitGatedFetcher {
    transport: Arc<dyn HttpTransport>,
    poll_interval: Duration,
}

impl WaitGatedFetcher {
    pub fn new(transport: Arc<dyn HttpTransport>, poll_interval: Duration) -> Self {
        Self { transport, poll_interval }
    }
}

#[async_trait]
impl PageFetcher for WaitGatedFetcher {
    async fn fetch(
        &self,
        url: &str,
        ready: &ReadyCondition,
        timeout: Duration,
    ) -> Result<FetchedPage, TransportError> {
        let deadline = deadline_after(timeout);
        let mut attempts = 0u32;
        let mut last: Option<String> = None;

        loop {
            attempts += 1;
            match timeout_at(deadline, self.transport.get(url)).await {
                Ok(Ok(resp)) => {
                    let content = resp.text();
                    if ready.is_ready(&content) {
                        debug!(url, attempts, "page ready");
                        return Ok(FetchedPage { content, ready: true, attempts });
                    }
                    last = Some(content);
                }
                Ok(Err(err)) if attempts == 1 => return Err(err),
                // Later failures are treated like another wait page.
                Ok(Err(err)) => warn!(url, attempts, error = %err, "poll failed; still waiting"),
                Err(_) => {
                    warn!(url, attempts, "request outlived the wait budget");
                    return Ok(FetchedPage { content: last.unwrap_or_default(), ready: false, attempts });
                }
            }

            let now = Instant::now();
            if now >= deadline {
                warn!(url, attempts, "interstitial did not clear before timeout");
                return Ok(FetchedPage { content: last.unwrap_or_default(), ready: false, attempts });
            }
            sleep(self.poll_interval.min(deadline - now)).await;
        }
    }
}
