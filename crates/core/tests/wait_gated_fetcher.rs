mod common;

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use co_core::services::fetch::{PageFetcher, ReadyCondition, WaitGatedFetcher};
use co_core::services::transport::{HttpResponse, HttpTransport, TransportError};
use tokio::time::Instant;
use common::{html, listing_page, ScriptedTransport, WAIT_PAGE};

const URL: &str = "http://portal.test/bisweb/COsByLocationServlet?requestid=&allbin=1015862";

fn ready() -> ReadyCondition {
    ReadyCondition::TitleIs("Property Overview".into())
}

#[tokio::test(start_paused = true)]
async fn polls_through_the_interstitial() {
    let listing = listing_page(&["1290125.PDF"]);
    let transport = Arc::new(
        ScriptedTransport::new().route("allbin=", vec![html(WAIT_PAGE), html(WAIT_PAGE), html(&listing)]),
    );
    let fetcher = WaitGatedFetcher::new(transport.clone(), Duration::from_secs(1));

    let page = fetcher.fetch(URL, &ready(), Duration::from_secs(10)).await.unwrap();

    assert!(page.ready);
    assert_eq!(page.attempts, 3);
    assert_eq!(page.content, listing);
}

#[tokio::test(start_paused = true)]
async fn timeout_returns_last_content_instead_of_failing() {
    let transport = Arc::new(ScriptedTransport::new().route("allbin=", vec![html(WAIT_PAGE)]));
    let fetcher = WaitGatedFetcher::new(transport.clone(), Duration::from_secs(1));

    let page = fetcher.fetch(URL, &ready(), Duration::from_secs(3)).await.unwrap();

    assert!(page.timed_out());
    assert_eq!(page.content, WAIT_PAGE);
    // t=0, 1, 2, 3
    assert_eq!(transport.calls("allbin="), 4);
}

#[tokio::test(start_paused = true)]
async fn first_request_failure_propagates() {
    let transport = Arc::new(ScriptedTransport::new());
    let fetcher = WaitGatedFetcher::new(transport, Duration::from_secs(1));

    let err = fetcher.fetch(URL, &ready(), Duration::from_secs(3)).await.unwrap_err();

    assert!(matches!(err, TransportError::Request { .. }));
}

#[tokio::test(start_paused = true)]
async fn later_failure_keeps_waiting_for_the_real_page() {
    let listing = listing_page(&["1290125.PDF"]);
    let transport = Arc::new(ScriptedTransport::new().route_results(
        "allbin=",
        vec![
            Ok(html(WAIT_PAGE)),
            Err(TransportError::Request { url: URL.into(), message: "reset".into() }),
            Ok(html(&listing)),
        ],
    ));
    let fetcher = WaitGatedFetcher::new(transport.clone(), Duration::from_secs(1));

    let page = fetcher.fetch(URL, &ready(), Duration::from_secs(10)).await.unwrap();

    assert!(page.ready);
    assert_eq!(page.attempts, 3);
    assert_eq!(page.content, listing);
}

#[tokio::test(start_paused = true)]
async fn failures_until_timeout_return_the_last_page_seen() {
    let transport = Arc::new(ScriptedTransport::new().route_results(
        "allbin=",
        vec![
            Ok(html(WAIT_PAGE)),
            Err(TransportError::Request { url: URL.into(), message: "reset".into() }),
        ],
    ));
    let fetcher = WaitGatedFetcher::new(transport.clone(), Duration::from_secs(1));

    let page = fetcher.fetch(URL, &ready(), Duration::from_secs(3)).await.unwrap();

    assert!(page.timed_out());
    assert_eq!(page.content, WAIT_PAGE);
    assert_eq!(transport.calls("allbin="), 4);
}

/// Serves the wait page once, then hangs on every later request.
struct StallingTransport {
    calls: AtomicU32,
    stall: Duration,
}

#[async_trait]
impl HttpTransport for StallingTransport {
    async fn get(&self, _url: &str) -> Result<HttpResponse, TransportError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) > 0 {
            tokio::time::sleep(self.stall).await;
        }
        Ok(html(WAIT_PAGE))
    }
}

#[tokio::test(start_paused = true)]
async fn hung_request_does_not_outlast_the_timeout() {
    let transport =
        Arc::new(StallingTransport { calls: AtomicU32::new(0), stall: Duration::from_secs(30) });
    let fetcher = WaitGatedFetcher::new(transport, Duration::from_secs(1));

    let start = Instant::now();
    let page = fetcher.fetch(URL, &ready(), Duration::from_secs(3)).await.unwrap();

    assert_eq!(start.elapsed(), Duration::from_secs(3));
    assert!(page.timed_out());
    assert_eq!(page.content, WAIT_PAGE);
    assert_eq!(page.attempts, 2);
}

#[tokio::test(start_paused = true)]
async fn hung_first_request_returns_an_empty_unready_page() {
    let transport =
        Arc::new(StallingTransport { calls: AtomicU32::new(1), stall: Duration::from_secs(30) });
    let fetcher = WaitGatedFetcher::new(transport, Duration::from_secs(1));

    let page = fetcher.fetch(URL, &ready(), Duration::from_secs(3)).await.unwrap();

    assert!(page.timed_out());
    assert!(page.content.is_empty());
}

#[tokio::test(start_paused = true)]
async fn huge_timeout_still_returns_a_ready_page() {
    let listing = listing_page(&["1290125.PDF"]);
    let transport = Arc::new(ScriptedTransport::new().route("allbin=", vec![html(&listing)]));
    let fetcher = WaitGatedFetcher::new(transport, Duration::from_secs(1));

    let page = fetcher.fetch(URL, &ready(), Duration::MAX).await.unwrap();

    assert!(page.ready);
}
