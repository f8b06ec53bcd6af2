#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use co_core::config::PortalConfig;
use co_core::model::RawDocument;
use co_core::services::fetch::{FetchedPage, PageFetcher, ReadyCondition};
use co_core::services::normalize::{
    write_working_file, DocumentNormalizer, NormalizedDocument, TextExtractor,
};
use co_core::services::tools::ToolError;
use co_core::services::transport::{HttpResponse, HttpTransport, TransportError};
use co_core::CertificateResolver;

pub const WAIT_PAGE: &str = "<html><div id=\"waiting-main\">Please wait...</div></html>";
pub const NOT_FOUND_PAGE: &str =
    "<html><pre>java.io.FileNotFoundException: /cofo/M/000/092000/x.PDF</pre></html>";

pub fn pdf(text: &str) -> HttpResponse {
    HttpResponse::new(200, "application/pdf", text.as_bytes().to_vec())
}

pub fn html(body: &str) -> HttpResponse {
    HttpResponse::new(200, "text/html; charset=utf-8", body.as_bytes().to_vec())
}

pub fn listing_page(locators: &[&str]) -> String {
    let links: String = locators
        .iter()
        .map(|l| format!("<tr><td><a href=\"javascript:void(0)\">{l}</a></td></tr>"))
        .collect();
    format!(
        "<html><head><title>Property Overview</title></head><body>\
         <a href=\"/bisweb/PropertyProfileOverviewServlet\">Back</a><table>{links}</table></body></html>"
    )
}

/// Transport that replays scripted responses per URL fragment.
///
/// The last response for a fragment repeats once its queue is drained.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<Vec<(String, VecDeque<Result<HttpResponse, TransportError>>)>>,
    calls: Mutex<HashMap<String, u32>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(self, fragment: &str, responses: Vec<HttpResponse>) -> Self {
        self.route_results(fragment, responses.into_iter().map(Ok).collect())
    }

    pub fn route_results(
        self,
        fragment: &str,
        responses: Vec<Result<HttpResponse, TransportError>>,
    ) -> Self {
        self.routes.lock().unwrap().push((fragment.to_string(), responses.into()));
        self
    }

    pub fn calls(&self, fragment: &str) -> u32 {
        self.calls.lock().unwrap().get(fragment).copied().unwrap_or(0)
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        let mut routes = self.routes.lock().unwrap();
        let Some((fragment, queue)) = routes.iter_mut().find(|(f, _)| url.contains(f.as_str()))
        else {
            return Err(TransportError::Request {
                url: url.to_string(),
                message: "no scripted route".into(),
            });
        };
        *self.calls.lock().unwrap().entry(fragment.clone()).or_default() += 1;
        let next = if queue.len() > 1 { queue.pop_front() } else { queue.front().cloned() };
        next.unwrap_or_else(|| {
            Err(TransportError::Request { url: url.to_string(), message: "empty script".into() })
        })
    }
}

/// Fetcher that returns a fixed page without touching the network.
pub struct StaticFetcher {
    pub page: Result<FetchedPage, TransportError>,
}

impl StaticFetcher {
    pub fn ready(content: String) -> Self {
        Self { page: Ok(FetchedPage { content, ready: true, attempts: 1 }) }
    }

    pub fn timed_out(content: String) -> Self {
        Self { page: Ok(FetchedPage { content, ready: false, attempts: 10 }) }
    }

    pub fn failing() -> Self {
        Self {
            page: Err(TransportError::Request {
                url: "listing".into(),
                message: "connection refused".into(),
            }),
        }
    }
}

#[async_trait]
impl PageFetcher for StaticFetcher {
    async fn fetch(
        &self,
        _url: &str,
        _ready: &ReadyCondition,
        _timeout: Duration,
    ) -> Result<FetchedPage, TransportError> {
        self.page.clone()
    }
}

/// Writes the download as-is, optionally failing for chosen locators.
#[derive(Default)]
pub struct FakeNormalizer {
    pub fail_for: Vec<String>,
}

#[async_trait]
impl DocumentNormalizer for FakeNormalizer {
    async fn normalize(
        &self,
        document: &RawDocument,
        workdir: &Path,
    ) -> Result<NormalizedDocument, ToolError> {
        if self.fail_for.iter().any(|l| l == document.locator.as_str()) {
            return Err(ToolError::Failed {
                tool: "fake-ocr".into(),
                status: "exit status: 1".into(),
                stderr: "document still locked".into(),
            });
        }
        let path = write_working_file(document, workdir).await?;
        Ok(NormalizedDocument { path })
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// Reads the working file back as UTF-8; test "PDFs" are plain text.
pub struct FileTextExtractor;

#[async_trait]
impl TextExtractor for FileTextExtractor {
    async fn extract(&self, document: &NormalizedDocument) -> Result<String, ToolError> {
        tokio::fs::read_to_string(&document.path).await.map_err(|e| ToolError::Io(e.to_string()))
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

pub fn fast_config() -> PortalConfig {
    let mut config = PortalConfig::default();
    config.retry.pace_ms = 5_000;
    config.retry.max_attempts = Some(5);
    config
}

pub fn resolver(
    config: PortalConfig,
    fetcher: StaticFetcher,
    transport: Arc<ScriptedTransport>,
    normalizer: FakeNormalizer,
) -> CertificateResolver {
    CertificateResolver::new(
        config,
        Arc::new(fetcher),
        transport,
        Arc::new(normalizer),
        Arc::new(FileTextExtractor),
    )
}
