use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::config::PortalConfig;
use crate::model::{
    latest_of, BuildingId, DocumentLocator, LocatorFailure, LocatorOutcome, LocatorReport,
    RegionCode, Resolution,
};
use crate::services::address::synthesize;
use crate::services::cancel::CancelSignal;
use crate::services::download::{
    DownloadError, DownloadOutcome, PollingDownloader, ResponseMarkers, RetryPolicy,
};
use crate::services::fetch::{FetchedPage, PageFetcher, ReadyCondition, WaitGatedFetcher};
use crate::services::harvest::harvest;
use crate::services::locators::extract_locators;
use crate::services::normalize::{
    extractor_from_config, normalizer_from_config, DocumentNormalizer, TextExtractor,
};
use crate::services::transport::{HttpTransport, ReqwestTransport, TransportError};

/// Job-level failures. Anything that goes wrong for a single locator is
/// recorded in its `LocatorReport` instead.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Failed to fetch certificate listing: {0}")]
    Fetch(#[from] TransportError),
    #[error("Resolution cancelled")]
    Cancelled,
    #[error("Locator worker failed: {0}")]
    Worker(String),
}

/// Stages 3-6 for a single locator. Cheap to clone into worker tasks.
#[derive(Clone)]
pub struct LocatorPipeline {
    downloader: Arc<PollingDownloader>,
    normalizer: Arc<dyn DocumentNormalizer>,
    extractor: Arc<dyn TextExtractor>,
    endpoint: String,
    request_id: String,
}

impl LocatorPipeline {
    pub fn new(
        downloader: Arc<PollingDownloader>,
        normalizer: Arc<dyn DocumentNormalizer>,
        extractor: Arc<dyn TextExtractor>,
        endpoint: impl Into<String>,
        request_id: impl Into<String>,
    ) -> Self {
        Self {
            downloader,
            normalizer,
            extractor,
            endpoint: endpoint.into(),
            request_id: request_id.into(),
        }
    }

    /// Run one locator to an outcome. Only cancellation escapes as an error.
    pub async fn run(
        &self,
        locator: &DocumentLocator,
        region: RegionCode,
        cancel: &mut CancelSignal,
    ) -> Result<LocatorOutcome, ResolveError> {
        info!(%locator, "scanning certificate");
        let outcome = match self.process(locator, region, cancel).await? {
            Ok(outcome) => outcome,
            Err(failure) => {
                warn!(%locator, %failure, "skipping certificate");
                LocatorOutcome::Failed(failure)
            }
        };
        match &outcome {
            LocatorOutcome::Dated(date) => info!(%locator, %date, "date found"),
            LocatorOutcome::NoDates => info!(%locator, "no date found"),
            LocatorOutcome::Failed(_) => {}
        }
        Ok(outcome)
    }

    async fn process(
        &self,
        locator: &DocumentLocator,
        region: RegionCode,
        cancel: &mut CancelSignal,
    ) -> Result<Result<LocatorOutcome, LocatorFailure>, ResolveError> {
        let address = match synthesize(locator, region, &self.endpoint, &self.request_id) {
            Ok(address) => address,
            Err(e) => return Ok(Err(LocatorFailure::MalformedLocator(e.to_string()))),
        };

        let document = match self.downloader.download(&address, cancel).await {
            Ok(DownloadOutcome::Downloaded { document, .. }) => document,
            Ok(DownloadOutcome::NotFound) => return Ok(Err(LocatorFailure::PermanentNotFound)),
            Ok(DownloadOutcome::GaveUp { attempts }) => {
                return Ok(Err(LocatorFailure::GaveUp { attempts }))
            }
            Err(DownloadError::Cancelled) => return Err(ResolveError::Cancelled),
            Err(e) => return Ok(Err(LocatorFailure::Transport(e.to_string()))),
        };

        // Scratch space is owned by this locator and removed on drop.
        let workdir = match tempfile::tempdir() {
            Ok(dir) => dir,
            Err(e) => {
                return Ok(Err(LocatorFailure::NormalizationFailure(format!(
                    "failed to create scratch dir: {e}"
                ))))
            }
        };

        let normalized = tokio::select! {
            _ = cancel.cancelled() => return Err(ResolveError::Cancelled),
            r = self.normalizer.normalize(&document, workdir.path()) => r,
        };
        let normalized = match normalized {
            Ok(doc) => doc,
            Err(e) => return Ok(Err(LocatorFailure::NormalizationFailure(e.to_string()))),
        };

        let text = tokio::select! {
            _ = cancel.cancelled() => return Err(ResolveError::Cancelled),
            r = self.extractor.extract(&normalized) => r,
        };
        let text = match text {
            Ok(text) => text,
            Err(e) => return Ok(Err(LocatorFailure::ExtractionFailure(e.to_string()))),
        };

        Ok(Ok(match harvest(&text) {
            Some(date) => LocatorOutcome::Dated(date),
            None => LocatorOutcome::NoDates,
        }))
    }
}

/// Resolves a building to the date of its most recent certificate.
///
/// The fetcher is owned by the resolver for its whole lifetime; build one
/// resolver per portal session and drop it to tear the session down.
pub struct CertificateResolver {
    fetcher: Arc<dyn PageFetcher>,
    pipeline: LocatorPipeline,
    config: PortalConfig,
}

impl CertificateResolver {
    pub fn new(
        config: PortalConfig,
        fetcher: Arc<dyn PageFetcher>,
        transport: Arc<dyn HttpTransport>,
        normalizer: Arc<dyn DocumentNormalizer>,
        extractor: Arc<dyn TextExtractor>,
    ) -> Self {
        let downloader = Arc::new(PollingDownloader::new(
            transport,
            RetryPolicy::from_config(&config),
            ResponseMarkers::from_config(&config),
        ));
        let pipeline = LocatorPipeline::new(
            downloader,
            normalizer,
            extractor,
            config.document_endpoint(),
            config.request_id.clone(),
        );
        Self { fetcher, pipeline, config }
    }

    /// Wire up the HTTP transport and external tools named in `config`.
    pub fn from_config(config: PortalConfig) -> Result<Self, TransportError> {
        let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new(&config)?);
        let fetcher = Arc::new(WaitGatedFetcher::new(transport.clone(), config.fetch_poll_interval()));
        let normalizer = normalizer_from_config(&config);
        let extractor = extractor_from_config(&config);
        Ok(Self::new(config, fetcher, transport, normalizer, extractor))
    }

    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    /// Fetch the listing page for `bin` and pull out its certificate locators.
    pub async fn list_locators(
        &self,
        bin: &BuildingId,
        cancel: &mut CancelSignal,
    ) -> Result<(FetchedPage, Vec<DocumentLocator>), ResolveError> {
        if cancel.is_cancelled() {
            return Err(ResolveError::Cancelled);
        }
        let url = self.config.listing_url(bin.as_str()).map_err(|e| TransportError::Request {
            url: self.config.base_url.clone(),
            message: format!("{e:#}"),
        })?;
        let ready = ReadyCondition::TitleIs(self.config.ready_title.clone());
        info!(%bin, "requesting certificate listing");
        let page = tokio::select! {
            _ = cancel.cancelled() => return Err(ResolveError::Cancelled),
            r = self.fetcher.fetch(&url, &ready, self.config.fetch_timeout()) => r?,
        };
        if page.timed_out() {
            warn!(%bin, attempts = page.attempts, "listing still behind the wait page; parsing what arrived");
        }
        let locators = extract_locators(&page.content);
        Ok((page, locators))
    }

    /// Resolve `bin` in `region`.
    ///
    /// Cancellation is all-or-nothing: dates gathered before the signal fired
    /// are discarded and `ResolveError::Cancelled` is returned.
    pub async fn resolve(
        &self,
        bin: &BuildingId,
        region: RegionCode,
        mut cancel: CancelSignal,
    ) -> Result<Resolution, ResolveError> {
        let (page, locators) = self.list_locators(bin, &mut cancel).await?;
        info!(%bin, count = locators.len(), "discovered certificates of occupancy");

        let reports = if self.config.max_concurrent_documents <= 1 || locators.len() <= 1 {
            self.run_sequential(locators, region, &mut cancel).await?
        } else {
            self.run_parallel(locators, region, cancel).await?
        };

        let date = latest_of(reports.iter().filter_map(LocatorReport::date));
        match date {
            Some(date) => info!(%bin, %date, "resolved certificate date"),
            None => info!(%bin, "no certificate date found"),
        }
        Ok(Resolution {
            bin: bin.clone(),
            region,
            date,
            fetch_timed_out: page.timed_out(),
            locators: reports,
        })
    }

    async fn run_sequential(
        &self,
        locators: Vec<DocumentLocator>,
        region: RegionCode,
        cancel: &mut CancelSignal,
    ) -> Result<Vec<LocatorReport>, ResolveError> {
        let mut reports = Vec::with_capacity(locators.len());
        for locator in locators {
            let outcome = self.pipeline.run(&locator, region, cancel).await?;
            reports.push(LocatorReport { locator, outcome });
        }
        Ok(reports)
    }

    async fn run_parallel(
        &self,
        locators: Vec<DocumentLocator>,
        region: RegionCode,
        cancel: CancelSignal,
    ) -> Result<Vec<LocatorReport>, ResolveError> {
        let permits = Arc::new(Semaphore::new(self.config.max_concurrent_documents));
        let mut tasks = JoinSet::new();
        for (idx, locator) in locators.into_iter().enumerate() {
            let pipeline = self.pipeline.clone();
            let permits = permits.clone();
            let mut cancel = cancel.clone();
            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await.ok();
                let outcome = pipeline.run(&locator, region, &mut cancel).await;
                (idx, locator, outcome)
            });
        }

        let mut indexed = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            let (idx, locator, outcome) = joined.map_err(|e| ResolveError::Worker(e.to_string()))?;
            // Returning early drops the JoinSet, which aborts the remaining workers.
            let outcome = outcome?;
            indexed.push((idx, LocatorReport { locator, outcome }));
        }
        indexed.sort_by_key(|(idx, _)| *idx);
        Ok(indexed.into_iter().map(|(_, report)| report).collect())
    }
}
