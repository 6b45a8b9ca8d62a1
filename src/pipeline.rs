//! Scan pipeline
//!
//! Ties the crawler and the analysis pass to the scan state machine. Each
//! scan runs as its own tokio task; callers observe progress only through
//! the persisted scan status.

use crate::analysis::{analyze_scan, AnalysisReport};
use crate::config::{Config, ScanSettings};
use crate::crawler::{Coordinator, Fetcher};
use crate::state::ScanStatus;
use crate::storage::{transition_scan, with_storage, SharedStorage, Storage};
use crate::AuditError;
use std::future::Future;
use std::sync::Arc;
use url::Url;

/// Entry point for starting scans and re-running analysis
#[derive(Clone)]
pub struct Pipeline {
    storage: SharedStorage,
    config: Arc<Config>,
    fetcher: Fetcher,
}

impl Pipeline {
    /// Creates a pipeline over an opened storage handle
    ///
    /// # Returns
    ///
    /// * `Ok(Pipeline)` - Ready to start scans
    /// * `Err(AuditError)` - The HTTP client could not be built
    pub fn new(storage: SharedStorage, config: Config) -> Result<Self, AuditError> {
        let fetcher = Fetcher::new(&config.user_agent, &config.crawler)?;

        Ok(Self {
            storage,
            config: Arc::new(config),
            fetcher,
        })
    }

    pub fn storage(&self) -> &SharedStorage {
        &self.storage
    }

    /// Creates a pending scan and runs it in the background
    ///
    /// Returns the scan id immediately. The start URL must be an absolute
    /// URL with a host; it is stored exactly as given (trimmed).
    pub fn start_scan(&self, start_url: &str) -> Result<i64, AuditError> {
        let start_url = start_url.trim();
        let parsed = Url::parse(start_url)?;
        if parsed.host_str().is_none() {
            return Err(AuditError::UrlParse(url::ParseError::EmptyHost));
        }

        let scan_id = with_storage(&self.storage, |s| s.create_scan(start_url))?;
        tracing::info!("Created scan {} for {}", scan_id, start_url);

        let pipeline = self.clone();
        tokio::spawn(async move {
            pipeline.run_scan(scan_id).await;
        });

        Ok(scan_id)
    }

    /// Runs a pending scan to its final state
    ///
    /// Any pipeline-level error or panic is logged and the scan marked
    /// `failed`; rows already written are kept. Returns the status the scan
    /// ended in.
    pub async fn run_scan(&self, scan_id: i64) -> ScanStatus {
        let pipeline = self.clone();
        self.supervise(scan_id, async move { pipeline.crawl_and_analyze(scan_id).await })
            .await
    }

    /// Runs `work` on its own task so a panic surfaces as a `JoinError`
    async fn supervise<F>(&self, scan_id: i64, work: F) -> ScanStatus
    where
        F: Future<Output = Result<ScanStatus, AuditError>> + Send + 'static,
    {
        match tokio::spawn(work).await {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => {
                tracing::error!("Scan {} failed: {}", scan_id, e);
                self.mark_failed(scan_id);
                ScanStatus::Failed
            }
            Err(e) => {
                tracing::error!("Scan {} aborted: {}", scan_id, e);
                self.mark_failed(scan_id);
                ScanStatus::Failed
            }
        }
    }

    async fn crawl_and_analyze(&self, scan_id: i64) -> Result<ScanStatus, AuditError> {
        transition_scan(&self.storage, scan_id, ScanStatus::Crawling)?;

        let (scan, settings_map) =
            with_storage(&self.storage, |s| Ok((s.get_scan(scan_id)?, s.load_settings()?)))?;
        let settings = ScanSettings::from_map(&settings_map)?;

        let mut coordinator = Coordinator::new(
            Arc::clone(&self.storage),
            self.fetcher.clone(),
            settings,
            scan_id,
            &scan.start_url,
        )?;
        let summary = coordinator.crawl().await?;

        transition_scan(&self.storage, scan_id, ScanStatus::Crawled)?;
        tracing::info!(
            "Scan {} crawled: {} pages fetched, {} persisted",
            scan_id,
            summary.pages_fetched,
            summary.pages_persisted
        );

        if !self.config.crawler.auto_analyze {
            return Ok(ScanStatus::Crawled);
        }

        analyze_scan(&self.storage, scan_id)?;
        Ok(ScanStatus::Completed)
    }

    /// Runs the analysis pass on a `crawled` or `completed` scan
    ///
    /// Any other state is refused with [`AuditError::InvalidTransition`].
    /// A failure after analysis has started marks the scan `failed`.
    pub fn trigger_analysis(&self, scan_id: i64) -> Result<AnalysisReport, AuditError> {
        let status = self.scan_status(scan_id)?;
        if !status.can_analyze() {
            return Err(AuditError::InvalidTransition {
                from: status,
                to: ScanStatus::Analyzing,
            });
        }

        analyze_scan(&self.storage, scan_id).inspect_err(|e| {
            tracing::error!("Analysis of scan {} failed: {}", scan_id, e);
            if !matches!(e, AuditError::InvalidTransition { .. }) {
                self.mark_failed(scan_id);
            }
        })
    }

    /// Current persisted status of a scan
    pub fn scan_status(&self, scan_id: i64) -> Result<ScanStatus, AuditError> {
        match with_storage(&self.storage, |s| s.get_scan(scan_id)) {
            Ok(scan) => Ok(scan.status),
            Err(AuditError::Storage(crate::storage::StorageError::ScanNotFound(id))) => {
                Err(AuditError::ScanNotFound(id))
            }
            Err(e) => Err(e),
        }
    }

    fn mark_failed(&self, scan_id: i64) {
        if let Err(e) = transition_scan(&self.storage, scan_id, ScanStatus::Failed) {
            tracing::error!("Could not mark scan {} as failed: {}", scan_id, e);
        }
    }
}
