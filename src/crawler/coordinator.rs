//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop for a single scan, including:
//! - Seeding the frontier from the start URL or a sitemap
//! - Coordinating fetching, parsing and change classification
//! - Probing link status and image size (cached per scan)
//! - Persisting pages with orphan and incoming-link data
//!
//! Status transitions belong to the pipeline; the coordinator only writes
//! rows and counters.

use crate::config::ScanSettings;
use crate::crawler::diff::Baseline;
use crate::crawler::parser::{parse_html, ParsedPage};
use crate::crawler::scheduler::Scheduler;
use crate::crawler::sitemap::parse_sitemap;
use crate::crawler::{FetchResult, Fetcher};
use crate::state::PageChange;
use crate::storage::{with_storage, ImageRecord, LinkRecord, PageRecord, SharedStorage, Storage};
use crate::url::{extract_domain, is_in_domain, is_xml_path, normalize_url};
use crate::AuditError;
use std::collections::HashMap;
use std::time::Instant;
use url::Url;

/// Counts reported when a crawl finishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlSummary {
    /// Pages fetched (never above the budget)
    pub pages_fetched: usize,
    /// Page rows written, including unreached sitemap entries
    pub pages_persisted: usize,
    /// Size of the sitemap reference set
    pub sitemap_urls: usize,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    storage: SharedStorage,
    fetcher: Fetcher,
    settings: ScanSettings,
    scan_id: i64,
    /// Normalized start URL
    start_url: Url,
    scheduler: Scheduler,
    baseline: Baseline,
    /// Fetched pages awaiting the final write
    pages: HashMap<String, PageRecord>,
    link_status_cache: HashMap<String, u16>,
    image_size_cache: HashMap<String, u32>,
}

impl Coordinator {
    /// Creates a new coordinator for one scan
    ///
    /// Reads the diff baseline once, here, before any page is fetched.
    ///
    /// # Arguments
    ///
    /// * `storage` - Shared storage handle
    /// * `fetcher` - HTTP access
    /// * `settings` - Settings snapshot for this run
    /// * `scan_id` - The scan being crawled
    /// * `start_url` - The start URL exactly as stored on the scan
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to crawl
    /// * `Err(AuditError)` - The start URL has no host, or storage failed
    pub fn new(
        storage: SharedStorage,
        fetcher: Fetcher,
        settings: ScanSettings,
        scan_id: i64,
        start_url: &str,
    ) -> Result<Self, AuditError> {
        let normalized = normalize_url(start_url);
        let parsed = Url::parse(&normalized)?;
        let domain = extract_domain(&parsed)
            .ok_or(AuditError::UrlParse(url::ParseError::EmptyHost))?;

        let sitemap_driven = is_xml_path(&normalized);
        let scheduler = Scheduler::new(domain, settings.max_pages, sitemap_driven);

        let baseline = with_storage(&storage, |s| Baseline::load(&*s, start_url, scan_id))?;
        match baseline.scan_id() {
            Some(previous) => tracing::info!(
                "Scan {} compares against scan {} ({} hashed pages)",
                scan_id,
                previous,
                baseline.len()
            ),
            None => tracing::info!("Scan {} has no baseline; all pages count as new", scan_id),
        }

        Ok(Self {
            storage,
            fetcher,
            settings,
            scan_id,
            start_url: parsed,
            scheduler,
            baseline,
            pages: HashMap::new(),
            link_status_cache: HashMap::new(),
            image_size_cache: HashMap::new(),
        })
    }

    /// Runs the crawl loop to completion and persists pages
    ///
    /// Fetch failures are recorded and never abort the loop. Only storage
    /// errors propagate.
    pub async fn crawl(&mut self) -> Result<CrawlSummary, AuditError> {
        tracing::info!(
            "Starting crawl of {} (scan {}, budget {}, {})",
            self.start_url,
            self.scan_id,
            self.settings.max_pages,
            if self.scheduler.is_sitemap_driven() {
                "sitemap-driven"
            } else {
                "link-driven"
            }
        );

        self.seed().await;

        let start_time = Instant::now();

        while let Some(url) = self.scheduler.next_url() {
            tracing::debug!("Processing URL: {}", url);

            self.process_url(&url).await?;

            let fetched = self.scheduler.fetched_count();
            if fetched % 10 == 0 {
                let rate = fetched as f64 / start_time.elapsed().as_secs_f64().max(f64::EPSILON);
                tracing::info!(
                    "Progress: {} pages crawled, {} in frontier, {:.2} pages/sec",
                    fetched,
                    self.scheduler.frontier_size(),
                    rate
                );
            }

            tokio::time::sleep(self.settings.request_delay()).await;
        }

        let pages_persisted = self.persist()?;

        let summary = CrawlSummary {
            pages_fetched: self.scheduler.fetched_count(),
            pages_persisted,
            sitemap_urls: self.scheduler.sitemap_size(),
        };

        tracing::info!(
            "Crawl of scan {} completed: {} pages fetched, {} pages saved in {:?}",
            self.scan_id,
            summary.pages_fetched,
            summary.pages_persisted,
            start_time.elapsed()
        );

        Ok(summary)
    }

    /// Fills the frontier and the sitemap reference set
    async fn seed(&mut self) {
        if self.scheduler.is_sitemap_driven() {
            let sitemap_url = self.start_url.to_string();
            for entry in self.load_sitemap(&sitemap_url).await {
                self.scheduler.add_sitemap_url(&entry);
                self.scheduler.seed(&entry);
            }
            tracing::info!(
                "Seeded {} URLs from sitemap {}",
                self.scheduler.frontier_size(),
                sitemap_url
            );
            return;
        }

        self.scheduler.seed(&normalize_url(self.start_url.as_str()));

        // Best-effort: a missing sitemap only disables orphan detection
        if let Ok(sitemap_url) = self.start_url.join("/sitemap.xml") {
            for entry in self.load_sitemap(sitemap_url.as_str()).await {
                self.scheduler.add_sitemap_url(&entry);
            }
            tracing::debug!(
                "Sitemap reference set has {} URLs",
                self.scheduler.sitemap_size()
            );
        }
    }

    /// Fetches a sitemap and returns its normalized, in-domain entries
    async fn load_sitemap(&self, sitemap_url: &str) -> Vec<String> {
        let Some(xml) = self.fetcher.fetch_text(sitemap_url).await else {
            tracing::debug!("No sitemap at {}", sitemap_url);
            return Vec::new();
        };

        parse_sitemap(&xml)
            .iter()
            .map(|loc| normalize_url(loc))
            .filter(|url| is_in_domain(url, self.scheduler.domain()))
            .collect()
    }

    /// Fetches and records a single URL
    async fn process_url(&mut self, url: &str) -> Result<(), AuditError> {
        let page = match self.fetcher.fetch_page(url).await {
            FetchResult::Html {
                status_code, body, ..
            } => {
                let parsed = match Url::parse(url) {
                    Ok(base) => parse_html(&body, &base, self.scheduler.domain()),
                    Err(_) => ParsedPage::default(),
                };
                self.record_html_page(url, status_code, body, parsed).await?
            }

            FetchResult::Other {
                status_code,
                content_type,
            } => {
                if status_code >= 400 {
                    tracing::warn!("{} returned HTTP {}", url, status_code);
                } else {
                    tracing::debug!("{} is not an HTML page ({} {})", url, status_code, content_type);
                }
                minimal_page(url, status_code)
            }

            FetchResult::NetworkError { error } => {
                tracing::warn!("Error fetching {}: {}", url, error);
                minimal_page(url, 0)
            }
        };

        with_storage(&self.storage, |s| {
            s.increment_change_count(self.scan_id, page.change)
        })?;
        self.pages.insert(url.to_string(), page);

        Ok(())
    }

    /// Classifies an HTML page and records its links and images
    async fn record_html_page(
        &mut self,
        url: &str,
        status_code: u16,
        body: String,
        parsed: ParsedPage,
    ) -> Result<PageRecord, AuditError> {
        let change = self.baseline.classify(url, Some(&parsed.content_hash));

        let mut links = Vec::new();
        for link in parsed.links.iter().filter(|l| l.in_domain) {
            let target = normalize_url(&link.url);
            let status_code = self.link_status(&target).await;

            links.push(LinkRecord {
                source_url: url.to_string(),
                target_url: target.clone(),
                anchor_text: link.anchor_text.clone(),
                status_code,
                is_broken: is_broken_status(status_code),
            });

            if self.scheduler.record_link(url, &target) {
                tracing::trace!("Queued {}", target);
            }
        }

        let mut images = Vec::with_capacity(parsed.images.len());
        for image in &parsed.images {
            let file_size_kb = self.image_size(&image.url).await;
            images.push(ImageRecord {
                page_url: url.to_string(),
                image_url: image.url.clone(),
                alt_text: image.alt.clone(),
                file_size_kb,
                is_large: file_size_kb > self.settings.max_image_size_kb,
                missing_alt: image.alt.is_empty(),
            });
        }

        // Written now so a later failure keeps the partial crawl
        with_storage(&self.storage, |s| {
            s.insert_links(self.scan_id, &links)?;
            s.insert_images(self.scan_id, &images)
        })?;

        tracing::debug!(
            "{}: {} ({} links, {} images)",
            url,
            change,
            links.len(),
            images.len()
        );

        Ok(PageRecord {
            url: url.to_string(),
            status_code,
            title: parsed.title,
            meta_description: parsed.meta_description,
            html: Some(body),
            content_hash: Some(parsed.content_hash),
            change,
            ..Default::default()
        })
    }

    async fn link_status(&mut self, target: &str) -> u16 {
        if let Some(status) = self.link_status_cache.get(target) {
            return *status;
        }
        let status = self.fetcher.check_status(target).await;
        self.link_status_cache.insert(target.to_string(), status);
        status
    }

    async fn image_size(&mut self, image_url: &str) -> u32 {
        if let Some(size) = self.image_size_cache.get(image_url) {
            return *size;
        }
        let size = self.fetcher.image_size_kb(image_url).await;
        self.image_size_cache.insert(image_url.to_string(), size);
        size
    }

    /// Writes one page row per crawled or sitemap-known URL
    ///
    /// Sitemap entries that were never fetched are stored as 404.
    fn persist(&mut self) -> Result<usize, AuditError> {
        let mut rows = Vec::new();

        for url in self.scheduler.known_urls() {
            if is_xml_path(&url) {
                continue;
            }

            let mut page = self.pages.remove(&url).unwrap_or_else(|| PageRecord {
                url: url.clone(),
                status_code: 404,
                ..Default::default()
            });
            page.incoming_links = self.scheduler.incoming_links(&url);
            page.is_orphan = self.scheduler.is_orphan(&url);

            if page.is_orphan {
                tracing::debug!("Orphan page: {}", url);
            }
            rows.push(page);
        }

        with_storage(&self.storage, |s| s.insert_pages(self.scan_id, &rows))?;
        Ok(rows.len())
    }
}

/// A link is broken if its status is outside 200..400; 0 means unknown
pub fn is_broken_status(status_code: u16) -> bool {
    !(200..400).contains(&status_code) && status_code != 0
}

fn minimal_page(url: &str, status_code: u16) -> PageRecord {
    PageRecord {
        url: url.to_string(),
        status_code,
        change: PageChange::Existing,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_broken_status() {
        assert!(!is_broken_status(200));
        assert!(!is_broken_status(301));
        assert!(!is_broken_status(399));
        assert!(is_broken_status(400));
        assert!(is_broken_status(404));
        assert!(is_broken_status(429));
        assert!(is_broken_status(500));
        assert!(is_broken_status(199));
        assert!(!is_broken_status(0));
    }

    #[test]
    fn test_minimal_page_is_existing() {
        let page = minimal_page("https://example.com/x", 0);
        assert_eq!(page.status_code, 0);
        assert_eq!(page.change, PageChange::Existing);
        assert!(page.html.is_none());
        assert!(!page.is_content_page());
    }
}
