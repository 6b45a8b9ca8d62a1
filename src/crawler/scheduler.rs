//! Scheduler for managing the crawl frontier
//!
//! This module handles:
//! - FIFO queue management for URLs to crawl (breadth-first order)
//! - Domain scoping and the per-scan page budget
//! - The sitemap reference set used for orphan detection
//! - The link graph (target -> distinct sources)
//!
//! The scheduler is plain data; the coordinator drives it and does all I/O.

use crate::url::is_in_domain;
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

/// Scheduler manages the frontier queue and crawl bookkeeping for one scan
#[derive(Debug)]
pub struct Scheduler {
    /// Crawl domain (host plus explicit port)
    domain: String,

    /// Maximum number of pages fetched
    budget: usize,

    /// Sitemap-driven scans never enqueue discovered links
    sitemap_driven: bool,

    /// URLs waiting to be fetched
    pending: VecDeque<String>,

    /// Mirror of `pending` for O(1) membership checks
    queued: HashSet<String>,

    /// URLs already popped for fetching
    visited: HashSet<String>,

    /// Visited URLs in fetch order
    fetched: Vec<String>,

    /// URLs listed in the site's sitemap
    sitemap: BTreeSet<String>,

    /// Target URL -> set of pages linking to it
    link_graph: HashMap<String, HashSet<String>>,
}

impl Scheduler {
    /// Creates a new, empty scheduler
    ///
    /// # Arguments
    ///
    /// * `domain` - The crawl domain; out-of-domain URLs are never fetched
    /// * `budget` - Maximum number of pages to fetch
    /// * `sitemap_driven` - True when the scan started from a sitemap URL
    pub fn new(domain: impl Into<String>, budget: usize, sitemap_driven: bool) -> Self {
        Self {
            domain: domain.into(),
            budget,
            sitemap_driven,
            pending: VecDeque::new(),
            queued: HashSet::new(),
            visited: HashSet::new(),
            fetched: Vec::new(),
            sitemap: BTreeSet::new(),
            link_graph: HashMap::new(),
        }
    }

    /// Enqueues a seed URL, ignoring the budget
    ///
    /// The budget still caps how many seeds are fetched.
    pub fn seed(&mut self, url: &str) {
        if !self.visited.contains(url) && !self.queued.contains(url) {
            self.enqueue(url);
        }
    }

    /// Adds a URL to the sitemap reference set
    pub fn add_sitemap_url(&mut self, url: &str) {
        self.sitemap.insert(url.to_string());
    }

    /// Pops the next URL to fetch and marks it visited
    ///
    /// Skips URLs that were already visited or fall outside the domain.
    /// Returns None once the frontier is empty or the budget is spent.
    pub fn next_url(&mut self) -> Option<String> {
        while self.fetched.len() < self.budget {
            let url = self.pending.pop_front()?;
            self.queued.remove(&url);

            if self.visited.contains(&url) || !is_in_domain(&url, &self.domain) {
                tracing::trace!("Skipping {}", url);
                continue;
            }

            self.visited.insert(url.clone());
            self.fetched.push(url.clone());
            return Some(url);
        }

        None
    }

    /// Records a link edge and enqueues the target if allowed
    ///
    /// The target is enqueued only in link-driven scans, only if it was
    /// neither visited nor queued, and only while visited plus pending
    /// stays below the budget.
    ///
    /// Returns true if the target was enqueued.
    pub fn record_link(&mut self, source: &str, target: &str) -> bool {
        self.link_graph
            .entry(target.to_string())
            .or_default()
            .insert(source.to_string());

        if self.sitemap_driven
            || self.visited.contains(target)
            || self.queued.contains(target)
            || self.visited.len() + self.pending.len() >= self.budget
        {
            return false;
        }

        self.enqueue(target);
        true
    }

    fn enqueue(&mut self, url: &str) {
        self.queued.insert(url.to_string());
        self.pending.push_back(url.to_string());
    }

    /// Number of distinct pages linking to `url`
    pub fn incoming_links(&self, url: &str) -> u32 {
        self.link_graph.get(url).map_or(0, |sources| sources.len() as u32)
    }

    /// True if `url` was fetched during this scan
    pub fn was_fetched(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    /// True if `url` is listed in the sitemap but was never reached
    ///
    /// Sitemap-driven scans have no orphans: their sitemap is the frontier.
    pub fn is_orphan(&self, url: &str) -> bool {
        !self.sitemap_driven && self.sitemap.contains(url) && !self.visited.contains(url)
    }

    /// Every URL to persist: fetched pages in fetch order, then unreached
    /// sitemap entries in sorted order
    pub fn known_urls(&self) -> Vec<String> {
        let unreached = self
            .sitemap
            .iter()
            .filter(|url| !self.visited.contains(*url))
            .cloned();

        self.fetched.iter().cloned().chain(unreached).collect()
    }

    pub fn fetched_count(&self) -> usize {
        self.fetched.len()
    }

    pub fn frontier_size(&self) -> usize {
        self.pending.len()
    }

    pub fn sitemap_size(&self) -> usize {
        self.sitemap.len()
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn is_sitemap_driven(&self) -> bool {
        self.sitemap_driven
    }
}
