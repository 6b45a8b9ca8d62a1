//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching and HEAD probes
//! - HTML and sitemap parsing
//! - Frontier management and change detection
//! - Overall crawl coordination

mod coordinator;
mod diff;
mod fetcher;
mod parser;
mod scheduler;
mod sitemap;

pub use coordinator::{is_broken_status, Coordinator, CrawlSummary};
pub use diff::Baseline;
pub use fetcher::{build_http_client, FetchResult, Fetcher};
pub use parser::{hash_text, parse_html, ExtractedImage, ExtractedLink, ParsedPage};
pub use scheduler::Scheduler;
pub use sitemap::parse_sitemap;
