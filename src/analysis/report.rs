//! Typed issue report
//!
//! The report is stored as JSON on the scan row. Everything in it can be
//! re-derived from the page, link and image rows.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A page flagged by a check, with the value that tripped it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageIssue {
    pub url: String,
    /// Human-readable detail, e.g. the offending title or the word count
    pub detail: String,
}

impl PageIssue {
    pub fn new(url: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            detail: detail.into(),
        }
    }
}

/// A link flagged by a check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkIssue {
    pub source_url: String,
    pub target_url: String,
    pub anchor_text: String,
    pub status_code: u16,
}

/// An image flagged by a check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageIssue {
    pub page_url: String,
    pub image_url: String,
    pub alt_text: String,
    pub file_size_kb: u32,
}

/// Aggregated findings for one scan
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub total_pages: usize,

    pub missing_titles: Vec<PageIssue>,
    pub short_titles: Vec<PageIssue>,
    pub long_titles: Vec<PageIssue>,

    pub missing_descriptions: Vec<PageIssue>,
    pub short_descriptions: Vec<PageIssue>,
    pub long_descriptions: Vec<PageIssue>,

    /// Title -> pages sharing it
    pub duplicate_titles: BTreeMap<String, Vec<String>>,
    /// Description -> pages sharing it
    pub duplicate_descriptions: BTreeMap<String, Vec<String>>,
    /// Content hash -> pages sharing it
    pub duplicate_content: BTreeMap<String, Vec<String>>,

    pub orphaned_pages: Vec<PageIssue>,

    pub broken_links: Vec<LinkIssue>,
    pub rate_limited_links: Vec<LinkIssue>,

    pub large_images: Vec<ImageIssue>,
    pub missing_alt_images: Vec<ImageIssue>,

    pub thin_content: Vec<PageIssue>,
    pub slow_reads: Vec<PageIssue>,
    pub low_readability: Vec<PageIssue>,
    pub missing_h1: Vec<PageIssue>,
    pub multiple_h1: Vec<PageIssue>,

    pub spelling_issues: Vec<PageIssue>,
    pub grammar_issues: Vec<PageIssue>,
}

impl AnalysisReport {
    /// Number of actionable issues
    ///
    /// Duplicates, title/description length, slow reads and rate-limited
    /// links are informational and not counted.
    pub fn total_issues(&self) -> usize {
        self.broken_links.len()
            + self.large_images.len()
            + self.missing_alt_images.len()
            + self.missing_titles.len()
            + self.missing_descriptions.len()
            + self.orphaned_pages.len()
            + self.thin_content.len()
            + self.low_readability.len()
            + self.missing_h1.len()
            + self.multiple_h1.len()
            + self.spelling_issues.len()
            + self.grammar_issues.len()
    }

    /// Parses a report previously stored on a scan row
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
