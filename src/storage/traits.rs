//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::state::{PageChange, ScanStatus};
use crate::storage::{ImageRecord, LinkRecord, PageMetrics, PageRecord, ScanRecord};
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Scan not found: {0}")]
    ScanNotFound(i64),

    #[error("Page not found: {0}")]
    PageNotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// This trait defines all database operations needed by the pipeline.
/// Callers share one backend behind a mutex; no method awaits.
pub trait Storage {
    // ===== Scan Management =====

    /// Creates a new scan in the `pending` state
    ///
    /// # Returns
    ///
    /// The ID of the newly created scan
    fn create_scan(&mut self, start_url: &str) -> StorageResult<i64>;

    /// Gets a scan by ID
    fn get_scan(&self, scan_id: i64) -> StorageResult<ScanRecord>;

    /// Writes a new status; terminal states also stamp `finished_at`
    ///
    /// Transition legality is checked by the caller.
    fn update_scan_status(&mut self, scan_id: i64, status: ScanStatus) -> StorageResult<()>;

    /// Bumps the running new/updated/unchanged counter for a scan
    fn increment_change_count(&mut self, scan_id: i64, change: PageChange) -> StorageResult<()>;

    /// Stores the serialized analysis report and its issue total
    fn set_scan_report(
        &mut self,
        scan_id: i64,
        report_json: &str,
        total_issues: u32,
    ) -> StorageResult<()>;

    /// Finds the most recent completed scan of `start_url`, ignoring `exclude_id`
    fn latest_completed_scan(
        &self,
        start_url: &str,
        exclude_id: i64,
    ) -> StorageResult<Option<ScanRecord>>;

    /// Lists scans newest first; `page` is 1-based
    fn list_scans(&self, page: u32, per_page: u32) -> StorageResult<Vec<ScanRecord>>;

    /// Counts all scans
    fn count_scans(&self) -> StorageResult<u64>;

    // ===== Page Management =====

    /// Inserts pages for a scan in one transaction
    ///
    /// A page whose URL already exists for the scan replaces the old row.
    fn insert_pages(&mut self, scan_id: i64, pages: &[PageRecord]) -> StorageResult<()>;

    /// Gets all pages of a scan in insertion order
    fn get_pages(&self, scan_id: i64) -> StorageResult<Vec<PageRecord>>;

    /// Maps page URL to content hash for every hashed page of a scan
    fn page_hashes(&self, scan_id: i64) -> StorageResult<HashMap<String, String>>;

    /// Overwrites the content-analysis fields of one page
    fn update_page_metrics(
        &mut self,
        scan_id: i64,
        url: &str,
        metrics: &PageMetrics,
    ) -> StorageResult<()>;

    // ===== Link Management =====

    /// Inserts link occurrences in one transaction
    fn insert_links(&mut self, scan_id: i64, links: &[LinkRecord]) -> StorageResult<()>;

    /// Gets all link occurrences of a scan
    fn get_links(&self, scan_id: i64) -> StorageResult<Vec<LinkRecord>>;

    // ===== Image Management =====

    /// Inserts image occurrences in one transaction
    fn insert_images(&mut self, scan_id: i64, images: &[ImageRecord]) -> StorageResult<()>;

    /// Gets all image occurrences of a scan
    fn get_images(&self, scan_id: i64) -> StorageResult<Vec<ImageRecord>>;

    // ===== Settings =====

    /// Writes every default setting that is not already present
    fn seed_default_settings(&mut self) -> StorageResult<()>;

    /// Loads the settings table as a map
    fn load_settings(&self) -> StorageResult<HashMap<String, String>>;

    /// Sets a single key, inserting or replacing it
    fn set_setting(&mut self, key: &str, value: &str) -> StorageResult<()>;
}
