//! Storage module for persisting scan data
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Scan lifecycle, counters and stored reports
//! - Page, link and image rows for each scan
//! - The editable settings table

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::state::{PageChange, ScanStatus};
use crate::AuditError;

use serde::Serialize;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Storage handle shared between the CLI and running scans
pub type SharedStorage = Arc<Mutex<SqliteStorage>>;

/// Initializes or opens a storage database and seeds default settings
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SharedStorage)` - Successfully initialized storage
/// * `Err(AuditError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> Result<SharedStorage, AuditError> {
    let mut storage = SqliteStorage::new(path)?;
    storage.seed_default_settings()?;
    Ok(Arc::new(Mutex::new(storage)))
}

/// Runs `f` with the storage lock held
///
/// The guard is dropped before this returns, so it can never be held across
/// an `.await` by callers.
pub fn with_storage<T>(
    storage: &SharedStorage,
    f: impl FnOnce(&mut SqliteStorage) -> StorageResult<T>,
) -> Result<T, AuditError> {
    let mut guard = storage.lock().map_err(|_| AuditError::LockPoisoned)?;
    Ok(f(&mut guard)?)
}

/// Moves a scan to `to`, refusing transitions the state machine forbids
///
/// The read and the write happen under one lock so two callers cannot both
/// move the scan out of the same state. Returns the previous status.
pub fn transition_scan(
    storage: &SharedStorage,
    scan_id: i64,
    to: ScanStatus,
) -> Result<ScanStatus, AuditError> {
    let mut guard = storage.lock().map_err(|_| AuditError::LockPoisoned)?;

    let from = match guard.get_scan(scan_id) {
        Ok(scan) => scan.status,
        Err(StorageError::ScanNotFound(id)) => return Err(AuditError::ScanNotFound(id)),
        Err(e) => return Err(e.into()),
    };

    if !from.can_transition_to(to) {
        return Err(AuditError::InvalidTransition { from, to });
    }

    guard.update_scan_status(scan_id, to)?;
    Ok(from)
}

/// Represents a scan in the database
#[derive(Debug, Clone)]
pub struct ScanRecord {
    pub id: i64,
    pub start_url: String,
    pub status: ScanStatus,
    pub created_at: String,
    pub finished_at: Option<String>,
    pub total_issues: u32,
    pub new_pages: u32,
    pub updated_pages: u32,
    pub unchanged_pages: u32,
    /// Serialized `AnalysisReport`, present once analysis has completed
    pub report: Option<String>,
}

/// Content-analysis fields of a page
///
/// All zero/empty until the analysis pass runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PageMetrics {
    pub word_count: u32,
    pub reading_time: f64,
    pub readability: f64,
    pub h1_count: u32,
    pub internal_links: u32,
    pub external_links: u32,
    pub top_keywords: String,
    pub spelling_issues: u32,
    pub spelling_examples: Vec<String>,
    pub grammar_issues: u32,
    pub grammar_examples: Vec<String>,
}

/// Represents a page in the database
#[derive(Debug, Clone, Default)]
pub struct PageRecord {
    pub url: String,
    /// HTTP status, 0 for a network failure
    pub status_code: u16,
    pub title: String,
    pub meta_description: String,
    /// Raw body, kept only for fetched HTML pages
    pub html: Option<String>,
    pub content_hash: Option<String>,
    pub is_orphan: bool,
    pub incoming_links: u32,
    pub change: PageChange,
    pub metrics: PageMetrics,
}

impl PageRecord {
    /// Returns true for a 200 page whose visible text was hashed
    ///
    /// Title, description and content checks only look at these pages.
    pub fn is_content_page(&self) -> bool {
        self.status_code == 200 && self.content_hash.as_deref().is_some_and(|h| !h.is_empty())
    }
}

/// Represents one link occurrence
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkRecord {
    pub source_url: String,
    pub target_url: String,
    pub anchor_text: String,
    pub status_code: u16,
    pub is_broken: bool,
}

/// Represents one image occurrence
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageRecord {
    pub page_url: String,
    pub image_url: String,
    pub alt_text: String,
    pub file_size_kb: u32,
    pub is_large: bool,
    pub missing_alt: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_page_requires_200_and_hash() {
        let mut page = PageRecord {
            url: "https://example.com".to_string(),
            status_code: 200,
            content_hash: Some("abc".to_string()),
            ..Default::default()
        };
        assert!(page.is_content_page());

        page.content_hash = Some(String::new());
        assert!(!page.is_content_page());

        page.content_hash = Some("abc".to_string());
        page.status_code = 404;
        assert!(!page.is_content_page());
    }

    fn shared() -> SharedStorage {
        Arc::new(Mutex::new(SqliteStorage::new_in_memory().unwrap()))
    }

    #[test]
    fn test_transition_follows_state_machine() {
        let storage = shared();
        let id = with_storage(&storage, |s| s.create_scan("https://example.com")).unwrap();

        let previous = transition_scan(&storage, id, ScanStatus::Crawling).unwrap();
        assert_eq!(previous, ScanStatus::Pending);

        let result = transition_scan(&storage, id, ScanStatus::Completed);
        assert!(matches!(
            result,
            Err(AuditError::InvalidTransition {
                from: ScanStatus::Crawling,
                to: ScanStatus::Completed
            })
        ));

        let scan = with_storage(&storage, |s| s.get_scan(id)).unwrap();
        assert_eq!(scan.status, ScanStatus::Crawling);
    }

    #[test]
    fn test_transition_unknown_scan() {
        let storage = shared();
        let result = transition_scan(&storage, 99, ScanStatus::Crawling);
        assert!(matches!(result, Err(AuditError::ScanNotFound(99))));
    }

    #[test]
    fn test_with_storage_reports_poisoned_lock() {
        let storage: SharedStorage = Arc::new(Mutex::new(SqliteStorage::new_in_memory().unwrap()));

        let poisoner = Arc::clone(&storage);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("poison the lock");
        })
        .join();

        let result = with_storage(&storage, |s| s.count_scans());
        assert!(matches!(result, Err(AuditError::LockPoisoned)));
    }
}
