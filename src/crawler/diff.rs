//! Change detection against the previous scan
//!
//! The baseline is the most recent *completed* scan of the same start URL.
//! It is read once when a crawl starts.

use crate::state::PageChange;
use crate::storage::{Storage, StorageResult};
use std::collections::HashMap;

/// Content hashes from the baseline scan, keyed by normalized URL
#[derive(Debug, Clone, Default)]
pub struct Baseline {
    scan_id: Option<i64>,
    hashes: HashMap<String, String>,
}

impl Baseline {
    /// Loads the baseline for a scan
    ///
    /// `scan_id` is the scan being crawled; it is never its own baseline.
    /// With no earlier completed scan the baseline is empty and every hashed
    /// page classifies as new.
    pub fn load<S: Storage + ?Sized>(
        storage: &S,
        start_url: &str,
        scan_id: i64,
    ) -> StorageResult<Self> {
        match storage.latest_completed_scan(start_url, scan_id)? {
            Some(previous) => Ok(Self {
                scan_id: Some(previous.id),
                hashes: storage.page_hashes(previous.id)?,
            }),
            None => Ok(Self::default()),
        }
    }

    /// Builds a baseline directly from a URL -> hash map
    pub fn from_hashes(scan_id: i64, hashes: HashMap<String, String>) -> Self {
        Self {
            scan_id: Some(scan_id),
            hashes,
        }
    }

    /// Classifies a crawled page
    ///
    /// Pages without a hash (non-HTML, non-200) are always `Existing`.
    pub fn classify(&self, url: &str, hash: Option<&str>) -> PageChange {
        let Some(hash) = hash else {
            return PageChange::Existing;
        };

        match self.hashes.get(url) {
            None => PageChange::New,
            Some(previous) if previous != hash => PageChange::Updated,
            Some(_) => PageChange::Existing,
        }
    }

    /// The scan this baseline was read from, if any
    pub fn scan_id(&self) -> Option<i64> {
        self.scan_id
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ScanStatus;
    use crate::storage::{PageRecord, SqliteStorage};

    fn baseline() -> Baseline {
        let mut hashes = HashMap::new();
        hashes.insert("https://example.com".to_string(), "h1".to_string());
        hashes.insert("https://example.com/about".to_string(), "h2".to_string());
        Baseline::from_hashes(1, hashes)
    }

    #[test]
    fn test_same_hash_is_existing() {
        assert_eq!(
            baseline().classify("https://example.com", Some("h1")),
            PageChange::Existing
        );
    }

    #[test]
    fn test_different_hash_is_updated() {
        assert_eq!(
            baseline().classify("https://example.com/about", Some("changed")),
            PageChange::Updated
        );
    }

    #[test]
    fn test_absent_url_is_new() {
        assert_eq!(
            baseline().classify("https://example.com/new", Some("h3")),
            PageChange::New
        );
    }

    #[test]
    fn test_no_hash_is_existing() {
        assert_eq!(
            baseline().classify("https://example.com/new", None),
            PageChange::Existing
        );
    }

    #[test]
    fn test_empty_baseline_marks_everything_new() {
        let empty = Baseline::default();
        assert!(empty.is_empty());
        assert_eq!(empty.scan_id(), None);
        assert_eq!(empty.classify("https://example.com", Some("x")), PageChange::New);
    }

    #[test]
    fn test_load_uses_latest_completed_scan() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let page = |hash: &str| PageRecord {
            url: "https://example.com".to_string(),
            status_code: 200,
            content_hash: Some(hash.to_string()),
            ..Default::default()
        };

        let old = storage.create_scan("https://example.com").unwrap();
        storage.insert_pages(old, &[page("old")]).unwrap();
        storage.update_scan_status(old, ScanStatus::Completed).unwrap();

        let failed = storage.create_scan("https://example.com").unwrap();
        storage.insert_pages(failed, &[page("failed")]).unwrap();
        storage.update_scan_status(failed, ScanStatus::Failed).unwrap();

        let current = storage.create_scan("https://example.com").unwrap();

        let baseline = Baseline::load(&storage, "https://example.com", current).unwrap();
        assert_eq!(baseline.scan_id(), Some(old));
        assert_eq!(baseline.len(), 1);
        assert_eq!(
            baseline.classify("https://example.com", Some("old")),
            PageChange::Existing
        );
    }
}
