//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::config::DEFAULT_SETTINGS;
use crate::state::{PageChange, ScanStatus};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{ImageRecord, LinkRecord, PageMetrics, PageRecord, ScanRecord};
use crate::AuditError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashMap;
use std::path::Path;

const SCAN_COLUMNS: &str = "id, start_url, status, created_at, finished_at, total_issues,
     new_pages, updated_pages, unchanged_pages, report";

const PAGE_COLUMNS: &str = "url, status_code, title, meta_description, html, content_hash,
     is_orphan, incoming_links, change, word_count, reading_time, readability, h1_count,
     internal_links, external_links, top_keywords, spelling_issues, spelling_examples,
     grammar_issues, grammar_examples";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(AuditError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, AuditError> {
        let conn = Connection::open(path)?;

        // WAL lets the CLI read status while a scan task writes
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, AuditError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn scan_from_row(row: &Row<'_>) -> rusqlite::Result<ScanRecord> {
    Ok(ScanRecord {
        id: row.get(0)?,
        start_url: row.get(1)?,
        status: ScanStatus::from_db_string(&row.get::<_, String>(2)?)
            .unwrap_or(ScanStatus::Failed),
        created_at: row.get(3)?,
        finished_at: row.get(4)?,
        total_issues: row.get(5)?,
        new_pages: row.get(6)?,
        updated_pages: row.get(7)?,
        unchanged_pages: row.get(8)?,
        report: row.get(9)?,
    })
}

fn page_from_row(row: &Row<'_>) -> rusqlite::Result<PageRecord> {
    let spelling_examples: String = row.get(17)?;
    let grammar_examples: String = row.get(19)?;

    Ok(PageRecord {
        url: row.get(0)?,
        status_code: row.get(1)?,
        title: row.get(2)?,
        meta_description: row.get(3)?,
        html: row.get(4)?,
        content_hash: row.get(5)?,
        is_orphan: row.get(6)?,
        incoming_links: row.get(7)?,
        change: PageChange::from_db_string(&row.get::<_, String>(8)?).unwrap_or_default(),
        metrics: PageMetrics {
            word_count: row.get(9)?,
            reading_time: row.get(10)?,
            readability: row.get(11)?,
            h1_count: row.get(12)?,
            internal_links: row.get(13)?,
            external_links: row.get(14)?,
            top_keywords: row.get(15)?,
            spelling_issues: row.get(16)?,
            spelling_examples: serde_json::from_str(&spelling_examples).unwrap_or_default(),
            grammar_issues: row.get(18)?,
            grammar_examples: serde_json::from_str(&grammar_examples).unwrap_or_default(),
        },
    })
}

impl Storage for SqliteStorage {
    // ===== Scan Management =====

    fn create_scan(&mut self, start_url: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO scans (start_url, status, created_at) VALUES (?1, ?2, ?3)",
            params![start_url, ScanStatus::Pending.to_db_string(), now],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_scan(&self, scan_id: i64) -> StorageResult<ScanRecord> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM scans WHERE id = ?1", SCAN_COLUMNS))?;

        stmt.query_row(params![scan_id], scan_from_row)
            .optional()?
            .ok_or(StorageError::ScanNotFound(scan_id))
    }

    fn update_scan_status(&mut self, scan_id: i64, status: ScanStatus) -> StorageResult<()> {
        let finished_at = match status {
            ScanStatus::Completed | ScanStatus::Failed => Some(Utc::now().to_rfc3339()),
            _ => None,
        };

        let updated = self.conn.execute(
            "UPDATE scans SET status = ?1, finished_at = COALESCE(?2, finished_at) WHERE id = ?3",
            params![status.to_db_string(), finished_at, scan_id],
        )?;

        if updated == 0 {
            return Err(StorageError::ScanNotFound(scan_id));
        }
        Ok(())
    }

    fn increment_change_count(&mut self, scan_id: i64, change: PageChange) -> StorageResult<()> {
        let column = match change {
            PageChange::New => "new_pages",
            PageChange::Updated => "updated_pages",
            PageChange::Existing => "unchanged_pages",
        };

        self.conn.execute(
            &format!("UPDATE scans SET {0} = {0} + 1 WHERE id = ?1", column),
            params![scan_id],
        )?;
        Ok(())
    }

    fn set_scan_report(
        &mut self,
        scan_id: i64,
        report_json: &str,
        total_issues: u32,
    ) -> StorageResult<()> {
        self.conn.execute(
            "UPDATE scans SET report = ?1, total_issues = ?2 WHERE id = ?3",
            params![report_json, total_issues, scan_id],
        )?;
        Ok(())
    }

    fn latest_completed_scan(
        &self,
        start_url: &str,
        exclude_id: i64,
    ) -> StorageResult<Option<ScanRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM scans WHERE start_url = ?1 AND status = ?2 AND id != ?3
             ORDER BY id DESC LIMIT 1",
            SCAN_COLUMNS
        ))?;

        let scan = stmt
            .query_row(
                params![
                    start_url,
                    ScanStatus::Completed.to_db_string(),
                    exclude_id
                ],
                scan_from_row,
            )
            .optional()?;

        Ok(scan)
    }

    fn list_scans(&self, page: u32, per_page: u32) -> StorageResult<Vec<ScanRecord>> {
        let offset = page.saturating_sub(1) as i64 * per_page as i64;
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM scans ORDER BY id DESC LIMIT ?1 OFFSET ?2",
            SCAN_COLUMNS
        ))?;

        let scans = stmt
            .query_map(params![per_page, offset], scan_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(scans)
    }

    fn count_scans(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM scans", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    // ===== Page Management =====

    fn insert_pages(&mut self, scan_id: i64, pages: &[PageRecord]) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT OR REPLACE INTO pages (scan_id, {})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11,
                         ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21)",
                PAGE_COLUMNS
            ))?;

            for page in pages {
                let m = &page.metrics;
                stmt.execute(params![
                    scan_id,
                    page.url,
                    page.status_code,
                    page.title,
                    page.meta_description,
                    page.html,
                    page.content_hash,
                    page.is_orphan,
                    page.incoming_links,
                    page.change.to_db_string(),
                    m.word_count,
                    m.reading_time,
                    m.readability,
                    m.h1_count,
                    m.internal_links,
                    m.external_links,
                    m.top_keywords,
                    m.spelling_issues,
                    serde_json::to_string(&m.spelling_examples)?,
                    m.grammar_issues,
                    serde_json::to_string(&m.grammar_examples)?,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn get_pages(&self, scan_id: i64) -> StorageResult<Vec<PageRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM pages WHERE scan_id = ?1 ORDER BY id",
            PAGE_COLUMNS
        ))?;

        let pages = stmt
            .query_map(params![scan_id], page_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(pages)
    }

    fn page_hashes(&self, scan_id: i64) -> StorageResult<HashMap<String, String>> {
        let mut stmt = self.conn.prepare(
            "SELECT url, content_hash FROM pages
             WHERE scan_id = ?1 AND content_hash IS NOT NULL AND content_hash != ''",
        )?;

        let hashes = stmt
            .query_map(params![scan_id], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<HashMap<_, _>, _>>()?;

        Ok(hashes)
    }

    fn update_page_metrics(
        &mut self,
        scan_id: i64,
        url: &str,
        metrics: &PageMetrics,
    ) -> StorageResult<()> {
        let updated = self.conn.execute(
            "UPDATE pages SET word_count = ?1, reading_time = ?2, readability = ?3,
             h1_count = ?4, internal_links = ?5, external_links = ?6, top_keywords = ?7,
             spelling_issues = ?8, spelling_examples = ?9, grammar_issues = ?10,
             grammar_examples = ?11
             WHERE scan_id = ?12 AND url = ?13",
            params![
                metrics.word_count,
                metrics.reading_time,
                metrics.readability,
                metrics.h1_count,
                metrics.internal_links,
                metrics.external_links,
                metrics.top_keywords,
                metrics.spelling_issues,
                serde_json::to_string(&metrics.spelling_examples)?,
                metrics.grammar_issues,
                serde_json::to_string(&metrics.grammar_examples)?,
                scan_id,
                url,
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::PageNotFound(url.to_string()));
        }
        Ok(())
    }

    // ===== Link Management =====

    fn insert_links(&mut self, scan_id: i64, links: &[LinkRecord]) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO links (scan_id, source_url, target_url, anchor_text, status_code, is_broken)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for link in links {
                stmt.execute(params![
                    scan_id,
                    link.source_url,
                    link.target_url,
                    link.anchor_text,
                    link.status_code,
                    link.is_broken,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn get_links(&self, scan_id: i64) -> StorageResult<Vec<LinkRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT source_url, target_url, anchor_text, status_code, is_broken
             FROM links WHERE scan_id = ?1 ORDER BY id",
        )?;

        let links = stmt
            .query_map(params![scan_id], |row| {
                Ok(LinkRecord {
                    source_url: row.get(0)?,
                    target_url: row.get(1)?,
                    anchor_text: row.get(2)?,
                    status_code: row.get(3)?,
                    is_broken: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(links)
    }

    // ===== Image Management =====

    fn insert_images(&mut self, scan_id: i64, images: &[ImageRecord]) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO images (scan_id, page_url, image_url, alt_text, file_size_kb, is_large, missing_alt)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for image in images {
                stmt.execute(params![
                    scan_id,
                    image.page_url,
                    image.image_url,
                    image.alt_text,
                    image.file_size_kb,
                    image.is_large,
                    image.missing_alt,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn get_images(&self, scan_id: i64) -> StorageResult<Vec<ImageRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT page_url, image_url, alt_text, file_size_kb, is_large, missing_alt
             FROM images WHERE scan_id = ?1 ORDER BY id",
        )?;

        let images = stmt
            .query_map(params![scan_id], |row| {
                Ok(ImageRecord {
                    page_url: row.get(0)?,
                    image_url: row.get(1)?,
                    alt_text: row.get(2)?,
                    file_size_kb: row.get(3)?,
                    is_large: row.get(4)?,
                    missing_alt: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(images)
    }

    // ===== Settings =====

    fn seed_default_settings(&mut self) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt =
                tx.prepare("INSERT OR IGNORE INTO settings (key, value) VALUES (?1, ?2)")?;
            for (key, value) in DEFAULT_SETTINGS {
                stmt.execute(params![key, value])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn load_settings(&self) -> StorageResult<HashMap<String, String>> {
        let mut stmt = self.conn.prepare("SELECT key, value FROM settings")?;

        let settings = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<HashMap<_, _>, _>>()?;

        Ok(settings)
    }

    fn set_setting(&mut self, key: &str, value: &str) -> StorageResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(url: &str, hash: Option<&str>) -> PageRecord {
        PageRecord {
            url: url.to_string(),
            status_code: 200,
            title: "Title".to_string(),
            content_hash: hash.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_in_memory() {
        let storage = SqliteStorage::new_in_memory();
        assert!(storage.is_ok());
    }

    #[test]
    fn test_create_scan() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let scan_id = storage.create_scan("https://example.com").unwrap();
        assert!(scan_id > 0);

        let scan = storage.get_scan(scan_id).unwrap();
        assert_eq!(scan.start_url, "https://example.com");
        assert_eq!(scan.status, ScanStatus::Pending);
        assert_eq!(scan.total_issues, 0);
        assert!(scan.report.is_none());
        assert!(scan.finished_at.is_none());
    }

    #[test]
    fn test_get_missing_scan() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        assert!(matches!(
            storage.get_scan(42),
            Err(StorageError::ScanNotFound(42))
        ));
    }

    #[test]
    fn test_update_status_stamps_finish() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let scan_id = storage.create_scan("https://example.com").unwrap();

        storage
            .update_scan_status(scan_id, ScanStatus::Crawling)
            .unwrap();
        assert!(storage.get_scan(scan_id).unwrap().finished_at.is_none());

        storage
            .update_scan_status(scan_id, ScanStatus::Failed)
            .unwrap();
        let scan = storage.get_scan(scan_id).unwrap();
        assert_eq!(scan.status, ScanStatus::Failed);
        assert!(scan.finished_at.is_some());
    }

    #[test]
    fn test_increment_change_counts() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let scan_id = storage.create_scan("https://example.com").unwrap();

        storage
            .increment_change_count(scan_id, PageChange::New)
            .unwrap();
        storage
            .increment_change_count(scan_id, PageChange::New)
            .unwrap();
        storage
            .increment_change_count(scan_id, PageChange::Updated)
            .unwrap();
        storage
            .increment_change_count(scan_id, PageChange::Existing)
            .unwrap();

        let scan = storage.get_scan(scan_id).unwrap();
        assert_eq!(scan.new_pages, 2);
        assert_eq!(scan.updated_pages, 1);
        assert_eq!(scan.unchanged_pages, 1);
    }

    #[test]
    fn test_latest_completed_scan() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let first = storage.create_scan("https://example.com").unwrap();
        let second = storage.create_scan("https://example.com").unwrap();
        let other = storage.create_scan("https://other.com").unwrap();
        let current = storage.create_scan("https://example.com").unwrap();

        for id in [first, second, other] {
            storage
                .update_scan_status(id, ScanStatus::Completed)
                .unwrap();
        }

        let baseline = storage
            .latest_completed_scan("https://example.com", current)
            .unwrap()
            .unwrap();
        assert_eq!(baseline.id, second);

        // A scan is never its own baseline
        let baseline = storage
            .latest_completed_scan("https://example.com", second)
            .unwrap()
            .unwrap();
        assert_eq!(baseline.id, first);

        assert!(storage
            .latest_completed_scan("https://nowhere.com", current)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_list_scans_pagination() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        for i in 0..5 {
            storage
                .create_scan(&format!("https://example{}.com", i))
                .unwrap();
        }

        assert_eq!(storage.count_scans().unwrap(), 5);

        let first_page = storage.list_scans(1, 2).unwrap();
        assert_eq!(first_page.len(), 2);
        assert_eq!(first_page[0].start_url, "https://example4.com");
        assert_eq!(first_page[1].start_url, "https://example3.com");

        let last_page = storage.list_scans(3, 2).unwrap();
        assert_eq!(last_page.len(), 1);
        assert_eq!(last_page[0].start_url, "https://example0.com");

        assert!(storage.list_scans(4, 2).unwrap().is_empty());
    }

    #[test]
    fn test_insert_and_get_pages() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let scan_id = storage.create_scan("https://example.com").unwrap();

        let mut orphan = page("https://example.com/orphan", None);
        orphan.status_code = 404;
        orphan.is_orphan = true;

        storage
            .insert_pages(
                scan_id,
                &[page("https://example.com", Some("aaa")), orphan],
            )
            .unwrap();

        let pages = storage.get_pages(scan_id).unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].url, "https://example.com");
        assert_eq!(pages[0].content_hash.as_deref(), Some("aaa"));
        assert_eq!(pages[1].status_code, 404);
        assert!(pages[1].is_orphan);
        assert_eq!(pages[1].change, PageChange::Existing);
    }

    #[test]
    fn test_insert_duplicate_page_replaces() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let scan_id = storage.create_scan("https://example.com").unwrap();

        storage
            .insert_pages(scan_id, &[page("https://example.com", Some("old"))])
            .unwrap();
        storage
            .insert_pages(scan_id, &[page("https://example.com", Some("new"))])
            .unwrap();

        let pages = storage.get_pages(scan_id).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].content_hash.as_deref(), Some("new"));
    }

    #[test]
    fn test_page_hashes_skip_unhashed() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let scan_id = storage.create_scan("https://example.com").unwrap();

        storage
            .insert_pages(
                scan_id,
                &[
                    page("https://example.com", Some("aaa")),
                    page("https://example.com/pdf", None),
                ],
            )
            .unwrap();

        let hashes = storage.page_hashes(scan_id).unwrap();
        assert_eq!(hashes.len(), 1);
        assert_eq!(hashes.get("https://example.com").map(String::as_str), Some("aaa"));
    }

    #[test]
    fn test_update_page_metrics() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let scan_id = storage.create_scan("https://example.com").unwrap();
        storage
            .insert_pages(scan_id, &[page("https://example.com", Some("aaa"))])
            .unwrap();

        let metrics = PageMetrics {
            word_count: 420,
            reading_time: 2.1,
            readability: 61.3,
            h1_count: 1,
            internal_links: 4,
            external_links: 2,
            top_keywords: "rust, crawler".to_string(),
            spelling_issues: 1,
            spelling_examples: vec!["teh".to_string()],
            grammar_issues: 0,
            grammar_examples: Vec::new(),
        };
        storage
            .update_page_metrics(scan_id, "https://example.com", &metrics)
            .unwrap();

        let pages = storage.get_pages(scan_id).unwrap();
        assert_eq!(pages[0].metrics, metrics);

        let missing = storage.update_page_metrics(scan_id, "https://example.com/x", &metrics);
        assert!(matches!(missing, Err(StorageError::PageNotFound(_))));
    }

    #[test]
    fn test_links_and_images_roundtrip() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let scan_id = storage.create_scan("https://example.com").unwrap();

        let link = LinkRecord {
            source_url: "https://example.com".to_string(),
            target_url: "https://example.com/gone".to_string(),
            anchor_text: "Gone".to_string(),
            status_code: 404,
            is_broken: true,
        };
        let image = ImageRecord {
            page_url: "https://example.com".to_string(),
            image_url: "https://example.com/hero.png".to_string(),
            alt_text: String::new(),
            file_size_kb: 300,
            is_large: true,
            missing_alt: true,
        };

        storage.insert_links(scan_id, &[link.clone()]).unwrap();
        storage.insert_images(scan_id, &[image.clone()]).unwrap();

        assert_eq!(storage.get_links(scan_id).unwrap(), vec![link]);
        assert_eq!(storage.get_images(scan_id).unwrap(), vec![image]);
    }

    #[test]
    fn test_settings_seed_and_update() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage.seed_default_settings().unwrap();

        let settings = storage.load_settings().unwrap();
        assert_eq!(settings.len(), DEFAULT_SETTINGS.len());
        assert_eq!(settings.get("max_pages_limit").map(String::as_str), Some("200"));

        storage.set_setting("max_pages_limit", "5").unwrap();

        // Seeding again keeps user edits
        storage.seed_default_settings().unwrap();
        let settings = storage.load_settings().unwrap();
        assert_eq!(settings.get("max_pages_limit").map(String::as_str), Some("5"));
    }
}
