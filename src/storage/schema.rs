//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Site-Audit
//! database. Every per-scan table cascades from `scans`.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One crawl run per start URL request
CREATE TABLE IF NOT EXISTS scans (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    start_url TEXT NOT NULL,
    status TEXT NOT NULL,
    created_at TEXT NOT NULL,
    finished_at TEXT,
    total_issues INTEGER NOT NULL DEFAULT 0,
    new_pages INTEGER NOT NULL DEFAULT 0,
    updated_pages INTEGER NOT NULL DEFAULT 0,
    unchanged_pages INTEGER NOT NULL DEFAULT 0,
    report TEXT
);

CREATE INDEX IF NOT EXISTS idx_scans_start_url ON scans(start_url, status);

-- Crawled and sitemap-known pages
CREATE TABLE IF NOT EXISTS pages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    scan_id INTEGER NOT NULL REFERENCES scans(id) ON DELETE CASCADE,
    url TEXT NOT NULL,
    status_code INTEGER NOT NULL DEFAULT 0,
    title TEXT NOT NULL DEFAULT '',
    meta_description TEXT NOT NULL DEFAULT '',
    html TEXT,
    content_hash TEXT,
    is_orphan INTEGER NOT NULL DEFAULT 0,
    incoming_links INTEGER NOT NULL DEFAULT 0,
    change TEXT NOT NULL DEFAULT 'existing',
    word_count INTEGER NOT NULL DEFAULT 0,
    reading_time REAL NOT NULL DEFAULT 0,
    readability REAL NOT NULL DEFAULT 0,
    h1_count INTEGER NOT NULL DEFAULT 0,
    internal_links INTEGER NOT NULL DEFAULT 0,
    external_links INTEGER NOT NULL DEFAULT 0,
    top_keywords TEXT NOT NULL DEFAULT '',
    spelling_issues INTEGER NOT NULL DEFAULT 0,
    spelling_examples TEXT NOT NULL DEFAULT '[]',
    grammar_issues INTEGER NOT NULL DEFAULT 0,
    grammar_examples TEXT NOT NULL DEFAULT '[]',
    UNIQUE(scan_id, url)
);

CREATE INDEX IF NOT EXISTS idx_pages_scan ON pages(scan_id);

-- One row per link occurrence
CREATE TABLE IF NOT EXISTS links (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    scan_id INTEGER NOT NULL REFERENCES scans(id) ON DELETE CASCADE,
    source_url TEXT NOT NULL,
    target_url TEXT NOT NULL,
    anchor_text TEXT NOT NULL DEFAULT '',
    status_code INTEGER NOT NULL DEFAULT 0,
    is_broken INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_links_scan ON links(scan_id);

-- One row per image occurrence
CREATE TABLE IF NOT EXISTS images (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    scan_id INTEGER NOT NULL REFERENCES scans(id) ON DELETE CASCADE,
    page_url TEXT NOT NULL,
    image_url TEXT NOT NULL,
    alt_text TEXT NOT NULL DEFAULT '',
    file_size_kb INTEGER NOT NULL DEFAULT 0,
    is_large INTEGER NOT NULL DEFAULT 0,
    missing_alt INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_images_scan ON images(scan_id);

-- Editable thresholds and limits
CREATE TABLE IF NOT EXISTS settings (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
