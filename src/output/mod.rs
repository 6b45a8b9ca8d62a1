//! Output module for reports and exports
//!
//! This module handles:
//! - Rendering a scan's issue report as markdown
//! - Exporting page rows as CSV or JSON

mod export;
mod markdown;

pub use export::{export_csv, export_json, PageExport};
pub use markdown::{format_markdown_report, write_markdown_report};

use crate::analysis::{aggregate, AnalysisReport};
use crate::config::ScanSettings;
use crate::storage::{with_storage, ScanRecord, SharedStorage, Storage};
use crate::AuditError;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Loads a scan together with its issue report
///
/// The report stored by the last analysis run is used when present.
/// Otherwise it is aggregated from the scan's rows under the current
/// settings, which works for scans that were crawled but never analyzed.
pub fn load_scan_report(
    storage: &SharedStorage,
    scan_id: i64,
) -> Result<(ScanRecord, AnalysisReport), AuditError> {
    let scan = with_storage(storage, |s| s.get_scan(scan_id))?;

    if let Some(json) = scan.report.as_deref() {
        let report = AnalysisReport::from_json(json)?;
        return Ok((scan, report));
    }

    tracing::debug!("Scan {} has no stored report; aggregating from rows", scan_id);

    let (pages, links, images, settings_map) = with_storage(storage, |s| {
        Ok((
            s.get_pages(scan_id)?,
            s.get_links(scan_id)?,
            s.get_images(scan_id)?,
            s.load_settings()?,
        ))
    })?;
    let settings = ScanSettings::from_map(&settings_map)?;

    Ok((scan, aggregate(&pages, &links, &images, &settings)))
}
