//! State module for tracking scan progress
//!
//! # Components
//!
//! - `ScanStatus`: lifecycle of a scan record (pending through completed)
//! - `PageChange`: per-page classification against the previous scan

mod page_change;
mod scan_status;

// Re-export main types
pub use page_change::PageChange;
pub use scan_status::ScanStatus;
