//! Configuration module for Site-Audit
//!
//! Two layers of configuration exist:
//! - the process-level TOML file (timeouts, user agent, database path),
//!   loaded once at startup;
//! - the `settings` table (thresholds, page budget, pacing), snapshotted into
//!   [`ScanSettings`] at the start of every pipeline run.
//!
//! # Example
//!
//! ```no_run
//! use site_audit::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Request timeout: {}s", config.crawler.request_timeout_secs);
//! ```

mod parser;
mod settings;
mod types;
mod validation;

// Re-export types
pub use settings::{is_known_setting, ScanSettings, DEFAULT_SETTINGS};
pub use types::{Config, CrawlerConfig, OutputConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
