//! URL handling module for Site-Audit
//!
//! This module provides URL normalization (page identity) and the domain
//! helpers used to keep a crawl on a single site.

mod domain;
mod normalize;

// Re-export main functions
pub use domain::{domain_of, extract_domain, is_in_domain, is_xml_path};
pub use normalize::normalize_url;
