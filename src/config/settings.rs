//! Scan settings snapshot
//!
//! Thresholds, the page budget and request pacing live in the `settings`
//! table as string key/value pairs so they can be edited between scans.
//! Each pipeline run reads them once into a typed [`ScanSettings`].

use crate::AuditError;
use std::collections::HashMap;
use std::time::Duration;

/// Settings keys and the values seeded into a fresh database
pub const DEFAULT_SETTINGS: &[(&str, &str)] = &[
    ("min_title_length", "10"),
    ("max_title_length", "60"),
    ("min_desc_length", "70"),
    ("max_desc_length", "160"),
    ("max_image_size_kb", "150"),
    ("max_pages_limit", "200"),
    ("request_delay_ms", "100"),
    ("thin_content_words", "300"),
    ("max_reading_minutes", "10"),
    ("min_readability", "50"),
];

/// Returns true if `key` is a recognised settings key
pub fn is_known_setting(key: &str) -> bool {
    DEFAULT_SETTINGS.iter().any(|(k, _)| *k == key)
}

/// Typed, immutable view of the settings table for one pipeline run
#[derive(Debug, Clone, PartialEq)]
pub struct ScanSettings {
    pub min_title_length: usize,
    pub max_title_length: usize,
    pub min_desc_length: usize,
    pub max_desc_length: usize,
    pub max_image_size_kb: u32,
    /// Maximum number of pages fetched per scan
    pub max_pages: usize,
    /// Pause after every page fetch
    pub request_delay_ms: u64,
    pub thin_content_words: usize,
    pub max_reading_minutes: f64,
    pub min_readability: f64,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            min_title_length: 10,
            max_title_length: 60,
            min_desc_length: 70,
            max_desc_length: 160,
            max_image_size_kb: 150,
            max_pages: 200,
            request_delay_ms: 100,
            thin_content_words: 300,
            max_reading_minutes: 10.0,
            min_readability: 50.0,
        }
    }
}

impl ScanSettings {
    /// Builds a snapshot from the raw settings map
    ///
    /// Missing keys keep their defaults. A value that does not parse, or a
    /// combination that makes no sense, is an error: the pipeline treats it
    /// as a failure rather than guessing.
    pub fn from_map(map: &HashMap<String, String>) -> Result<Self, AuditError> {
        let defaults = Self::default();

        let settings = Self {
            min_title_length: parse_or(map, "min_title_length", defaults.min_title_length)?,
            max_title_length: parse_or(map, "max_title_length", defaults.max_title_length)?,
            min_desc_length: parse_or(map, "min_desc_length", defaults.min_desc_length)?,
            max_desc_length: parse_or(map, "max_desc_length", defaults.max_desc_length)?,
            max_image_size_kb: parse_or(map, "max_image_size_kb", defaults.max_image_size_kb)?,
            max_pages: parse_or(map, "max_pages_limit", defaults.max_pages)?,
            request_delay_ms: parse_or(map, "request_delay_ms", defaults.request_delay_ms)?,
            thin_content_words: parse_or(map, "thin_content_words", defaults.thin_content_words)?,
            max_reading_minutes: parse_or(
                map,
                "max_reading_minutes",
                defaults.max_reading_minutes,
            )?,
            min_readability: parse_or(map, "min_readability", defaults.min_readability)?,
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Delay applied between consecutive requests
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    fn validate(&self) -> Result<(), AuditError> {
        if self.max_pages < 1 {
            return Err(AuditError::Settings(
                "max_pages_limit must be >= 1".to_string(),
            ));
        }

        if self.min_title_length > self.max_title_length {
            return Err(AuditError::Settings(format!(
                "min_title_length ({}) exceeds max_title_length ({})",
                self.min_title_length, self.max_title_length
            )));
        }

        if self.min_desc_length > self.max_desc_length {
            return Err(AuditError::Settings(format!(
                "min_desc_length ({}) exceeds max_desc_length ({})",
                self.min_desc_length, self.max_desc_length
            )));
        }

        Ok(())
    }
}

fn parse_or<T: std::str::FromStr>(
    map: &HashMap<String, String>,
    key: &str,
    default: T,
) -> Result<T, AuditError> {
    match map.get(key) {
        Some(raw) => raw.trim().parse::<T>().map_err(|_| {
            AuditError::Settings(format!("{} has unparsable value '{}'", key, raw))
        }),
        None => Ok(default),
    }
}
