//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - GET requests to fetch page content
//! - HEAD probes for link status and image size
//! - Error classification
//!
//! Nothing here returns `Err`: every failure becomes data the crawl records.

use crate::config::{CrawlerConfig, UserAgentConfig};
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{redirect::Policy, Client, Response, StatusCode};
use std::time::Duration;

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// A 200 response with an HTML content type
    Html {
        /// HTTP status code
        status_code: u16,
        /// Content-Type header value
        content_type: String,
        /// Page body content
        body: String,
    },

    /// Any other response (non-200 status or non-HTML body)
    Other {
        /// HTTP status code
        status_code: u16,
        /// Content-Type header value, empty if absent
        content_type: String,
    },

    /// Network error (connection refused, timeout, etc.)
    NetworkError {
        /// Error description
        error: String,
    },
}

impl FetchResult {
    /// Status code to record for this result, 0 for a network failure
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Html { status_code, .. } | Self::Other { status_code, .. } => *status_code,
            Self::NetworkError { .. } => 0,
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// Redirects are followed (up to 10 hops) so a moved page reports the
/// status of its final destination.
///
/// # Example
///
/// ```no_run
/// use site_audit::config::UserAgentConfig;
/// use site_audit::crawler::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "SiteAudit".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// HTTP access for one pipeline
///
/// Cloning is cheap; the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    request_timeout: Duration,
    check_timeout: Duration,
}

impl Fetcher {
    /// Creates a fetcher from the process configuration
    pub fn new(user_agent: &UserAgentConfig, crawler: &CrawlerConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(user_agent)?,
            request_timeout: Duration::from_secs(crawler.request_timeout_secs),
            check_timeout: Duration::from_secs(crawler.check_timeout_secs),
        })
    }

    /// Fetches a page with GET
    ///
    /// Only a 200 response whose Content-Type contains `text/html` yields
    /// [`FetchResult::Html`]. Everything else is [`FetchResult::Other`], or
    /// [`FetchResult::NetworkError`] if no response arrived.
    pub async fn fetch_page(&self, url: &str) -> FetchResult {
        let response = match self
            .client
            .get(url)
            .timeout(self.request_timeout)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return classify_error(e),
        };

        let status = response.status();
        let content_type = content_type_of(&response);

        if status != StatusCode::OK || !is_html(&content_type) {
            return FetchResult::Other {
                status_code: status.as_u16(),
                content_type,
            };
        }

        match response.text().await {
            Ok(body) => FetchResult::Html {
                status_code: status.as_u16(),
                content_type,
                body,
            },
            Err(e) => classify_error(e),
        }
    }

    /// Fetches a body as text regardless of content type
    ///
    /// Used for sitemaps. Returns None on any failure or non-success status.
    pub async fn fetch_text(&self, url: &str) -> Option<String> {
        let response = self
            .client
            .get(url)
            .timeout(self.request_timeout)
            .send()
            .await
            .ok()?;

        if !response.status().is_success() {
            tracing::debug!("Sitemap fetch {} returned {}", url, response.status());
            return None;
        }

        response.text().await.ok()
    }

    /// Sends a HEAD request and returns its status code
    ///
    /// Returns 0 on network error or timeout.
    pub async fn check_status(&self, url: &str) -> u16 {
        match self.head(url).await {
            Some(response) => response.status().as_u16(),
            None => 0,
        }
    }

    /// Sends a HEAD request and returns Content-Length in kilobytes, rounded
    ///
    /// Returns 0 if the header is missing or unparsable, or on error.
    pub async fn image_size_kb(&self, url: &str) -> u32 {
        let Some(response) = self.head(url).await else {
            return 0;
        };

        response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(bytes_to_kb)
            .unwrap_or(0)
    }

    async fn head(&self, url: &str) -> Option<Response> {
        match self
            .client
            .head(url)
            .timeout(self.check_timeout)
            .send()
            .await
        {
            Ok(response) => Some(response),
            Err(e) => {
                tracing::debug!("HEAD {} failed: {}", url, e);
                None
            }
        }
    }
}

fn content_type_of(response: &Response) -> String {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string()
}

/// Media types compare case-insensitively
fn is_html(content_type: &str) -> bool {
    content_type.to_ascii_lowercase().contains("text/html")
}

fn bytes_to_kb(bytes: u64) -> u32 {
    let kb = (bytes as f64 / 1024.0).round();
    kb.min(u32::MAX as f64) as u32
}

fn classify_error(e: reqwest::Error) -> FetchResult {
    let error = if e.is_timeout() {
        "Request timeout".to_string()
    } else if e.is_connect() {
        "Connection refused".to_string()
    } else {
        e.to_string()
    };

    FetchResult::NetworkError { error }
}
