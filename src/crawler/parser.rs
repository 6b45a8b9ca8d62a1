//! HTML parser for extracting page signals
//!
//! This module handles parsing HTML content to extract:
//! - Page title and meta description
//! - Links and images, resolved against the page URL
//! - Visible text and its content hash
//! - H1 count

use crate::url::{domain_of, is_xml_path};
use scraper::{ElementRef, Html, Node, Selector};
use sha2::{Digest, Sha256};
use url::Url;

/// Elements whose text never counts as visible content
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "nav", "footer", "svg", "noscript"];

/// A link found on a page
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedLink {
    /// Absolute URL after resolving against the page
    pub url: String,
    /// The raw `href` attribute, trimmed
    pub href: String,
    /// Trimmed anchor text
    pub anchor_text: String,
    /// True if the resolved URL belongs to the crawl domain
    pub in_domain: bool,
}

/// An image found on a page
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedImage {
    pub url: String,
    pub alt: String,
}

/// Extracted information from an HTML page
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    /// Trimmed `<title>` text, empty if absent
    pub title: String,

    /// Trimmed `meta[name=description]` content, empty if absent
    pub meta_description: String,

    /// Links in document order
    pub links: Vec<ExtractedLink>,

    /// Images in document order
    pub images: Vec<ExtractedImage>,

    /// Visible text, whitespace-collapsed
    pub text: String,

    /// Lowercase hex SHA-256 of `text`
    pub content_hash: String,

    pub h1_count: u32,
}

/// Parses HTML content and extracts page signals
///
/// # Link Extraction Rules
///
/// **Skip** hrefs that are empty or start with `#`, `mailto:`, `tel:` or
/// `javascript:`. **Drop** anything that resolves to a non-HTTP(S) URL or
/// to a path ending in `.xml`.
///
/// The content hash covers visible text only, so markup-only edits do not
/// change it.
///
/// # Arguments
///
/// * `html` - The HTML content to parse
/// * `base_url` - The page URL, used to resolve relative links
/// * `domain` - The crawl domain, used to tag in-domain links
///
/// # Example
///
/// ```
/// use site_audit::crawler::parse_html;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let parsed = parse_html(html, &base_url, "example.com");
/// assert_eq!(parsed.title, "Test");
/// assert_eq!(parsed.links[0].url, "https://example.com/page");
/// assert!(parsed.links[0].in_domain);
/// ```
pub fn parse_html(html: &str, base_url: &Url, domain: &str) -> ParsedPage {
    let document = Html::parse_document(html);

    let text = visible_text(&document);
    let content_hash = hash_text(&text);

    ParsedPage {
        title: extract_title(&document),
        meta_description: extract_meta_description(&document),
        links: extract_links(&document, base_url, domain),
        images: extract_images(&document, base_url),
        text,
        content_hash,
        h1_count: count_elements(&document, "h1"),
    }
}

/// Hex SHA-256 digest of the given text
pub fn hash_text(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

fn extract_title(document: &Html) -> String {
    let Ok(selector) = Selector::parse("title") else {
        return String::new();
    };

    document
        .select(&selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

fn extract_meta_description(document: &Html) -> String {
    let Ok(selector) = Selector::parse(r#"meta[name="description"]"#) else {
        return String::new();
    };

    document
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr("content"))
        .map(|content| content.trim().to_string())
        .unwrap_or_default()
}

fn extract_links(document: &Html, base_url: &Url, domain: &str) -> Vec<ExtractedLink> {
    let mut links = Vec::new();

    let Ok(selector) = Selector::parse("a[href]") else {
        return links;
    };

    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let href = href.trim();

        if let Some(url) = resolve_link(href, base_url) {
            let in_domain = domain_of(&url).is_some_and(|d| d == domain);
            links.push(ExtractedLink {
                url,
                href: href.to_string(),
                anchor_text: element.text().collect::<String>().trim().to_string(),
                in_domain,
            });
        }
    }

    links
}

fn extract_images(document: &Html, base_url: &Url) -> Vec<ExtractedImage> {
    let Ok(selector) = Selector::parse("img[src]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element| {
            let src = element.value().attr("src")?.trim();
            if src.is_empty() {
                return None;
            }
            let url = base_url.join(src).ok()?;
            Some(ExtractedImage {
                url: url.to_string(),
                alt: element.value().attr("alt").unwrap_or("").trim().to_string(),
            })
        })
        .collect()
}

fn count_elements(document: &Html, tag: &str) -> u32 {
    match Selector::parse(tag) {
        Ok(selector) => document.select(&selector).count() as u32,
        Err(_) => 0,
    }
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - fragment-only, javascript:, mailto:, tel: targets
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
/// - Paths ending in `.xml`
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    if href.is_empty() {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with('#')
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("javascript:")
    {
        return None;
    }

    let resolved = base_url.join(href).ok()?;

    if resolved.scheme() != "http" && resolved.scheme() != "https" {
        return None;
    }

    let resolved = resolved.to_string();
    if is_xml_path(&resolved) {
        return None;
    }

    Some(resolved)
}

/// Collects text outside hidden elements, collapsing runs of whitespace
fn visible_text(document: &Html) -> String {
    let mut raw = String::new();
    collect_text(document.root_element(), &mut raw);
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                out.push_str(text);
                out.push(' ');
            }
            Node::Element(el) if !HIDDEN_ELEMENTS.contains(&el.name()) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    collect_text(child_element, out);
                }
            }
            _ => {}
        }
    }
}
