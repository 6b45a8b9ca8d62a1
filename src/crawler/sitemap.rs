//! Sitemap parsing
//!
//! Only `<loc>` entries matter: both `<urlset>` and `<sitemapindex>`
//! documents are read the same way, and nested sitemaps are not followed.

use quick_xml::events::Event;
use quick_xml::Reader;

/// Extracts the trimmed text of every `<loc>` element
///
/// Malformed XML yields whatever was read before the error.
///
/// # Example
///
/// ```
/// use site_audit::crawler::parse_sitemap;
///
/// let xml = r#"<urlset><url><loc> https://example.com/ </loc></url></urlset>"#;
/// assert_eq!(parse_sitemap(xml), vec!["https://example.com/".to_string()]);
/// ```
pub fn parse_sitemap(xml: &str) -> Vec<String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut locs = Vec::new();
    let mut in_loc = false;
    let mut current = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"loc" => {
                in_loc = true;
                current.clear();
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"loc" => {
                in_loc = false;
                let loc = current.trim();
                if !loc.is_empty() {
                    locs.push(loc.to_string());
                }
            }
            Ok(Event::Text(t)) if in_loc => match t.unescape() {
                Ok(text) => current.push_str(&text),
                Err(e) => {
                    tracing::debug!("Bad entity in sitemap <loc>: {}", e);
                    break;
                }
            },
            Ok(Event::CData(t)) if in_loc => {
                current.push_str(&String::from_utf8_lossy(&t.into_inner()));
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                tracing::debug!("Sitemap parse stopped at byte {}: {}", reader.buffer_position(), e);
                break;
            }
            _ => {}
        }
    }

    locs
}
