use url::Url;

/// Extracts the crawl domain from a URL
///
/// The crawl domain is the lowercase host plus the port when one is given
/// explicitly, so `http://localhost:3000` and `http://localhost:4000` are
/// different sites. Default ports are never included.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use site_audit::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("http://127.0.0.1:8080/").unwrap();
/// assert_eq!(extract_domain(&url), Some("127.0.0.1:8080".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    })
}

/// Extracts the crawl domain from a URL string, if it parses
pub fn domain_of(url_str: &str) -> Option<String> {
    Url::parse(url_str).ok().as_ref().and_then(extract_domain)
}

/// Returns true if `url_str` belongs to `domain`
pub fn is_in_domain(url_str: &str, domain: &str) -> bool {
    domain_of(url_str).is_some_and(|d| d == domain)
}

/// Returns true if the URL's path ends in `.xml` (case-insensitive)
///
/// Sitemaps and feeds are never treated as pages.
pub fn is_xml_path(url_str: &str) -> bool {
    match Url::parse(url_str) {
        Ok(url) => url.path().to_ascii_lowercase().ends_with(".xml"),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_simple_domain() {
        let url = Url::parse("https://example.com/").unwrap();
        assert_eq!(extract_domain(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_extract_subdomain() {
        let url = Url::parse("https://blog.example.com/post").unwrap();
        assert_eq!(extract_domain(&url), Some("blog.example.com".to_string()));
    }

    #[test]
    fn test_extract_with_port() {
        let url = Url::parse("https://example.com:8080/").unwrap();
        assert_eq!(extract_domain(&url), Some("example.com:8080".to_string()));
    }

    #[test]
    fn test_default_port_omitted() {
        let url = Url::parse("https://example.com:443/").unwrap();
        assert_eq!(extract_domain(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_extract_mixed_case() {
        let url = Url::parse("https://Example.COM/").unwrap();
        assert_eq!(extract_domain(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_no_host() {
        let url = Url::parse("mailto:someone@example.com").unwrap();
        assert_eq!(extract_domain(&url), None);
    }

    #[test]
    fn test_is_in_domain() {
        assert!(is_in_domain("https://example.com/a", "example.com"));
        assert!(!is_in_domain("https://other.com/a", "example.com"));
        assert!(!is_in_domain("https://sub.example.com/a", "example.com"));
        assert!(!is_in_domain("garbage", "example.com"));
    }

    #[test]
    fn test_is_xml_path() {
        assert!(is_xml_path("https://example.com/sitemap.xml"));
        assert!(is_xml_path("https://example.com/feeds/Posts.XML?page=2"));
        assert!(!is_xml_path("https://example.com/xml-guide"));
        assert!(!is_xml_path("not a url"));
    }
}
