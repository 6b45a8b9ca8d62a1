use url::Url;

/// Normalizes a URL into the canonical string used for page identity
///
/// # Normalization Steps
///
/// 1. Parse the URL (the parser lowercases scheme and host)
/// 2. Keep userinfo and any non-default port
/// 3. Strip trailing slashes from the path (`/` becomes empty)
/// 4. Keep the query string exactly as given
/// 5. Drop the fragment
///
/// Path case is preserved. Input that does not parse is returned trimmed,
/// minus any fragment, so the function never fails; an unreachable URL is
/// caught later by the fetcher instead.
///
/// The result is a fixed point: normalizing it again yields the same string.
///
/// # Examples
///
/// ```
/// use site_audit::url::normalize_url;
///
/// assert_eq!(normalize_url("HTTP://Example.COM/Page/#top"), "http://example.com/Page");
/// assert_eq!(normalize_url("https://example.com/"), "https://example.com");
/// ```
pub fn normalize_url(url_str: &str) -> String {
    let trimmed = url_str.trim();

    let url = match Url::parse(trimmed) {
        Ok(url) => url,
        Err(_) => return strip_fragment(trimmed).to_string(),
    };

    let Some(host) = url.host_str() else {
        // mailto:, data: and friends have no authority to canonicalize
        let mut url = url;
        url.set_fragment(None);
        return url.to_string();
    };

    let mut normalized = format!("{}://", url.scheme());

    if !url.username().is_empty() {
        normalized.push_str(url.username());
        if let Some(password) = url.password() {
            normalized.push(':');
            normalized.push_str(password);
        }
        normalized.push('@');
    }

    normalized.push_str(&host.to_lowercase());

    if let Some(port) = url.port() {
        normalized.push(':');
        normalized.push_str(&port.to_string());
    }

    normalized.push_str(url.path().trim_end_matches('/'));

    if let Some(query) = url.query() {
        normalized.push('?');
        normalized.push_str(query);
    }

    normalized
}

fn strip_fragment(s: &str) -> &str {
    match s.find('#') {
        Some(idx) => &s[..idx],
        None => s,
    }
}
