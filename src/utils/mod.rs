//! Utility functions and helpers.

pub mod date;
pub mod http;
pub mod text;

use url::Url;

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> Option<Url> {
    base.join(href.trim()).ok()
}

/// `scheme://host[:port]` of a URL.
pub fn site_root(url: &Url) -> String {
    url.origin().ascii_serialization()
}

/// Whether `host` is `domain` itself or a subdomain of it.
///
/// Matching is on whole labels: `news.example.com` matches `example.com`,
/// `badexample.com` does not.
pub fn host_matches(host: &str, domain: &str) -> bool {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    let domain = domain.trim_end_matches('.').to_ascii_lowercase();
    if domain.is_empty() {
        return false;
    }
    host == domain
        || host
            .strip_suffix(domain.as_str())
            .is_some_and(|prefix| prefix.ends_with('.'))
}
