// src/services/normalizer.rs

//! Article URL normalization and validation.
//!
//! Links scraped from a site are noisy: hydration payloads and JSON-LD
//! blocks are full of strings shaped like `/news/<something>` that are not
//! articles at all (schema type names, locale codes, timestamps, FAQ
//! questions). [`UrlNormalizer`] turns a raw href into the canonical article
//! URL, or rejects it.

use regex::Regex;
use url::Url;

use crate::error::{AppError, Result};
use crate::utils::host_matches;

/// Generic TLDs treated as "bare domain" noise when they make up a whole slug.
const COMMON_TLDS: &str = "com|io|ai|net|org|dev|co|cn|app";

/// Exclusion patterns applied to the percent-decoded slug.
const STATIC_EXCLUSIONS: [(&str, &str); 13] = [
    ("locale", r"^[a-z]{2}(?:-[A-Za-z]{2})?$"),
    ("schema type", r"^[A-Z][a-z]+(?:[A-Z][a-z]+)*$"),
    ("schema type", r"^[A-Z]{2,}$"),
    (
        "reserved word",
        r"(?i)^(?:customer[ -]?service|contact|about|home|faq|help|support|blog|products?|terms|privacy|search)$",
    ),
    (
        "timestamp",
        r"^\d{4}-\d{2}(?:-\d{2})?(?:T\d{2}:\d{2}(?::\d{2}(?:\.\d+)?)?Z?)?$",
    ),
    ("timestamp", r"\d{4}-\d{2}-\d{2}T\d{2}:\d{2}"),
    ("email", r"^[\w.%+-]+@[\w.-]+$"),
    ("dynamic route", r"\[[^/\]]*\]"),
    ("dynamic route", r"(?:^|/)page-[\w-]+\.js$"),
    ("dynamic route", r"\.m?js$"),
    (
        "question",
        r"^(?:What|How|Can|Is|Are|Where|When|Why|Which|Who|Does|Do|Should)(?:\s|\?|$)",
    ),
    ("space", r"\s"),
    ("escape artifact", r"[\\%]"),
];

/// Validates candidate links for one site's content section.
#[derive(Debug, Clone)]
pub struct UrlNormalizer {
    domain: String,
    section: String,
    exclusions: Vec<(&'static str, Regex)>,
    section_paths: Regex,
}

impl UrlNormalizer {
    /// Create a normalizer for `domain` (e.g. `minimax.io`) and a content
    /// section path (e.g. `/news`).
    pub fn new(domain: &str, section: &str) -> Result<Self> {
        let domain = domain.trim().trim_end_matches('.').to_ascii_lowercase();
        if domain.is_empty() {
            return Err(AppError::config("normalizer domain is empty"));
        }
        let section = format!("/{}", section.trim().trim_matches('/'));

        let mut exclusions = Vec::with_capacity(STATIC_EXCLUSIONS.len() + 2);
        for (category, pattern) in STATIC_EXCLUSIONS {
            exclusions.push((category, compile(pattern)?));
        }
        let generic_domain = format!(r"(?i)^(?:[\w-]+\.)+(?:{COMMON_TLDS})$");
        let site_domain = format!(r"(?i)^(?:[\w-]+\.)*{}$", regex::escape(&domain));
        exclusions.push(("domain", compile(&generic_domain)?));
        exclusions.push(("domain", compile(&site_domain)?));

        let section_paths = compile(&format!(
            r"{}/[A-Za-z0-9._~/%\-]+",
            regex::escape(section.trim_end_matches('/'))
        ))?;

        Ok(Self {
            domain,
            section,
            exclusions,
            section_paths,
        })
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Section path without trailing slash, e.g. `/news`.
    pub fn section(&self) -> &str {
        &self.section
    }

    /// Canonical article URL for `raw` resolved against `base`.
    ///
    /// Returns `None` for anything that is not an article in this section
    /// of this site.
    pub fn normalize(&self, raw: &str, base: &str) -> Option<String> {
        let raw = raw.trim();
        if raw.is_empty() || raw.contains('\\') {
            return None;
        }

        let absolute = match Url::parse(base) {
            Ok(base) => base.join(raw).ok()?,
            Err(_) => Url::parse(raw).ok()?,
        };
        if !matches!(absolute.scheme(), "http" | "https") {
            return None;
        }
        if !self.host_matches_url(&absolute) {
            return None;
        }

        let path = absolute.path().trim_end_matches('/').to_string();
        let slug = self.slug(&path)?;
        if let Some(category) = self.excluded_by(slug) {
            log::trace!("rejected {path} ({category})");
            return None;
        }

        let mut cleaned = absolute;
        cleaned.set_query(None);
        cleaned.set_fragment(None);
        cleaned.set_path(&path);
        Some(cleaned.into())
    }

    /// Whether a URL's host belongs to the configured domain.
    pub fn host_matches(&self, url: &str) -> bool {
        Url::parse(url).is_ok_and(|u| self.host_matches_url(&u))
    }

    /// Regex for section-shaped paths inside arbitrary text.
    pub fn section_path_pattern(&self) -> &Regex {
        &self.section_paths
    }

    fn host_matches_url(&self, url: &Url) -> bool {
        url.host_str()
            .is_some_and(|host| host_matches(host, &self.domain))
    }

    /// Path below the section, or `None` if the path is outside it or is the
    /// section root itself.
    fn slug<'a>(&self, path: &'a str) -> Option<&'a str> {
        if path.is_empty() {
            return None;
        }
        let prefix = self.section.trim_end_matches('/');
        let slug = path.strip_prefix(prefix)?.strip_prefix('/')?;
        (!slug.is_empty()).then_some(slug)
    }

    fn excluded_by(&self, slug: &str) -> Option<&'static str> {
        let Ok(decoded) = urlencoding::decode(slug) else {
            return Some("escape artifact");
        };
        self.exclusions
            .iter()
            .find(|(_, pattern)| pattern.is_match(&decoded))
            .map(|(category, _)| *category)
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| AppError::config(format!("invalid pattern {pattern}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://www.minimax.io/news";

    fn normalizer() -> UrlNormalizer {
        UrlNormalizer::new("minimax.io", "/news").unwrap()
    }

    #[test]
    fn test_strips_query_fragment_and_slash() {
        let n = normalizer();
        let expected = Some("https://www.minimax.io/news/minimax-m25".to_string());
        assert_eq!(n.normalize("/news/minimax-m25", BASE), expected);
        assert_eq!(n.normalize("/news/minimax-m25/", BASE), expected);
        assert_eq!(n.normalize("/news/minimax-m25?utm=x#top", BASE), expected);
        assert_eq!(
            n.normalize("https://www.minimax.io/news/minimax-m25?a=1", BASE),
            expected
        );
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let n = normalizer();
        for raw in [
            "/news/minimax-m25?x=1",
            "news/agent-launch/",
            "https://minimax.io/news/2025/recap#a",
            "/news/%E4%B8%AD%E6%96%87",
        ] {
            let once = n.normalize(raw, BASE).unwrap();
            assert_eq!(n.normalize(&once, BASE), Some(once.clone()), "{raw}");
        }
    }

    #[test]
    fn test_rejects_scheme_host_and_section() {
        let n = normalizer();
        assert!(n.normalize("mailto:api@minimax.io", BASE).is_none());
        assert!(n.normalize("javascript:void(0)", BASE).is_none());
        assert!(n.normalize("https://other.com/news/story", BASE).is_none());
        assert!(n.normalize("https://notminimax.io/news/story", BASE).is_none());
        assert!(n.normalize("/news", BASE).is_none());
        assert!(n.normalize("/news/", BASE).is_none());
        assert!(n.normalize("/blog/story", BASE).is_none());
        assert!(n.normalize("/newsroom/story", BASE).is_none());
        assert!(n.normalize("", BASE).is_none());
    }

    #[test]
    fn test_accepts_subdomain() {
        let n = normalizer();
        assert_eq!(
            n.normalize("https://intl.minimax.io/news/abc", BASE).as_deref(),
            Some("https://intl.minimax.io/news/abc")
        );
    }

    #[test]
    fn test_rejects_exclusion_categories() {
        let n = normalizer();
        for slug in [
            "en",
            "zh",
            "en-US",
            "ImageObject",
            "NewsArticle",
            "BreadcrumbList",
            "Brand",
            "FAQ",
            "contact",
            "Privacy",
            "customer-service",
            "2026-02",
            "2026-02-14",
            "2026-02-14T11:04:30.812Z",
            "archive/2026-02-14T11:13",
            "api@minimax.io",
            "www.minimax.io",
            "minimax.io",
            "example.com",
            "[slug]",
            "[detail]/abc",
            "page-3f2a.js",
            "chunk.mjs",
            "What should I do",
            "How can I reset",
            "Why",
            "hello world",
            "hello%20world",
            "bad%5Cpath",
            "bad%25path",
        ] {
            let raw = format!("/news/{slug}");
            assert!(n.normalize(&raw, BASE).is_none(), "should reject {raw}");
        }
    }

    #[test]
    fn test_rejects_literal_backslash() {
        assert!(normalizer().normalize("/news/a\\b", BASE).is_none());
    }

    #[test]
    fn test_rejects_undecodable_slug() {
        assert!(normalizer().normalize("/news/caf%FF", BASE).is_none());
    }

    #[test]
    fn test_accepts_real_slugs() {
        let n = normalizer();
        for slug in [
            "minimax-m25",
            "minimax-agent",
            "what-is-new-in-m2",
            "2025/annual-recap",
            "MiniMax-M1-release",
            "abab6.5",
        ] {
            let raw = format!("/news/{slug}");
            assert!(n.normalize(&raw, BASE).is_some(), "should accept {raw}");
        }
    }

    #[test]
    fn test_section_path_pattern() {
        let n = normalizer();
        let re = n.section_path_pattern();
        let found: Vec<_> = re
            .find_iter(r#"{"href":"/news/minimax-agent","x":"/blog/y"}"#)
            .map(|m| m.as_str())
            .collect();
        assert_eq!(found, vec!["/news/minimax-agent"]);
    }

    #[test]
    fn test_empty_domain_is_config_error() {
        assert!(UrlNormalizer::new(" ", "/news").unwrap_err().is_config());
    }
}
