// src/services/sitemap.rs

//! Sitemap and robots.txt parsing.

use std::sync::LazyLock;

use quick_xml::Reader;
use quick_xml::events::Event;
use regex::Regex;

static BARE_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s<>"]+"#).expect("url pattern compiles"));

/// `<loc>` values of a sitemap or sitemap index.
///
/// Malformed XML ends the scan early and keeps whatever was read so far.
pub fn parse_locs(xml: &str) -> Vec<String> {
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
                let value = current.trim();
                if !value.is_empty() {
                    locs.push(value.to_string());
                }
            }
            Ok(Event::Text(t)) if in_loc => match t.unescape() {
                Ok(text) => current.push_str(&text),
                Err(e) => log::debug!("Bad escape in sitemap <loc>: {e}"),
            },
            Ok(Event::CData(c)) if in_loc => {
                current.push_str(&String::from_utf8_lossy(&c.into_inner()));
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                log::debug!(
                    "Sitemap XML error at position {}: {e}",
                    reader.error_position()
                );
                break;
            }
            _ => {}
        }
    }
    locs
}

/// Sitemap URLs from `<loc>` entries, or bare URLs in the body when there are none.
pub fn sitemap_entries(body: &str) -> Vec<String> {
    let locs = parse_locs(body);
    if !locs.is_empty() {
        return locs;
    }
    BARE_URL
        .find_iter(body)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// `Sitemap:` declarations of a robots.txt file, in file order.
pub fn robots_sitemaps(robots: &str) -> Vec<String> {
    robots
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            let (key, value) = line.split_once(':')?;
            key.trim()
                .eq_ignore_ascii_case("sitemap")
                .then(|| value.trim().to_string())
        })
        .filter(|url| !url.is_empty())
        .collect()
}

/// Whether a `<loc>` points at another sitemap rather than a page.
pub fn is_sitemap_url(url: &str) -> bool {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.to_ascii_lowercase().ends_with(".xml")
}
