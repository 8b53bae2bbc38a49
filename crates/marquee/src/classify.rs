//! Reference classifier: map a raw list URL to its kind and stable id.
//!
//! Patterns are tried in a fixed order (watchlist, search, standard, chart)
//! and the first match wins. Input that does not parse as a URL classifies
//! as [`ListKind::Unknown`]; this function never fails.

use crate::types::{ListKind, ListReference};
use regex::Regex;
use std::sync::OnceLock;
use url::Url;

fn watchlist_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/user/([^/]+)/watchlist").expect("valid regex"))
}

fn search_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/search/title").expect("valid regex"))
}

fn standard_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/list/(ls\d+)").expect("valid regex"))
}

fn chart_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/chart/([^/]+)").expect("valid regex"))
}

/// Classify a list URL.
pub fn classify(raw: &str) -> ListReference {
    let parsed = match Url::parse(raw.trim()) {
        Ok(u) => u,
        Err(_) => return ListReference::unknown(raw),
    };
    let path = parsed.path();

    let (kind, stable_id) = if let Some(c) = watchlist_regex().captures(path) {
        (ListKind::Watchlist, c[1].to_string())
    } else if search_regex().is_match(path) {
        (ListKind::Search, search_stable_id(&parsed))
    } else if let Some(c) = standard_regex().captures(path) {
        (ListKind::Standard, c[1].to_string())
    } else if let Some(c) = chart_regex().captures(path) {
        (ListKind::Chart, c[1].to_string())
    } else {
        return ListReference::unknown(raw);
    };

    ListReference {
        url: parsed.to_string(),
        kind,
        stable_id,
    }
}

/// `lists=` value when present, otherwise the whole raw query string.
fn search_stable_id(url: &Url) -> String {
    url.query_pairs()
        .find(|(k, v)| k == "lists" && !v.is_empty())
        .map(|(_, v)| v.into_owned())
        .unwrap_or_else(|| url.query().unwrap_or("").to_string())
}
