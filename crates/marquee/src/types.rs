//! Core data types shared by every stage of list resolution.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// The externally recognised shapes of a list reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListKind {
    /// A user's watchlist (`/user/<id>/watchlist`).
    Watchlist,
    /// A curated list (`/list/<id>`).
    Standard,
    /// An advanced title search (`/search/title?...`).
    Search,
    /// A chart page (`/chart/<name>`).
    Chart,
    /// Anything the classifier could not recognise.
    Unknown,
}

impl fmt::Display for ListKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ListKind::Watchlist => "watchlist",
            ListKind::Standard => "standard",
            ListKind::Search => "search",
            ListKind::Chart => "chart",
            ListKind::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// A classified list URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListReference {
    pub url: String,
    pub kind: ListKind,
    /// Cache key derived from the kind-specific part of the URL. Empty when
    /// nothing could be captured.
    pub stable_id: String,
}

impl ListReference {
    pub(crate) fn unknown(url: &str) -> Self {
        Self {
            url: url.to_string(),
            kind: ListKind::Unknown,
            stable_id: String::new(),
        }
    }

    /// Whether this reference can be fetched and cached at all.
    pub fn is_resolvable(&self) -> bool {
        self.kind != ListKind::Unknown && !self.stable_id.is_empty()
    }
}

/// A rating or metascore: numeric when the source carried a number, the
/// scraped text otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Score {
    Number(f64),
    Text(String),
}

impl Score {
    pub fn empty() -> Self {
        Score::Text(String::new())
    }
}

impl Default for Score {
    fn default() -> Self {
        Score::empty()
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Score::Number(n) => write!(f, "{n}"),
            Score::Text(s) => f.write_str(s),
        }
    }
}

/// Title type, when the source states it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TitleType {
    FeatureFilm,
    Series,
}

impl TitleType {
    /// Map the site's raw `type` string onto a known title type.
    pub fn from_raw(raw: &str) -> Option<Self> {
        match raw {
            "featureFilm" | "movie" | "Movie" => Some(TitleType::FeatureFilm),
            "series" | "tvSeries" | "tvMiniSeries" | "TVSeries" => Some(TitleType::Series),
            _ => None,
        }
    }
}

/// The canonical record returned to every caller, whatever the source shape.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TitleRecord {
    /// Opaque title id (`tt1234567`). Empty when it could not be derived.
    pub id: String,
    pub name: String,
    pub year: String,
    pub rating: Score,
    pub certification: String,
    pub runtime: String,
    pub genre: String,
    pub metascore: Score,
    pub link: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub title_type: Option<TitleType>,
}

impl TitleRecord {
    pub fn has_id(&self) -> bool {
        !self.id.is_empty()
    }
}

fn title_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z]{2}\d+$").expect("valid regex"))
}

fn title_link_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/title/([a-z]{2}\d+)").expect("valid regex"))
}

/// Whether `id` has the shape of a title id: two letters then digits.
pub fn is_title_id(id: &str) -> bool {
    title_id_regex().is_match(id)
}

/// Pull the title id out of a title link such as `/title/tt0111161/?ref_=x`.
pub fn title_id_from_link(link: &str) -> Option<String> {
    title_link_regex()
        .captures(link)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}
