//! Raw per-source title shapes, consumed by the normalizer.
//!
//! These never leave the crate's resolution pipeline: callers only ever
//! see [`TitleRecord`](crate::types::TitleRecord).

use serde::Deserialize;
use serde_json::Value;

/// Full title data as embedded in a watchlist page's state blob and as
/// returned by the batch title endpoint.
///
/// Every field is optional: the site omits or nulls fields freely.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TitleData {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub title_type: Option<String>,
    pub primary: Option<TitlePrimary>,
    pub ratings: Option<TitleRatings>,
    pub metadata: Option<TitleMetadata>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TitlePrimary {
    pub title: Option<String>,
    pub href: Option<String>,
    /// One element for films, start and end years for series.
    pub year: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TitleRatings {
    pub rating: Option<f64>,
    pub metascore: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TitleMetadata {
    pub genres: Option<Vec<String>>,
    pub certificate: Option<String>,
    /// Runtime in seconds.
    pub runtime: Option<f64>,
}

/// A structured linked-data list element: only a position and a URL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkedItem {
    pub item_type: String,
    pub position: Option<u32>,
    pub url: String,
    pub name: Option<String>,
}

/// One list entry scraped from page markup. All fields are trimmed text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkupEntry {
    pub name: String,
    pub year: String,
    pub rating: String,
    pub certification: String,
    pub runtime: String,
    pub genre: String,
    pub metascore: String,
    pub link: String,
}

/// Any raw title representation the extractors produce.
#[derive(Debug, Clone, PartialEq)]
pub enum RawTitle {
    Embedded(TitleData),
    Linked(LinkedItem),
    Markup(MarkupEntry),
}
