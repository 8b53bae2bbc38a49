//! Normalizer: every raw title shape becomes the same [`TitleRecord`].

use crate::raw::{LinkedItem, MarkupEntry, RawTitle, TitleData};
use crate::types::{title_id_from_link, Score, TitleRecord, TitleType};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

fn trailing_year_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\((\d{4})\)\s*$").expect("valid regex"))
}

/// Convert any raw title into a canonical record.
pub fn to_record(raw: RawTitle) -> TitleRecord {
    match raw {
        RawTitle::Embedded(data) => from_title_data(data),
        RawTitle::Linked(item) => from_linked_item(item),
        RawTitle::Markup(entry) => from_markup(entry),
    }
}

/// Render a runtime in seconds as `{H}h{M}m`.
pub fn format_runtime(seconds: u64) -> String {
    format!("{}h{}m", seconds / 3600, (seconds % 3600) / 60)
}

/// Reduce an absolute title URL to its path so links look the same
/// whichever source produced them.
pub fn link_path(link: &str) -> String {
    match url::Url::parse(link) {
        Ok(u) => u.path().to_string(),
        Err(_) => link.split(['?', '#']).next().unwrap_or("").to_string(),
    }
}

fn id_or_from_link(id: Option<String>, link: &str) -> String {
    id.filter(|s| !s.is_empty())
        .or_else(|| title_id_from_link(link))
        .unwrap_or_default()
}

fn from_title_data(data: TitleData) -> TitleRecord {
    let primary = data.primary.unwrap_or_default();
    let ratings = data.ratings.unwrap_or_default();
    let metadata = data.metadata.unwrap_or_default();

    let link = link_path(primary.href.as_deref().unwrap_or(""));
    let year = primary
        .year
        .as_ref()
        .and_then(|years| years.first())
        .map(year_value)
        .unwrap_or_default();
    let runtime = metadata
        .runtime
        .filter(|s| s.is_finite() && *s >= 0.0)
        .map(|s| format_runtime(s as u64))
        .unwrap_or_default();

    TitleRecord {
        id: id_or_from_link(data.id, &link),
        name: primary.title.unwrap_or_default(),
        year,
        rating: ratings.rating.map(Score::Number).unwrap_or_default(),
        certification: metadata.certificate.unwrap_or_default(),
        runtime,
        genre: metadata.genres.unwrap_or_default().join(", "),
        metascore: ratings.metascore.map(Score::Number).unwrap_or_default(),
        link,
        title_type: data.title_type.as_deref().and_then(TitleType::from_raw),
    }
}

fn year_value(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

fn from_linked_item(item: LinkedItem) -> TitleRecord {
    let link = link_path(&item.url);
    TitleRecord {
        id: title_id_from_link(&link).unwrap_or_default(),
        name: item.name.unwrap_or_default(),
        link,
        ..Default::default()
    }
}

fn from_markup(entry: MarkupEntry) -> TitleRecord {
    let year = trailing_year_regex()
        .captures(&entry.year)
        .map(|c| c[1].to_string())
        .unwrap_or(entry.year);
    let link = link_path(&entry.link);

    TitleRecord {
        id: title_id_from_link(&link).unwrap_or_default(),
        name: entry.name,
        year,
        rating: Score::Text(entry.rating),
        certification: entry.certification,
        runtime: entry.runtime,
        genre: entry.genre,
        metascore: Score::Text(entry.metascore),
        link,
        title_type: None,
    }
}
