//! Embedded-state extractor for watchlist pages.
//!
//! A watchlist page pushes its whole initial state from an inline script:
//! `IMDbReactInitialState.push({...});`. The blob carries `titles` (full
//! data for the titles already rendered) and `list.items` (the complete
//! membership, in list order).

use super::{leading_json, selector};
use crate::error::ListResult;
use crate::raw::TitleData;
use regex::Regex;
use scraper::Html;
use serde::Deserialize;
use indexmap::IndexMap;
use std::sync::OnceLock;

fn state_push_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"IMDbReactInitialState\.push\(").expect("valid regex"))
}

/// One member of the declared list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateItem {
    pub id: String,
    pub position: u32,
}

/// Parsed watchlist state.
#[derive(Debug, Clone, Default)]
pub struct EmbeddedState {
    /// Title data already present on the page, keyed by title id, in
    /// document order.
    pub titles: IndexMap<String, TitleData>,
    /// Full declared membership, sorted by position.
    pub items: Vec<StateItem>,
}

impl EmbeddedState {
    pub fn declared_total(&self) -> usize {
        self.items.len()
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct StateBlob {
    titles: Option<IndexMap<String, TitleData>>,
    list: Option<StateList>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct StateList {
    items: Option<Vec<StateBlobItem>>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct StateBlobItem {
    #[serde(rename = "const")]
    id: Option<String>,
    position: Option<u32>,
}

/// Find and parse the embedded state blob, if the page has one.
pub fn find_embedded_state(html: &str) -> Option<EmbeddedState> {
    let document = Html::parse_document(html);
    let sel = selector("script").ok()?;

    for script in document.select(&sel) {
        let text: String = script.text().collect();
        let Some(m) = state_push_regex().find(&text) else {
            continue;
        };
        match parse_state(&text[m.end()..]) {
            Ok(Some(state)) => return Some(state),
            Ok(None) => continue,
            Err(e) => tracing::debug!("embedded state not usable: {e}"),
        }
    }
    None
}

fn parse_state(text: &str) -> ListResult<Option<EmbeddedState>> {
    let blob: StateBlob = leading_json(text, "embedded state")?;
    let titles = blob.titles.unwrap_or_default();

    let mut items: Vec<StateItem> = blob
        .list
        .and_then(|l| l.items)
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .filter_map(|(i, item)| {
            let id = item.id.filter(|id| !id.is_empty())?;
            Some(StateItem {
                id,
                position: item.position.unwrap_or(i as u32 + 1),
            })
        })
        .collect();
    items.sort_by_key(|item| item.position);

    if titles.is_empty() && items.is_empty() {
        return Ok(None);
    }
    Ok(Some(EmbeddedState { titles, items }))
}
