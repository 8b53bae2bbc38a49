//! Structured-list extractor: the JSON-LD `ItemList` of a curated list page.
//!
//! Elements are stubs (`@type`, `position`, `url`), so this source yields
//! the authoritative membership of the list but none of the title data.

use super::{leading_json, selector};
use crate::error::ListResult;
use crate::raw::LinkedItem;
use crate::types::title_id_from_link;
use regex::Regex;
use scraper::Html;
use serde_json::Value;
use std::sync::OnceLock;

fn item_list_key_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#""itemListElement"\s*:\s*"#).expect("valid regex"))
}

/// The item list of a page, sorted by position.
#[derive(Debug, Clone, Default)]
pub struct StructuredList {
    pub items: Vec<LinkedItem>,
}

impl StructuredList {
    pub fn declared_total(&self) -> usize {
        self.items.len()
    }

    /// Title ids in list order. Elements whose URL carries no id are skipped.
    pub fn ids(&self) -> Vec<String> {
        self.items
            .iter()
            .filter_map(|item| title_id_from_link(&item.url))
            .collect()
    }

    /// The stub for a given title id.
    pub fn item_for(&self, id: &str) -> Option<&LinkedItem> {
        self.items
            .iter()
            .find(|item| title_id_from_link(&item.url).as_deref() == Some(id))
    }
}

/// Find the page's linked-data item list. `None` means the caller should
/// fall back to scraping markup.
pub fn find_structured_list(html: &str) -> Option<StructuredList> {
    let document = Html::parse_document(html);
    let sel = selector(r#"script[type="application/ld+json"]"#).ok()?;

    for script in document.select(&sel) {
        let text: String = script.text().collect();
        let text = text.trim();
        if text.is_empty() {
            continue;
        }
        match parse_item_list(text) {
            Ok(Some(items)) if !items.is_empty() => {
                let mut items = items;
                items.sort_by_key(|item| item.position.unwrap_or(u32::MAX));
                return Some(StructuredList { items });
            }
            Ok(_) => continue,
            Err(e) => tracing::debug!("structured list not usable: {e}"),
        }
    }
    None
}

fn parse_item_list(text: &str) -> ListResult<Option<Vec<LinkedItem>>> {
    // Whole-block parse first; fall back to parsing just the array after
    // the key when the surrounding block is not valid JSON.
    let array = match serde_json::from_str::<Value>(text) {
        Ok(value) => find_item_list_array(&value).cloned(),
        Err(_) => match item_list_key_regex().find(text) {
            Some(m) => Some(leading_json::<Value>(&text[m.end()..], "structured item list")?),
            None => None,
        },
    };

    Ok(array
        .as_ref()
        .and_then(Value::as_array)
        .map(|elements| elements.iter().filter_map(parse_element).collect()))
}

fn find_item_list_array(value: &Value) -> Option<&Value> {
    if let Some(list) = value.get("itemListElement") {
        return Some(list);
    }
    // Handle @graph arrays and a nested mainEntity
    if let Some(graph) = value.get("@graph").and_then(|g| g.as_array()) {
        if let Some(found) = graph.iter().find_map(find_item_list_array) {
            return Some(found);
        }
    }
    value.get("mainEntity").and_then(find_item_list_array)
}

fn parse_element(element: &Value) -> Option<LinkedItem> {
    let item = element.get("item");
    let url = element
        .get("url")
        .and_then(|u| u.as_str())
        .or_else(|| item.and_then(|i| i.get("url")).and_then(|u| u.as_str()))
        .or_else(|| item.and_then(|i| i.get("@id")).and_then(|u| u.as_str()))
        .or_else(|| item.and_then(|i| i.as_str()))?;

    let position = element.get("position").and_then(|p| {
        p.as_u64()
            .map(|n| n as u32)
            .or_else(|| p.as_str().and_then(|s| s.trim().parse().ok()))
    });

    let name = element
        .get("name")
        .or_else(|| item.and_then(|i| i.get("name")))
        .and_then(|n| n.as_str())
        .map(|s| s.to_string());

    Some(LinkedItem {
        item_type: element
            .get("@type")
            .and_then(|t| t.as_str())
            .unwrap_or("")
            .to_string(),
        position,
        url: url.to_string(),
        name,
    })
}
