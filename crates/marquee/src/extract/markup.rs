//! Markup-scrape extractor: list entries read straight from the page.
//!
//! Two entry shapes are recognised: the `.lister-item` blocks of list and
//! search pages, and the table rows of chart pages. The declared total
//! comes from the page's summary text, unless the heading names a
//! "Top N" list, in which case N wins.

use super::{collapsed_text, selector};
use crate::error::ListResult;
use crate::raw::MarkupEntry;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;

fn range_count_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\d+-(\d+) of ([\d,]+) titles").expect("valid regex"))
}

fn titles_count_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)([\d,]+)\s+titles?\b").expect("valid regex"))
}

fn top_list_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bTop\s+(\d+)\b").expect("valid regex"))
}

/// Everything the markup of one page yields.
#[derive(Debug, Clone, Default)]
pub struct MarkupPage {
    pub entries: Vec<MarkupEntry>,
    /// `None` when the page states no total.
    pub declared_total: Option<usize>,
}

/// Scrape list entries and the declared total from a page.
///
/// Never fails: a missing or empty document yields an empty page.
pub fn scrape_markup(html: &str) -> MarkupPage {
    let document = Html::parse_document(html);
    match scrape_document(&document) {
        Ok(page) => page,
        Err(e) => {
            tracing::debug!("markup scrape failed: {e}");
            MarkupPage::default()
        }
    }
}

struct EntrySelectors {
    lister_item: Selector,
    lister_title: Selector,
    lister_year: Selector,
    lister_rating: Selector,
    certificate: Selector,
    runtime: Selector,
    genre: Selector,
    metascore: Selector,
    chart_row: Selector,
    chart_title: Selector,
    chart_year: Selector,
    chart_rating: Selector,
}

impl EntrySelectors {
    fn new() -> ListResult<Self> {
        Ok(Self {
            lister_item: selector(".lister-item")?,
            lister_title: selector(r#".lister-item-header a[href*="/title/"]"#)?,
            lister_year: selector(".lister-item-year")?,
            lister_rating: selector(".ratings-imdb-rating strong")?,
            certificate: selector(".certificate")?,
            runtime: selector(".runtime")?,
            genre: selector(".genre")?,
            metascore: selector(".ratings-metascore > .metascore")?,
            chart_row: selector(".lister-list tr")?,
            chart_title: selector(r#".titleColumn a[href*="/title/"]"#)?,
            chart_year: selector(".titleColumn .secondaryInfo")?,
            chart_rating: selector(".imdbRating strong")?,
        })
    }
}

fn scrape_document(document: &Html) -> ListResult<MarkupPage> {
    let sels = EntrySelectors::new()?;

    let mut entries: Vec<MarkupEntry> = document
        .select(&sels.lister_item)
        .map(|el| lister_entry(el, &sels))
        .collect();

    if entries.is_empty() {
        entries = document
            .select(&sels.chart_row)
            .filter_map(|row| chart_entry(row, &sels))
            .collect();
    }

    Ok(MarkupPage {
        entries,
        declared_total: declared_total(document)?,
    })
}

fn first_text(el: ElementRef<'_>, sel: &Selector) -> String {
    el.select(sel).next().map(collapsed_text).unwrap_or_default()
}

fn clean_link(href: &str) -> String {
    href.replace('\0', "").trim().to_string()
}

fn lister_entry(el: ElementRef<'_>, sels: &EntrySelectors) -> MarkupEntry {
    let title = el.select(&sels.lister_title).next();
    MarkupEntry {
        name: title.map(collapsed_text).unwrap_or_default(),
        year: first_text(el, &sels.lister_year),
        rating: first_text(el, &sels.lister_rating),
        certification: first_text(el, &sels.certificate),
        runtime: first_text(el, &sels.runtime),
        genre: first_text(el, &sels.genre),
        metascore: first_text(el, &sels.metascore),
        link: title
            .and_then(|a| a.value().attr("href"))
            .map(clean_link)
            .unwrap_or_default(),
    }
}

fn chart_entry(row: ElementRef<'_>, sels: &EntrySelectors) -> Option<MarkupEntry> {
    let title = row.select(&sels.chart_title).next()?;
    Some(MarkupEntry {
        name: collapsed_text(title),
        year: first_text(row, &sels.chart_year),
        rating: first_text(row, &sels.chart_rating),
        link: title.value().attr("href").map(clean_link).unwrap_or_default(),
        ..Default::default()
    })
}

fn parse_count(text: &str) -> Option<usize> {
    text.replace(',', "").parse().ok()
}

/// Total from the summary text, overridden by a "Top N" heading.
fn declared_total(document: &Html) -> ListResult<Option<usize>> {
    let heading = selector(".article h1, h1")?;
    if let Some(h1) = document.select(&heading).next() {
        let text = collapsed_text(h1);
        if let Some(n) = top_list_regex()
            .captures(&text)
            .and_then(|c| parse_count(&c[1]))
        {
            return Ok(Some(n));
        }
    }

    let summary = selector(".nav .desc, .desc, .lister-details")?;
    for el in document.select(&summary) {
        let text = collapsed_text(el);
        if let Some(c) = range_count_regex().captures(&text) {
            return Ok(parse_count(&c[2]));
        }
        if let Some(c) = titles_count_regex().captures(&text) {
            return Ok(parse_count(&c[1]));
        }
    }
    Ok(None)
}
