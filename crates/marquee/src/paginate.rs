//! Pagination coordinator: fills a list up to its target size.
//!
//! Two completion paths:
//!
//! - **By id**: the page carried an authoritative id list (watchlist state,
//!   JSON-LD item list). Titles already on the page are kept, the rest are
//!   batch fetched, and the result follows the declared list order.
//! - **By page**: only markup is available. Further pages are requested in
//!   parallel using the kind's paging scheme and scraped the same way.
//!
//! Secondary fetch failures are absorbed; only the first page is required.

use crate::batch::TitleBatcher;
use crate::error::{ListError, ListResult};
use crate::extract::{find_embedded_state, find_structured_list, scrape_markup, StructuredList};
use crate::fetch::DocumentFetcher;
use crate::normalize::to_record;
use crate::raw::RawTitle;
use crate::types::{ListKind, ListReference, TitleRecord};
use futures::stream::{self, StreamExt};
use std::collections::{HashMap, HashSet};
use url::Url;

/// Entries per page of a curated list.
pub const STANDARD_PAGE_SIZE: usize = 100;

/// Entries per page of search results (and the watchlist markup fallback).
pub const SEARCH_PAGE_SIZE: usize = 250;

/// How further pages of a list are addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Paging {
    /// `start=<1-based offset>&count=<size>`
    Offset(usize),
    /// `page=<n>`, `size` entries per page
    Numbered(usize),
}

impl Paging {
    /// URLs of the pages still needed once `have` entries are in hand.
    fn page_urls(self, base: &str, have: usize, target: usize) -> Vec<String> {
        match self {
            Paging::Offset(size) => {
                let mut urls = Vec::new();
                let mut start = have + 1;
                while start <= target {
                    urls.push(with_query(
                        base,
                        &[("start", start.to_string()), ("count", size.to_string())],
                        &[],
                    ));
                    start += size;
                }
                urls
            }
            Paging::Numbered(size) => (2..=target.div_ceil(size))
                .map(|n| with_query(base, &[("page", n.to_string())], &[]))
                .collect(),
        }
    }
}

/// Rewrite `base`'s query: drop `remove`, then set each pair in `set`.
/// Other parameters are preserved. Unparsable input is returned as is.
pub(crate) fn with_query(base: &str, set: &[(&str, String)], remove: &[&str]) -> String {
    let Ok(mut url) = Url::parse(base) else {
        return base.to_string();
    };
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| {
            !remove.contains(&k.as_ref()) && !set.iter().any(|(s, _)| k.as_ref() == *s)
        })
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    {
        let mut pairs = url.query_pairs_mut();
        pairs.clear();
        pairs.extend_pairs(kept);
        for (k, v) in set {
            pairs.append_pair(k, v);
        }
    }
    if url.query() == Some("") {
        url.set_query(None);
    }
    url.to_string()
}

/// Keep the first record for each id, in order. Records without an id
/// cannot be compared and are all kept.
pub fn dedupe_by_id(records: Vec<TitleRecord>) -> Vec<TitleRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|r| !r.has_id() || seen.insert(r.id.clone()))
        .collect()
}

fn markup_records(html: &str) -> (Vec<TitleRecord>, Option<usize>) {
    let page = scrape_markup(html);
    let records = page
        .entries
        .into_iter()
        .map(|e| to_record(RawTitle::Markup(e)))
        .collect();
    (records, page.declared_total)
}

/// Drives extraction, paging and batch completion for one resolution.
pub(crate) struct Coordinator<'a, F: ?Sized> {
    fetcher: &'a F,
    batcher: &'a TitleBatcher,
    concurrency: usize,
}

impl<'a, F> Coordinator<'a, F>
where
    F: DocumentFetcher + ?Sized,
{
    pub(crate) fn new(fetcher: &'a F, batcher: &'a TitleBatcher, concurrency: usize) -> Self {
        Self {
            fetcher,
            batcher,
            concurrency: concurrency.max(1),
        }
    }

    /// Resolve `reference` to at most `limit` records.
    ///
    /// Fails only when the first page cannot be fetched.
    pub(crate) async fn run(
        &self,
        reference: &ListReference,
        limit: usize,
    ) -> ListResult<Vec<TitleRecord>> {
        match reference.kind {
            ListKind::Watchlist => self.watchlist(&reference.url, limit).await,
            ListKind::Standard => self.standard(&reference.url, limit).await,
            ListKind::Search => self.search(&reference.url, limit).await,
            ListKind::Chart => self.chart(&reference.url, limit).await,
            ListKind::Unknown => Ok(Vec::new()),
        }
    }

    async fn fetch_primary(&self, url: &str) -> ListResult<String> {
        self.fetcher.fetch(url).await.map_err(ListError::from)
    }

    async fn watchlist(&self, url: &str, limit: usize) -> ListResult<Vec<TitleRecord>> {
        let body = self.fetch_primary(url).await?;

        let Some(state) = find_embedded_state(&body) else {
            tracing::debug!("no embedded state on {url}, scraping markup");
            return Ok(self
                .complete_by_page(url, &body, limit, Paging::Offset(SEARCH_PAGE_SIZE))
                .await);
        };

        let ids: Vec<String> = if state.items.is_empty() {
            state.titles.keys().cloned().collect()
        } else {
            state.items.iter().map(|item| item.id.clone()).collect()
        };
        let target = limit.min(ids.len());
        let have: Vec<TitleRecord> = state
            .titles
            .into_values()
            .map(|t| to_record(RawTitle::Embedded(t)))
            .collect();

        Ok(self.complete_by_id(&ids, have, target, None).await)
    }

    async fn standard(&self, url: &str, limit: usize) -> ListResult<Vec<TitleRecord>> {
        let first = with_query(url, &[], &["page"]);
        let body = self.fetch_primary(&first).await?;

        let Some(list) = find_structured_list(&body) else {
            tracing::debug!("no structured item list on {first}, scraping markup");
            return Ok(self
                .complete_by_page(&first, &body, limit, Paging::Numbered(STANDARD_PAGE_SIZE))
                .await);
        };

        let (have, _) = markup_records(&body);
        let target = limit.min(list.declared_total());
        let ids = list.ids();
        Ok(self.complete_by_id(&ids, have, target, Some(&list)).await)
    }

    async fn search(&self, url: &str, limit: usize) -> ListResult<Vec<TitleRecord>> {
        let has_start = Url::parse(url)
            .map(|u| u.query_pairs().any(|(k, _)| k == "start"))
            .unwrap_or(false);
        let first = if has_start {
            with_query(url, &[("count", SEARCH_PAGE_SIZE.to_string())], &["start"])
        } else {
            url.to_string()
        };
        let body = self.fetch_primary(&first).await?;
        Ok(self
            .complete_by_page(&first, &body, limit, Paging::Offset(SEARCH_PAGE_SIZE))
            .await)
    }

    /// Charts are a single bounded page.
    async fn chart(&self, url: &str, limit: usize) -> ListResult<Vec<TitleRecord>> {
        let body = self.fetch_primary(url).await?;
        let (records, _) = markup_records(&body);
        let mut records = dedupe_by_id(records);
        records.truncate(limit);
        Ok(records)
    }

    /// Complete from an authoritative id list. Output follows `ids` order,
    /// holds at most `target` records and only records with an id. Ids that
    /// neither the page nor the batch supplied fall back to their `stubs`
    /// entry when one is given.
    async fn complete_by_id(
        &self,
        ids: &[String],
        have: Vec<TitleRecord>,
        target: usize,
        stubs: Option<&StructuredList>,
    ) -> Vec<TitleRecord> {
        let mut seen = HashSet::new();
        let wanted: Vec<&str> = ids
            .iter()
            .map(String::as_str)
            .filter(|id| seen.insert(*id))
            .take(target)
            .collect();

        let mut by_id: HashMap<String, TitleRecord> = HashMap::new();
        for record in have.into_iter().filter(TitleRecord::has_id) {
            by_id.entry(record.id.clone()).or_insert(record);
        }

        let missing: Vec<String> = wanted
            .iter()
            .filter(|id| !by_id.contains_key(**id))
            .map(|id| id.to_string())
            .collect();
        if !missing.is_empty() {
            tracing::debug!(
                "{} of {} titles not on the page, batch fetching",
                missing.len(),
                wanted.len()
            );
            for data in self.batcher.fetch_titles(self.fetcher, &missing).await {
                let record = to_record(RawTitle::Embedded(data));
                if record.has_id() {
                    by_id.entry(record.id.clone()).or_insert(record);
                }
            }
        }

        let records: Vec<TitleRecord> = wanted
            .iter()
            .filter_map(|id| {
                by_id.remove(*id).or_else(|| {
                    stubs
                        .and_then(|list| list.item_for(id))
                        .map(|item| to_record(RawTitle::Linked(item.clone())))
                })
            })
            .collect();
        if records.len() < target {
            tracing::debug!("incomplete list: {} of {target} titles", records.len());
        }
        records
    }

    /// Complete from markup alone, fetching further pages in parallel.
    async fn complete_by_page(
        &self,
        url: &str,
        body: &str,
        limit: usize,
        paging: Paging,
    ) -> Vec<TitleRecord> {
        let (mut records, declared) = markup_records(body);
        // Without a declared total only the first page is trusted.
        let target = declared.unwrap_or(records.len()).min(limit);

        if records.len() < target {
            let urls = paging.page_urls(url, records.len(), target);
            tracing::debug!(
                "{} of {target} titles on the first page, fetching {} more page(s)",
                records.len(),
                urls.len()
            );
            for page in self.fetch_pages(urls).await {
                let (more, _) = markup_records(&page);
                records.extend(more);
            }
        }

        let mut records = dedupe_by_id(records);
        if records.len() < target {
            tracing::debug!("incomplete list: {} of {target} titles", records.len());
        }
        records.truncate(target);
        records
    }

    /// Fetch `urls` concurrently; failed pages are dropped.
    async fn fetch_pages(&self, urls: Vec<String>) -> Vec<String> {
        let mut requests = Vec::with_capacity(urls.len());
        for url in urls {
            requests.push(self.fetch_page(url));
        }
        let bodies: Vec<Option<String>> = stream::iter(requests)
            .buffered(self.concurrency)
            .collect()
            .await;
        bodies.into_iter().flatten().collect()
    }

    async fn fetch_page(&self, url: String) -> Option<String> {
        match self.fetcher.fetch(&url).await {
            Ok(body) => Some(body),
            Err(e) => {
                tracing::warn!("page fetch failed, continuing with partial list: {e}");
                None
            }
        }
    }
}
