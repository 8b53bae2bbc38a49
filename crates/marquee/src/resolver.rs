//! List resolver: the entry point of the crate.
//!
//! Classifies a URL, consults the cache, runs the pagination coordinator for
//! the list's kind and caches what came back. Resolution never fails from
//! the caller's point of view: anything that goes wrong yields an empty (or
//! partial) list and a log line.

use crate::batch::{TitleBatcher, DEFAULT_TITLE_DATA_URL, MAX_CONCURRENT_REQUESTS};
use crate::cache::ListCache;
use crate::classify::classify;
use crate::fetch::DocumentFetcher;
use crate::paginate::Coordinator;
use crate::types::{ListReference, TitleRecord};
use std::sync::Arc;

/// Default and hard upper bound on titles returned per resolution.
pub const DEFAULT_MAX: usize = 1000;

/// Effective result bound for a caller-supplied `max`.
pub fn effective_max(max: Option<usize>) -> usize {
    max.unwrap_or(DEFAULT_MAX).min(DEFAULT_MAX)
}

#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Batch title endpoint.
    pub title_data_url: String,
    /// Most page or batch requests in flight at once.
    pub max_concurrent_requests: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            title_data_url: DEFAULT_TITLE_DATA_URL.to_string(),
            max_concurrent_requests: MAX_CONCURRENT_REQUESTS,
        }
    }
}

/// Resolves list URLs to title records.
///
/// The cache is shared through an `Arc` so several resolvers (or a server
/// and a background task) can see the same entries.
pub struct ListResolver<F> {
    fetcher: F,
    cache: Arc<ListCache>,
    batcher: TitleBatcher,
    concurrency: usize,
}

impl<F: DocumentFetcher> ListResolver<F> {
    pub fn new(fetcher: F, cache: Arc<ListCache>, config: ResolverConfig) -> Self {
        let concurrency = config.max_concurrent_requests.max(1);
        Self {
            fetcher,
            cache,
            batcher: TitleBatcher::new(config.title_data_url).with_concurrency(concurrency),
            concurrency,
        }
    }

    pub fn cache(&self) -> &Arc<ListCache> {
        &self.cache
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Resolve `url` to at most `max` (default and cap [`DEFAULT_MAX`])
    /// records. `force` bypasses the cache lookup; the result still
    /// replaces the cached entry.
    ///
    /// A result cut short by a caller-supplied `max` is returned but not
    /// cached, so a small request never shrinks what later callers see.
    pub async fn resolve(&self, url: &str, force: bool, max: Option<usize>) -> Vec<TitleRecord> {
        let reference = classify(url);
        self.resolve_reference(&reference, force, max).await
    }

    /// Resolve an already classified reference.
    pub async fn resolve_reference(
        &self,
        reference: &ListReference,
        force: bool,
        max: Option<usize>,
    ) -> Vec<TitleRecord> {
        if !reference.is_resolvable() {
            tracing::debug!("not a resolvable list url: {}", reference.url);
            return Vec::new();
        }
        let limit = effective_max(max);

        if !force {
            if let Some(mut cached) = self.cache.get(&reference.stable_id) {
                tracing::debug!(
                    "cache hit for {} list {} ({} titles)",
                    reference.kind,
                    reference.stable_id,
                    cached.len()
                );
                cached.truncate(limit);
                return cached;
            }
        }

        tracing::info!(
            "resolving {} list {} (max {limit}{})",
            reference.kind,
            reference.stable_id,
            if force { ", forced" } else { "" }
        );

        let coordinator = Coordinator::new(&self.fetcher, &self.batcher, self.concurrency);
        match coordinator.run(reference, limit).await {
            Ok(records) => {
                let bounded = limit < DEFAULT_MAX && records.len() >= limit;
                if records.is_empty() {
                    tracing::debug!("nothing resolved for {}, not caching", reference.stable_id);
                } else if bounded {
                    tracing::debug!(
                        "{} bounded by max {limit}, not caching",
                        reference.stable_id
                    );
                } else {
                    self.cache.set(&reference.stable_id, records.clone());
                }
                tracing::info!(
                    "resolved {} titles for {} list {}",
                    records.len(),
                    reference.kind,
                    reference.stable_id
                );
                records
            }
            Err(e) => {
                tracing::warn!("failed to resolve {}: {e}", reference.url);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheConfig;
    use crate::testing::RecordingFetcher;
    use crate::types::Score;
    use serde_json::json;

    const LIST_URL: &str = "https://www.imdb.com/list/ls000000001/";
    const BATCH_URL: &str = "https://www.imdb.com/title/data";

    fn tid(n: usize) -> String {
        format!("tt{n:07}")
    }

    fn resolver(fetcher: &RecordingFetcher) -> ListResolver<RecordingFetcher> {
        ListResolver::new(
            fetcher.clone(),
            Arc::new(ListCache::new(CacheConfig::default())),
            ResolverConfig::default(),
        )
    }

    fn lister_item(n: usize) -> String {
        format!(
            r#"<div class="lister-item mode-detail">
                 <h3 class="lister-item-header">
                   <a href="/title/{}/?ref_=ttls_li_tt">Title {n}</a>
                   <span class="lister-item-year">(2001)</span>
                 </h3>
                 <div class="ratings-imdb-rating"><strong>7.{n}</strong></div>
               </div>"#,
            tid(n)
        )
    }

    fn jsonld(range: std::ops::RangeInclusive<usize>) -> String {
        let elements: Vec<_> = range
            .map(|n| {
                json!({
                    "@type": "ListItem",
                    "position": n,
                    "url": format!("https://www.imdb.com/title/{}/", tid(n)),
                })
            })
            .collect();
        json!({"@type": "ItemList", "itemListElement": elements}).to_string()
    }

    fn batch_body(range: std::ops::RangeInclusive<usize>) -> String {
        let mut map = serde_json::Map::new();
        for n in range {
            map.insert(
                tid(n),
                json!({"title": {
                    "id": tid(n),
                    "primary": {"title": format!("Fetched {n}"), "href": format!("/title/{}/", tid(n)), "year": [1990]},
                    "ratings": {"rating": 8.0}
                }}),
            );
        }
        serde_json::Value::Object(map).to_string()
    }

    fn batch_url(range: std::ops::RangeInclusive<usize>) -> String {
        let ids: Vec<String> = range.map(tid).collect();
        format!("{BATCH_URL}?ids={}", ids.join(","))
    }

    /// "Top 10" list page: 4 entries rendered, 10 in the JSON-LD list.
    fn top_ten_fetcher() -> RecordingFetcher {
        let items: String = (1..=4).map(lister_item).collect();
        let page = format!(
            r#"<html><head><script type="application/ld+json">{}</script></head>
               <body><div class="article"><h1>Top 10 Films</h1>{items}</div></body></html>"#,
            jsonld(1..=10)
        );
        RecordingFetcher::new()
            .with_page(LIST_URL, page)
            .with_page(&batch_url(5..=10), batch_body(5..=10))
    }

    #[tokio::test]
    async fn test_structured_list_completed_by_batch() {
        let fetcher = top_ten_fetcher();
        let records = resolver(&fetcher).resolve(LIST_URL, false, None).await;

        assert_eq!(records.len(), 10);
        let ids: Vec<String> = records.iter().map(|r| r.id.clone()).collect();
        assert_eq!(ids, (1..=10).map(tid).collect::<Vec<_>>());
        assert_eq!(records[0].name, "Title 1");
        assert_eq!(records[0].rating, Score::Text("7.1".into()));
        assert_eq!(records[4].name, "Fetched 5");
        assert_eq!(records[4].rating, Score::Number(8.0));
        assert_eq!(fetcher.requests_to("/title/data"), 1);
        assert_eq!(fetcher.request_count(), 2);
    }

    #[tokio::test]
    async fn test_second_call_served_from_cache() {
        let fetcher = top_ten_fetcher();
        let resolver = resolver(&fetcher);

        let first = resolver.resolve(LIST_URL, false, None).await;
        let second = resolver.resolve(LIST_URL, false, None).await;
        assert_eq!(first, second);
        assert_eq!(fetcher.request_count(), 2);

        let bounded = resolver.resolve(LIST_URL, false, Some(3)).await;
        assert_eq!(bounded.len(), 3);
        assert_eq!(fetcher.request_count(), 2);
    }

    #[tokio::test]
    async fn test_force_refetches() {
        let fetcher = top_ten_fetcher();
        let resolver = resolver(&fetcher);

        resolver.resolve(LIST_URL, false, None).await;
        let forced = resolver.resolve(LIST_URL, true, None).await;
        assert_eq!(forced.len(), 10);
        assert_eq!(fetcher.request_count(), 4);
    }

    #[tokio::test]
    async fn test_max_bounds_result_and_batch() {
        let fetcher = top_ten_fetcher();
        fetcher.insert(&batch_url(5..=6), batch_body(5..=6));

        let records = resolver(&fetcher).resolve(LIST_URL, false, Some(6)).await;
        assert_eq!(records.len(), 6);
        assert_eq!(records[5].id, tid(6));
        assert!(fetcher.requests().iter().any(|u| u.contains(&tid(6))));
        assert!(!fetcher.requests().iter().any(|u| u.contains(&tid(7))));
    }

    #[tokio::test]
    async fn test_bounded_result_does_not_shrink_cache() {
        let fetcher = top_ten_fetcher();
        let resolver = resolver(&fetcher);

        assert_eq!(resolver.resolve(LIST_URL, false, Some(1)).await.len(), 1);
        assert!(resolver.cache().is_empty());

        let full = resolver.resolve(LIST_URL, false, None).await;
        assert_eq!(full.len(), 10);
        assert_eq!(resolver.cache().len(), 1);

        // served from the full entry
        let requests = fetcher.request_count();
        assert_eq!(resolver.resolve(LIST_URL, false, Some(5)).await.len(), 5);
        assert_eq!(fetcher.request_count(), requests);
    }

    #[tokio::test]
    async fn test_watchlist_titles_without_items_keep_page_order() {
        let url = "https://www.imdb.com/user/ur7/watchlist";
        // raw text: a json! map would reorder the keys
        let page = r#"<html><head><script>IMDbReactInitialState.push({"titles": {
            "tt0000009": {"id": "tt0000009", "primary": {"title": "Nine"}},
            "tt0000001": {"id": "tt0000001", "primary": {"title": "One"}}
        }});</script></head></html>"#;
        let fetcher = RecordingFetcher::new().with_page(url, page);

        let records = resolver(&fetcher).resolve(url, false, None).await;
        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["Nine", "One"]);
    }

    fn assert_send<T: Send>(_: &T) {}

    #[test]
    fn test_resolve_future_is_send() {
        let fetcher = top_ten_fetcher();
        let resolver = resolver(&fetcher);
        let fut = resolver.resolve(LIST_URL, false, None);
        assert_send(&fut);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_resolutions_share_cache() {
        let other = "https://www.imdb.com/chart/top/";
        let chart = r#"<table><tbody class="lister-list">
            <tr><td class="titleColumn"><a href="/title/tt0111161/">Shawshank</a></td></tr>
            </tbody></table>"#;
        let fetcher = top_ten_fetcher().with_page(other, chart);
        let resolver = Arc::new(resolver(&fetcher));

        let tasks: Vec<_> = [LIST_URL, other, LIST_URL, other]
            .into_iter()
            .map(|url| {
                let resolver = Arc::clone(&resolver);
                tokio::spawn(async move { resolver.resolve(url, false, None).await })
            })
            .collect();
        let (a, b) = tokio::join!(
            resolver.resolve(LIST_URL, false, None),
            resolver.resolve(other, false, None)
        );
        assert_eq!(a.len(), 10);
        assert_eq!(b.len(), 1);
        for task in tasks {
            assert!(!task.await.unwrap().is_empty());
        }

        assert_eq!(resolver.cache().len(), 2);
        let requests = fetcher.request_count();
        assert_eq!(resolver.resolve(LIST_URL, false, None).await, a);
        assert_eq!(fetcher.request_count(), requests);
    }

    #[tokio::test]
    async fn test_max_zero_returns_empty() {
        let fetcher = top_ten_fetcher();
        let resolver = resolver(&fetcher);
        assert!(resolver.resolve(LIST_URL, false, Some(0)).await.is_empty());
        assert_eq!(fetcher.request_count(), 1);
        assert!(resolver.cache().is_empty());
    }

    #[test]
    fn test_max_is_capped() {
        assert_eq!(effective_max(None), DEFAULT_MAX);
        assert_eq!(effective_max(Some(5000)), DEFAULT_MAX);
        assert_eq!(effective_max(Some(12)), 12);
    }

    #[tokio::test]
    async fn test_unknown_url_makes_no_request() {
        let fetcher = RecordingFetcher::new();
        let resolver = resolver(&fetcher);
        assert!(resolver.resolve("not a url", false, None).await.is_empty());
        assert!(resolver
            .resolve("https://www.imdb.com/title/tt0111161/", false, None)
            .await
            .is_empty());
        assert_eq!(fetcher.request_count(), 0);
    }

    #[tokio::test]
    async fn test_primary_failure_is_empty_and_uncached() {
        let fetcher = RecordingFetcher::new();
        fetcher.fail(LIST_URL, 503);
        let resolver = resolver(&fetcher);
        assert!(resolver.resolve(LIST_URL, false, None).await.is_empty());
        assert!(resolver.cache().is_empty());
    }

    #[tokio::test]
    async fn test_failed_batch_leaves_skeletal_records() {
        let fetcher = top_ten_fetcher();
        fetcher.fail(&batch_url(5..=10), 500);

        let records = resolver(&fetcher).resolve(LIST_URL, false, None).await;
        assert_eq!(records.len(), 10);
        assert_eq!(records[7].id, tid(8));
        assert_eq!(records[7].link, format!("/title/{}/", tid(8)));
        assert_eq!(records[7].name, "");
    }

    #[tokio::test]
    async fn test_watchlist_from_embedded_state() {
        let url = "https://www.imdb.com/user/ur12345678/watchlist";
        let state = json!({
            "titles": {
                tid(2): {"id": tid(2), "primary": {"title": "Two", "href": format!("/title/{}/", tid(2))}},
                tid(1): {"id": tid(1), "primary": {"title": "One", "href": format!("/title/{}/", tid(1))}}
            },
            "list": {"items": [
                {"const": tid(3), "position": 3},
                {"const": tid(1), "position": 1},
                {"const": tid(2), "position": 2}
            ]}
        });
        let page = format!(
            "<html><head><script>IMDbReactInitialState.push({state});</script></head></html>"
        );
        let fetcher = RecordingFetcher::new()
            .with_page(url, page)
            .with_page(&batch_url(3..=3), batch_body(3..=3));

        let records = resolver(&fetcher).resolve(url, false, None).await;
        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["One", "Two", "Fetched 3"]);
    }

    #[tokio::test]
    async fn test_standard_markup_pages_fetched() {
        let url = "https://www.imdb.com/list/ls000000002/";
        let page = |range: std::ops::RangeInclusive<usize>| {
            let items: String = range.map(lister_item).collect();
            format!(
                r#"<html><body><div class="desc">250 titles</div>{items}</body></html>"#
            )
        };
        let fetcher = RecordingFetcher::new()
            .with_page(url, page(1..=100))
            .with_page(&format!("{url}?page=2"), page(101..=200));
        // page 3 missing: absorbed, list comes back partial
        let records = resolver(&fetcher).resolve(url, false, None).await;
        assert_eq!(records.len(), 200);
        assert_eq!(records[150].id, tid(151));
        assert_eq!(fetcher.request_count(), 3);
    }
}
