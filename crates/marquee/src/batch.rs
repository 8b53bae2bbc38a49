//! Batch title fetcher: full title data for a set of title ids.
//!
//! Ids are split into fixed-size chunks, one request per chunk, issued
//! concurrently. A failed chunk contributes nothing; the call itself never
//! fails.

use crate::fetch::DocumentFetcher;
use crate::raw::TitleData;
use crate::types::is_title_id;
use futures::stream::{self, StreamExt};
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// Default batch endpoint.
pub const DEFAULT_TITLE_DATA_URL: &str = "https://www.imdb.com/title/data";

/// Ids per batch request.
pub const BATCH_SIZE: usize = 500;

/// Most requests in flight at once.
pub const MAX_CONCURRENT_REQUESTS: usize = 10;

/// Fetches title data in chunks from `{endpoint}?ids=a,b,c`.
#[derive(Debug, Clone)]
pub struct TitleBatcher {
    endpoint: String,
    chunk_size: usize,
    concurrency: usize,
}

impl TitleBatcher {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            chunk_size: BATCH_SIZE,
            concurrency: MAX_CONCURRENT_REQUESTS,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fetch title data for `ids`.
    ///
    /// Malformed ids and duplicates are dropped before sending. Results come
    /// back chunk by chunk in request order, and within a chunk in the order
    /// the ids were asked for.
    pub async fn fetch_titles<F>(&self, fetcher: &F, ids: &[String]) -> Vec<TitleData>
    where
        F: DocumentFetcher + ?Sized,
    {
        let mut seen = HashSet::new();
        let valid: Vec<&str> = ids
            .iter()
            .map(String::as_str)
            .filter(|id| {
                let ok = is_title_id(id);
                if !ok {
                    tracing::debug!("skipping malformed title id {id:?}");
                }
                ok
            })
            .filter(|id| seen.insert(*id))
            .collect();
        if valid.is_empty() {
            return Vec::new();
        }

        // Request futures are built up front; nothing borrowed is captured
        // by a closure, which keeps the returned future `Send`.
        let mut requests = Vec::new();
        for chunk in valid.chunks(self.chunk_size) {
            if let Some(url) = self.chunk_url(chunk) {
                requests.push(fetch_chunk(fetcher, url, chunk));
            }
        }
        tracing::debug!(
            "fetching {} titles in {} batch request(s)",
            valid.len(),
            requests.len()
        );

        let chunks: Vec<Vec<TitleData>> = stream::iter(requests)
            .buffered(self.concurrency)
            .collect()
            .await;

        chunks.into_iter().flatten().collect()
    }

    fn chunk_url(&self, chunk: &[&str]) -> Option<String> {
        match url::Url::parse(&self.endpoint) {
            Ok(mut url) => {
                url.query_pairs_mut().append_pair("ids", &chunk.join(","));
                Some(url.to_string())
            }
            Err(e) => {
                tracing::warn!("invalid title data endpoint {}: {e}", self.endpoint);
                None
            }
        }
    }
}

async fn fetch_chunk<F>(fetcher: &F, url: String, chunk: &[&str]) -> Vec<TitleData>
where
    F: DocumentFetcher + ?Sized,
{
    match fetcher.fetch(&url).await {
        Ok(body) => parse_batch(&body, chunk),
        Err(e) => {
            tracing::warn!("title batch failed: {e}");
            Vec::new()
        }
    }
}

impl Default for TitleBatcher {
    fn default() -> Self {
        Self::new(DEFAULT_TITLE_DATA_URL)
    }
}

/// Pick the requested ids out of a `{id: {"title": {...}}}` response.
fn parse_batch(body: &str, chunk: &[&str]) -> Vec<TitleData> {
    let map: HashMap<String, Value> = match serde_json::from_str(body) {
        Ok(m) => m,
        Err(e) => {
            tracing::warn!("malformed title batch response: {e}");
            return Vec::new();
        }
    };

    chunk
        .iter()
        .filter_map(|id| {
            let entry = map.get(*id)?;
            let title = entry.get("title").unwrap_or(entry);
            match serde_json::from_value::<TitleData>(title.clone()) {
                Ok(mut data) => {
                    if data.id.as_deref().map_or(true, str::is_empty) {
                        data.id = Some(id.to_string());
                    }
                    Some(data)
                }
                Err(e) => {
                    tracing::debug!("unusable title data for {id}: {e}");
                    None
                }
            }
        })
        .collect()
}
