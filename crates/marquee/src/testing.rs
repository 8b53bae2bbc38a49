//! Testing utilities: an in-memory [`DocumentFetcher`].
//!
//! Useful for exercising resolution logic without network calls.

use crate::error::FetchError;
use crate::fetch::DocumentFetcher;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// A fetcher serving canned bodies and recording every request.
///
/// URLs are matched on host, path and the *set* of query pairs, so tests
/// need not predict parameter order or percent-encoding. Unknown URLs fail
/// with HTTP 404.
#[derive(Default, Clone)]
pub struct RecordingFetcher {
    responses: Arc<RwLock<HashMap<String, Result<String, u16>>>>,
    requests: Arc<RwLock<Vec<String>>>,
}

impl RecordingFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for `url`.
    pub fn insert(&self, url: &str, body: impl Into<String>) {
        if let Ok(mut map) = self.responses.write() {
            map.insert(match_key(url), Ok(body.into()));
        }
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with_page(self, url: &str, body: impl Into<String>) -> Self {
        self.insert(url, body);
        self
    }

    /// Answer `url` with an HTTP error status.
    pub fn fail(&self, url: &str, status: u16) {
        if let Ok(mut map) = self.responses.write() {
            map.insert(match_key(url), Err(status));
        }
    }

    /// Every URL requested so far, in request order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.read().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn request_count(&self) -> usize {
        self.requests.read().map(|r| r.len()).unwrap_or(0)
    }

    /// Number of requests whose path contains `fragment`.
    pub fn requests_to(&self, fragment: &str) -> usize {
        self.requests()
            .iter()
            .filter(|u| match url::Url::parse(u) {
                Ok(parsed) => parsed.path().contains(fragment),
                Err(_) => u.contains(fragment),
            })
            .count()
    }
}

#[async_trait]
impl DocumentFetcher for RecordingFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        if let Ok(mut requests) = self.requests.write() {
            requests.push(url.to_string());
        }
        let response = self
            .responses
            .read()
            .ok()
            .and_then(|map| map.get(&match_key(url)).cloned());
        match response {
            Some(Ok(body)) => Ok(body),
            Some(Err(status)) => Err(FetchError::Status {
                url: url.to_string(),
                status,
            }),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

fn match_key(raw: &str) -> String {
    match url::Url::parse(raw) {
        Ok(url) => {
            let mut pairs: Vec<(String, String)> = url
                .query_pairs()
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect();
            pairs.sort();
            let query: Vec<String> = pairs.iter().map(|(k, v)| format!("{k}={v}")).collect();
            format!(
                "{}{}?{}",
                url.host_str().unwrap_or(""),
                url.path().trim_end_matches('/'),
                query.join("&")
            )
        }
        Err(_) => raw.to_string(),
    }
}
