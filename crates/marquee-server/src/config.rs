//! Configuration loading and resolution.
//!
//! Three layers: built-in defaults, then `MARQUEE_*` environment variables,
//! then command-line flags (applied by the caller). The binary loads a
//! `.env` file into the environment before reading it.

use marquee::batch::{DEFAULT_TITLE_DATA_URL, MAX_CONCURRENT_REQUESTS};
use marquee::cache::{DEFAULT_CAPACITY, DEFAULT_TTL};
use marquee::http::DEFAULT_TIMEOUT_MS;
use marquee::{CacheConfig, DocumentFetcher, HttpFetcher, ListCache, ListResolver, ResolverConfig};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_SITE_URL: &str = "https://www.imdb.com";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub cache_capacity: usize,
    pub cache_ttl: Duration,
    pub port: u16,
    pub host: String,
    pub http_timeout_ms: u64,
    pub title_data_url: String,
    /// Base URL prepended to title links in SMS replies.
    pub site_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CAPACITY,
            cache_ttl: DEFAULT_TTL,
            port: DEFAULT_PORT,
            host: DEFAULT_HOST.to_string(),
            http_timeout_ms: DEFAULT_TIMEOUT_MS,
            title_data_url: DEFAULT_TITLE_DATA_URL.to_string(),
            site_url: DEFAULT_SITE_URL.to_string(),
        }
    }
}

impl Config {
    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with whatever `lookup` returns for each variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let text = |key: &str, default: String| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(default)
        };

        Self {
            cache_capacity: number(&lookup, "MARQUEE_CACHE_MAX", defaults.cache_capacity),
            cache_ttl: Duration::from_secs(number(
                &lookup,
                "MARQUEE_CACHE_TTL_SECS",
                defaults.cache_ttl.as_secs(),
            )),
            port: number(&lookup, "MARQUEE_PORT", defaults.port),
            host: text("MARQUEE_HOST", defaults.host),
            http_timeout_ms: number(&lookup, "MARQUEE_HTTP_TIMEOUT_MS", defaults.http_timeout_ms),
            title_data_url: text("MARQUEE_TITLE_DATA_URL", defaults.title_data_url),
            site_url: text("MARQUEE_SITE_URL", defaults.site_url),
        }
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            capacity: self.cache_capacity,
            ttl: self.cache_ttl,
        }
    }

    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            title_data_url: self.title_data_url.clone(),
            max_concurrent_requests: MAX_CONCURRENT_REQUESTS,
        }
    }

    /// Resolver over live HTTP with a fresh cache.
    pub fn build_resolver(&self) -> ListResolver<Arc<dyn DocumentFetcher>> {
        let fetcher: Arc<dyn DocumentFetcher> = Arc::new(HttpFetcher::new(self.http_timeout_ms));
        ListResolver::new(
            fetcher,
            Arc::new(ListCache::new(self.cache_config())),
            self.resolver_config(),
        )
    }
}

fn number<T: FromStr + Copy + std::fmt::Display>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    match lookup(key) {
        None => default,
        Some(raw) => match raw.trim().parse() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!("ignoring {key}={raw:?}: not a valid number, using {default}");
                default
            }
        },
    }
}
