//! # Marquee
//!
//! Resolves public IMDb-style list URLs (user watchlists, curated lists,
//! title searches and charts) into a bounded, ordered list of normalized
//! title records.
//!
//! Resolution tolerates missing data: a page that cannot be fetched yields
//! an empty list, a page that yields part of a list yields that part.
//!
//! ```no_run
//! use marquee::{HttpFetcher, ListCache, ListResolver, ResolverConfig};
//! use std::sync::Arc;
//!
//! # async fn demo() {
//! let resolver = ListResolver::new(
//!     HttpFetcher::default(),
//!     Arc::new(ListCache::default()),
//!     ResolverConfig::default(),
//! );
//! let titles = resolver
//!     .resolve("https://www.imdb.com/list/ls055386972/", false, Some(50))
//!     .await;
//! # }
//! ```

pub mod batch;
pub mod cache;
pub mod classify;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod http;
pub mod normalize;
pub mod paginate;
pub mod raw;
pub mod resolver;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod types;

pub use batch::TitleBatcher;
pub use cache::{CacheConfig, ListCache};
pub use classify::classify;
pub use error::{FetchError, ListError, ListResult};
pub use fetch::DocumentFetcher;
pub use http::HttpFetcher;
pub use resolver::{effective_max, ListResolver, ResolverConfig, DEFAULT_MAX};
pub use types::{ListKind, ListReference, Score, TitleRecord, TitleType};
