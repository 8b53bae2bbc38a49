//! The document-fetching seam between the resolver and the network.

use crate::error::FetchError;
use async_trait::async_trait;
use std::sync::Arc;

/// Performs a GET of `url` and returns the response body as text.
///
/// Implementations own retries and timeouts; the resolver never retries.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

#[async_trait]
impl<T: DocumentFetcher + ?Sized> DocumentFetcher for Arc<T> {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        (**self).fetch(url).await
    }
}
