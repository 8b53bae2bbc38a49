//! Error types for list resolution.
//!
//! Only [`FetchError`] ever crosses a collaborator boundary. Everything else
//! is recovered inside the resolver: an extractor that hits a [`ListError`]
//! reports "not found" and the resolver falls through to the next strategy.

/// Failure reported by a [`DocumentFetcher`](crate::fetch::DocumentFetcher).
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },
}

impl FetchError {
    /// URL of the request that failed.
    pub fn url(&self) -> &str {
        match self {
            FetchError::Transport { url, .. } | FetchError::Status { url, .. } => url,
        }
    }
}

/// Errors raised while turning fetched documents into title data.
#[derive(thiserror::Error, Debug)]
pub enum ListError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("malformed {context}: {source}")]
    Parse {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid selector: {0}")]
    Selector(String),
}

impl ListError {
    pub(crate) fn parse(context: &'static str, source: serde_json::Error) -> Self {
        ListError::Parse { context, source }
    }
}

pub type ListResult<T> = Result<T, ListError>;
