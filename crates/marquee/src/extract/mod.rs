//! Content extractors: turn a fetched document into a declared total and
//! an initial batch of titles or title ids.
//!
//! Three interchangeable strategies:
//!
//! - [`embedded`]: the state blob a watchlist page pushes from an inline
//!   script.
//! - [`structured`]: the JSON-LD item list a curated list page carries.
//! - [`markup`]: list entries scraped from the rendered markup; the fallback
//!   for every kind.
//!
//! Each `find_*` entry point returns `None` when its source is absent or
//! unparsable, and the caller moves on to the next strategy. All entry
//! points are synchronous because `scraper::Html` is `!Send`; nothing
//! parsed here is held across an await.

pub mod embedded;
pub mod markup;
pub mod structured;

pub use embedded::{find_embedded_state, EmbeddedState, StateItem};
pub use markup::{scrape_markup, MarkupPage};
pub use structured::{find_structured_list, StructuredList};

use crate::error::{ListError, ListResult};
use scraper::{ElementRef, Selector};

pub(crate) fn selector(css: &str) -> ListResult<Selector> {
    Selector::parse(css).map_err(|e| ListError::Selector(format!("{css}: {e:?}")))
}

/// Concatenated text of an element with whitespace runs collapsed.
pub(crate) fn collapsed_text(el: ElementRef<'_>) -> String {
    el.text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse the first complete JSON value at the start of `text`, ignoring
/// whatever follows it.
pub(crate) fn leading_json<T: serde::de::DeserializeOwned>(
    text: &str,
    context: &'static str,
) -> ListResult<T> {
    let mut stream = serde_json::Deserializer::from_str(text.trim_start()).into_iter::<T>();
    match stream.next() {
        Some(Ok(value)) => Ok(value),
        Some(Err(e)) => Err(ListError::parse(context, e)),
        None => Err(ListError::parse(
            context,
            serde::de::Error::custom("empty input"),
        )),
    }
}
