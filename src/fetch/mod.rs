//! Per-list polling: fetchers and the registry that owns them.

mod fetcher;
mod registry;

pub use fetcher::{FetcherEvent, ListFetcher};
pub use registry::FetcherRegistry;
