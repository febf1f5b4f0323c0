//! Crawl orchestration: fetching, pagination, and the crawl driver

pub mod driver;
pub mod fetcher;
pub mod pagination;

pub use driver::{CrawlDriver, ListingPage};
pub use fetcher::{build_http_client, fetch_url, FetchResult};
pub use pagination::{CursorState, NextPageSignal, PaginationCursor};
