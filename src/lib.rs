//! hostcrawl: a concurrent single-host web crawler
//!
//! Given one seed URL, the engine discovers every reachable page on the
//! same host, streaming one [`Page`] per URL together with a separate
//! stream of non-fatal [`CrawlError`]s. Fetching and parsing are consumed
//! through the [`Fetcher`] and [`Parser`] traits so they can be replaced
//! in tests; [`HttpFetcher`] and [`HtmlParser`] are the production
//! implementations.

// Core modules
mod crawler;
mod error;
mod fetcher;
mod parser;
mod unique_set;

// Public exports
pub use crawler::{ConfigError, Crawler, CrawlerBuilder, CrawlerConfig, Page, WorkTracker};
pub use error::CrawlError;
pub use fetcher::{FetchError, Fetcher, HttpFetcher};
pub use parser::{HtmlParser, Parser};
pub use unique_set::UniqueSet;
