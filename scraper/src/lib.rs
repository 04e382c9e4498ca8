//! hh.ru vacancy scraper
//!
//! Reads search results page by page, visits every vacancy found and keeps
//! the ones matching the configured keywords and currency.

pub mod client;
pub mod config;
pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod paginator;
pub mod pipeline;
pub mod writer;

#[cfg(test)]
pub(crate) mod testutil;

pub use client::{RetryPolicy, Session};
pub use config::SearchConfig;
pub use error::{ExtractError, ScrapeError};
pub use fetcher::{PageFetcher, ThrottledFetcher};
pub use pipeline::{run, RunSummary};
