//! hh.ru Vacancy Scraper
//!
//! Collects vacancies matching the search configured through `HH_*`
//! environment variables and saves them to a JSON file.

use anyhow::Result;
use hh_scraper::SearchConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("hh_scraper=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = SearchConfig::from_env()?;
    info!(
        text = %config.search_text,
        keywords = ?config.keywords,
        currency_only = config.currency_only,
        page_limit = config.page_limit,
        "Starting hh.ru vacancy scraper"
    );

    let summary = hh_scraper::run(&config)?;
    info!(
        viewed = summary.viewed,
        matched = summary.matched,
        written = summary.written,
        "Scraping complete"
    );

    Ok(())
}
