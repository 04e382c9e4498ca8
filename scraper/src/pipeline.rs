//! One scraping run: links, then vacancies, then the output file.

use tracing::info;

use crate::client::Session;
use crate::config::SearchConfig;
use crate::error::ScrapeError;
use crate::extractor::extract_vacancy;
use crate::fetcher::{PageFetcher, ThrottledFetcher};
use crate::paginator::collect_links;
use crate::writer::save_to_json;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    /// Detail links collected from the listing pages.
    pub viewed: usize,
    pub matched: usize,
    /// Whether the output file was written.
    pub written: bool,
}

/// Runs the whole scrape against the live site.
///
/// Listing and detail pages use separate sessions, each with its own header set.
pub fn run(config: &SearchConfig) -> Result<RunSummary, ScrapeError> {
    let listing = ThrottledFetcher::new(Session::new()?, config.delay);
    let details = ThrottledFetcher::new(Session::new()?, config.delay);
    run_with(&listing, &details, config)
}

pub fn run_with(
    listing: &impl PageFetcher,
    details: &impl PageFetcher,
    config: &SearchConfig,
) -> Result<RunSummary, ScrapeError> {
    let links = collect_links(listing, config)?;
    info!(count = links.len(), "Reviewing vacancies");

    let mut vacancies = Vec::new();
    for (index, link) in links.iter().enumerate() {
        let Some(document) = details.fetch(link, None)? else {
            continue;
        };
        if let Some(vacancy) = extract_vacancy(link, &document, config) {
            vacancies.push(vacancy);
        }
        if (index + 1) % 20 == 0 {
            info!(done = index + 1, of = links.len(), matched = vacancies.len(), "Progress");
        }
    }

    info!(viewed = links.len(), "Vacancies viewed");
    info!(matched = vacancies.len(), "Matching vacancies found");

    let written = save_to_json(&vacancies, &config.output)?;
    if written {
        info!(path = %config.output.display(), "Vacancies saved");
    }

    Ok(RunSummary {
        viewed: links.len(),
        matched: vacancies.len(),
        written,
    })
}
