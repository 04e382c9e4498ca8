//! Search configuration.
//!
//! Built once per run and passed by reference to every stage.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ScrapeError;

pub const DEFAULT_SEARCH_URL: &str = "https://spb.hh.ru/search/vacancy";
pub const DEFAULT_OUTPUT: &str = "vacancy_data.json";
pub const DEFAULT_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Text typed into the site's search box.
    pub search_text: String,
    pub search_url: String,
    /// Salary currency code sent with the search (`RUR`, `USD`, `EUR`).
    pub currency: String,
    /// Words looked up in the vacancy description. Empty disables the filter.
    pub keywords: Vec<String>,
    /// Keep only vacancies paid in `$` or `€`.
    pub currency_only: bool,
    /// Maximum number of listing pages to read, 0 for all of them.
    pub page_limit: usize,
    /// Region codes sent as repeated `area` parameters.
    pub areas: Vec<String>,
    /// Politeness delay before each request.
    pub delay: Duration,
    pub output: PathBuf,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            search_text: "Python".to_string(),
            search_url: DEFAULT_SEARCH_URL.to_string(),
            currency: "RUR".to_string(),
            keywords: vec!["Django".to_string(), "Flask".to_string()],
            currency_only: false,
            page_limit: 10,
            areas: vec!["1".to_string(), "2".to_string()],
            delay: DEFAULT_DELAY,
            output: PathBuf::from(DEFAULT_OUTPUT),
        }
    }
}

impl SearchConfig {
    pub fn new(search_text: impl Into<String>) -> Self {
        Self {
            search_text: search_text.into(),
            ..Self::default()
        }
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn with_currency_only(mut self, currency_only: bool) -> Self {
        self.currency_only = currency_only;
        self
    }

    pub fn with_page_limit(mut self, page_limit: usize) -> Self {
        self.page_limit = page_limit;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = output.into();
        self
    }

    /// Defaults overridden by `HH_*` environment variables.
    ///
    /// A `.env` file in the working directory is loaded first if present.
    pub fn from_env() -> Result<Self, ScrapeError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ScrapeError> {
        let mut config = Self::default();

        if let Some(url) = lookup("HH_SEARCH_URL") {
            config.search_url = url;
        }
        if let Some(text) = lookup("HH_SEARCH_TEXT") {
            config.search_text = text;
        }
        if let Some(currency) = lookup("HH_CURRENCY") {
            config.currency = currency;
        }
        if let Some(keywords) = lookup("HH_KEYWORDS") {
            config.keywords = split_list(&keywords);
        }
        if let Some(areas) = lookup("HH_AREAS") {
            config.areas = split_list(&areas);
        }
        if let Some(flag) = lookup("HH_CURRENCY_ONLY") {
            config.currency_only = parse_bool(&flag)
                .ok_or_else(|| ScrapeError::Config(format!("HH_CURRENCY_ONLY: {flag:?}")))?;
        }
        if let Some(limit) = lookup("HH_PAGE_LIMIT") {
            config.page_limit = limit
                .trim()
                .parse()
                .map_err(|e| ScrapeError::Config(format!("HH_PAGE_LIMIT: {e}")))?;
        }
        if let Some(delay) = lookup("HH_DELAY_MS") {
            let millis: u64 = delay
                .trim()
                .parse()
                .map_err(|e| ScrapeError::Config(format!("HH_DELAY_MS: {e}")))?;
            config.delay = Duration::from_millis(millis);
        }
        if let Some(output) = lookup("HH_OUTPUT") {
            config.output = PathBuf::from(output);
        }

        Ok(config)
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
