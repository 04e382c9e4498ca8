use thiserror::Error;

/// Failures that abort a scraping run.
#[derive(Error, Debug)]
pub enum ScrapeError {
    /// Request failed at the transport level after all retries.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server kept answering with a retryable status.
    #[error("Retries exhausted for {url} (last status {status})")]
    RetriesExhausted { url: String, status: u16 },

    /// Output file could not be written.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration value.
    #[error("Config error: {0}")]
    Config(String),
}

/// Per-page extraction failures. These only ever skip the page they occur on.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ExtractError {
    #[error("element not found: {0}")]
    MissingElement(&'static str),

    #[error("no currency symbol in salary text {0:?}")]
    MissingCurrency(String),

    #[error("no salary amount in salary text {0:?}")]
    MissingAmount(String),

    #[error("page count is not a number: {0:?}")]
    InvalidPageCount(String),
}
