//! Throttled page fetching and HTML parsing.

use std::thread;
use std::time::Duration;

use reqwest::StatusCode;
use scraper::Html;
use tracing::{debug, error};

use crate::client::{Params, Session};
use crate::error::ScrapeError;

/// Turns a URL into a parsed document.
///
/// `Ok(None)` means the server answered but not with a page worth parsing;
/// callers skip that page. `Err` means the request itself could not be made.
pub trait PageFetcher {
    fn fetch(&self, url: &str, params: Option<&Params>) -> Result<Option<Html>, ScrapeError>;
}

/// [`PageFetcher`] over a [`Session`] that waits a fixed delay before every request.
pub struct ThrottledFetcher {
    session: Session,
    delay: Duration,
}

impl ThrottledFetcher {
    pub fn new(session: Session, delay: Duration) -> Self {
        Self { session, delay }
    }
}

impl PageFetcher for ThrottledFetcher {
    fn fetch(&self, url: &str, params: Option<&Params>) -> Result<Option<Html>, ScrapeError> {
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }

        let response = self.session.get(url, params)?;
        let status = response.status();
        if status != StatusCode::OK {
            error!(
                url = %response.url(),
                status = status.as_u16(),
                "Page fetch returned non-200 status"
            );
            return Ok(None);
        }

        let body = response.text()?;
        debug!(%url, bytes = body.len(), "Fetched page");

        Ok(Some(Html::parse_document(&body)))
    }
}
