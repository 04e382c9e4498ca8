//! Blocking HTTP session with browser-like headers and retry on transient failures.

use std::error::Error as _;
use std::io;
use std::thread;
use std::time::Duration;

use rand::prelude::IndexedRandom;
use rand::Rng;
use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, DNT, USER_AGENT};
use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::error::ScrapeError;

/// Query parameters as sent on the wire. Keys may repeat.
pub type Params = [(&'static str, String)];

const ACCEPT_LANGUAGE_VALUE: &str = "ru,en;q=0.9";

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.0.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:115.0) Gecko/20100101 Firefox/115.0",
    "Mozilla/5.0 (Windows NT 6.1; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/109.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 OPR/106.0.0.0",
];

const ACCEPT_VALUES: &[&str] = &[
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,image/apng,*/*;q=0.8",
    "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
];

/// Random desktop Windows browser headers with a fixed Russian locale preference.
pub fn random_headers() -> HeaderMap {
    let mut rng = rand::rng();
    let mut headers = HeaderMap::new();

    if let Some(ua) = USER_AGENTS.choose(&mut rng) {
        headers.insert(USER_AGENT, HeaderValue::from_static(*ua));
    }
    if let Some(accept) = ACCEPT_VALUES.choose(&mut rng) {
        headers.insert(ACCEPT, HeaderValue::from_static(*accept));
    }
    if rng.random_bool(0.5) {
        headers.insert(DNT, HeaderValue::from_static("1"));
    }
    if rng.random_bool(0.5) {
        headers.insert(
            "upgrade-insecure-requests",
            HeaderValue::from_static("1"),
        );
    }
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_VALUE));

    headers
}

/// Fixed-count exponential backoff on a fixed set of statuses.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// The n-th retry waits `backoff_factor * 2^(n-1)`.
    pub backoff_factor: Duration,
    pub statuses: Vec<StatusCode>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            backoff_factor: Duration::from_millis(300),
            statuses: vec![
                StatusCode::INTERNAL_SERVER_ERROR,
                StatusCode::BAD_GATEWAY,
                StatusCode::GATEWAY_TIMEOUT,
            ],
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (1-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        let exp = retry.saturating_sub(1).min(31);
        self.backoff_factor * (1u32 << exp)
    }

    pub fn is_retryable_status(&self, status: StatusCode) -> bool {
        self.statuses.contains(&status)
    }

    /// Connect failures, timeouts and connections dropped mid-request.
    pub fn is_retryable_error(&self, err: &reqwest::Error) -> bool {
        err.is_connect() || err.is_timeout() || is_connection_reset(err)
    }
}

fn is_connection_reset(err: &reqwest::Error) -> bool {
    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            return matches!(
                io_err.kind(),
                io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
                    | io::ErrorKind::UnexpectedEof
            );
        }
        source = cause.source();
    }
    false
}

/// A reusable request-issuing session.
///
/// Not meant to be shared between threads; each run owns its sessions.
pub struct Session {
    client: Client,
    retry: RetryPolicy,
}

impl Session {
    pub fn new() -> Result<Self, ScrapeError> {
        Self::with_policy(RetryPolicy::default())
    }

    pub fn with_policy(retry: RetryPolicy) -> Result<Self, ScrapeError> {
        let client = Client::builder()
            .default_headers(random_headers())
            .build()?;

        Ok(Self { client, retry })
    }

    /// GET `url`, retrying transient failures.
    ///
    /// Non-retryable statuses are returned as-is for the caller to inspect.
    pub fn get(&self, url: &str, params: Option<&Params>) -> Result<Response, ScrapeError> {
        let mut retry = 0;
        loop {
            let mut request = self.client.get(url);
            if let Some(params) = params {
                request = request.query(params);
            }

            match request.send() {
                Ok(response) if self.retry.is_retryable_status(response.status()) => {
                    let status = response.status();
                    if retry >= self.retry.max_retries {
                        return Err(ScrapeError::RetriesExhausted {
                            url: response.url().to_string(),
                            status: status.as_u16(),
                        });
                    }
                    retry += 1;
                    let delay = self.retry.backoff(retry);
                    warn!(%url, status = status.as_u16(), retry, ?delay, "Retrying after server error");
                    thread::sleep(delay);
                }
                Ok(response) => return Ok(response),
                Err(e) if self.retry.is_retryable_error(&e) && retry < self.retry.max_retries => {
                    retry += 1;
                    let delay = self.retry.backoff(retry);
                    warn!(%url, error = %e, retry, ?delay, "Retrying after connection failure");
                    thread::sleep(delay);
                }
                Err(e) => {
                    debug!(%url, error = %e, "Request failed");
                    return Err(e.into());
                }
            }
        }
    }
}
