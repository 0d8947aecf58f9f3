//! # Page Fetcher Module
//!
//! Retrieves raw HTML for programme URLs. This is pure I/O: a fixed user
//! agent, a bounded timeout and no parsing logic. A timeout or a non-2xx
//! response is reported as a `FetchError` for that URL only; the scraper
//! records it and moves on.
//!
//! ## Key Components
//!
//! - `PageFetcher`: the capability the scraper depends on
//! - `HttpFetcher`: the reqwest-backed implementation
//! - `FetcherConfig`: user agent, timeout and body size limits
//! - `FetchedPage`: the raw page handed to the parser registry

mod config;
mod error;
mod http;

pub use config::{DEFAULT_USER_AGENT, FetcherConfig, FetcherConfigBuilder};
pub use error::FetchError;
pub use http::HttpFetcher;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;

/// A fetched page with its raw HTML
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FetchedPage {
    /// URL the page was requested from
    pub url: String,

    /// HTTP status code of the response
    pub status: u16,

    /// Raw HTML body
    pub html: String,

    /// When the page was fetched
    pub fetched_at: DateTime<Utc>,
}

impl FetchedPage {
    /// Create a page fetched now with a 200 status
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: 200,
            html: html.into(),
            fetched_at: Utc::now(),
        }
    }
}

/// Capability for retrieving a page by URL.
///
/// Implementations must bound every request in time; the scraper never
/// retries and treats any error as a per-URL failure.
pub trait PageFetcher: Send + Sync {
    /// Fetch the page at `url`
    fn fetch(&self, url: &str) -> impl Future<Output = Result<FetchedPage, FetchError>> + Send;
}
