//! Error types for page acquisition and the scrape pipelines.

use std::time::Duration;
use thiserror::Error;

/// Failure to obtain a page's markup, from either a renderer or a fetcher.
#[derive(Debug, Clone, Error)]
pub enum PageError {
    /// The render context could not be started.
    #[error("failed to launch renderer: {0}")]
    Launch(String),

    /// The page could not be loaded at all.
    #[error("failed to load {url}: {reason}")]
    Load { url: String, reason: String },

    /// The server answered with a non-success status.
    #[error("failed to load {url}: HTTP {status}")]
    Status { url: String, status: u16 },

    /// The page loaded but the marker element never showed up.
    #[error("timed out after {timeout:?} waiting for `{selector}` on {url}")]
    MarkerTimeout {
        url: String,
        selector: String,
        timeout: Duration,
    },

    /// Releasing the render context failed.
    #[error("failed to close renderer: {0}")]
    Close(String),
}

impl PageError {
    pub fn load(url: &str, reason: impl ToString) -> Self {
        PageError::Load {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Discovery could not get a usable results page. Aborts the run.
    #[error("navigation failed: {0}")]
    FatalNavigation(#[source] PageError),

    /// A single detail page failed. Contained at the item boundary.
    #[error("failed to scrape {url}: {source}")]
    ItemExtraction {
        url: String,
        #[source]
        source: PageError,
    },

    /// The concurrent detail fetch failed as a whole.
    #[error("detail fan-out failed: {0}")]
    BatchFanout(#[source] PageError),

    #[error("invalid selector `{selector}`: {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type ScrapeResult<T> = std::result::Result<T, ScrapeError>;
