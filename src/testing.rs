//! In-memory renderer and fetcher backed by HTML fixtures.
//!
//! Useful for exercising the pipelines without a browser or network.

use crate::error::PageError;
use crate::fetcher::HtmlFetcher;
use crate::renderer::{ensure_marker, PageRenderer, WaitFor};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Serves fixture pages by URL; unknown URLs fail to load.
#[derive(Default)]
pub struct FixtureRenderer {
    pages: HashMap<String, String>,
    visited: Arc<Mutex<Vec<String>>>,
    closes: Arc<AtomicUsize>,
    fail_close: bool,
}

impl FixtureRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    /// Make `close` report an error (it is still counted).
    pub fn failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    /// Shared counter of `close` calls, readable after the renderer is moved.
    pub fn close_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.closes)
    }

    /// Shared log of rendered URLs, in call order.
    pub fn visit_log(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.visited)
    }
}

impl PageRenderer for FixtureRenderer {
    fn render(&mut self, url: &str, wait: &WaitFor) -> Result<String, PageError> {
        if let Ok(mut visited) = self.visited.lock() {
            visited.push(url.to_string());
        }
        let html = self
            .pages
            .get(url)
            .ok_or_else(|| PageError::load(url, "no fixture for URL"))?;
        ensure_marker(url, html, wait)?;
        Ok(html.clone())
    }

    fn close(&mut self) -> Result<(), PageError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        if self.fail_close {
            return Err(PageError::Close("fixture close failure".to_string()));
        }
        Ok(())
    }
}

/// Serves fixture pages by URL; unknown URLs fail like a rejected request.
///
/// Tracks how many fetches are in flight so tests can check the fan-out bound.
#[derive(Default)]
pub struct FixtureFetcher {
    pages: HashMap<String, String>,
    delays: HashMap<String, Duration>,
    fetches: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl FixtureFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    /// Hold the response for `url` back by `delay`.
    pub fn with_delay(mut self, url: &str, delay: Duration) -> Self {
        self.delays.insert(url.to_string(), delay);
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Highest number of fetches that were running at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HtmlFetcher for FixtureFetcher {
    async fn fetch(&self, url: &str) -> Result<String, PageError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(running, Ordering::SeqCst);

        match self.delays.get(url) {
            Some(delay) => tokio::time::sleep(*delay).await,
            // Yield so concurrent fetches interleave
            None => tokio::task::yield_now().await,
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| PageError::load(url, "no fixture for URL"))
    }
}
