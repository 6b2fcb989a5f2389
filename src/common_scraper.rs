use crate::error::ScrapeResult;
use crate::models::ScrapeOutcome;
use crate::progress;
use crate::renderer::PageRenderer;
use crate::rooms_scraper::RoomsScraper;
use crate::sink::OutputFormat;
use std::path::PathBuf;
use tracing::{error, info, warn};

/// Fan-out width for the classifieds detail fetches.
pub const DEFAULT_CONCURRENCY: usize = 8;

#[derive(Debug, Clone)]
pub struct ScrapingOptions {
    pub search_url: String,
    pub max_items: Option<usize>,
    pub concurrency: usize,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
}

impl Default for ScrapingOptions {
    fn default() -> Self {
        Self {
            search_url: String::new(),
            max_items: None,
            concurrency: DEFAULT_CONCURRENCY,
            format: OutputFormat::Json,
            output: None,
        }
    }
}

impl ScrapingOptions {
    /// Cut the discovered list down to `max_items`, if set.
    pub fn limit<T>(&self, mut items: Vec<T>) -> Vec<T> {
        if let Some(max) = self.max_items {
            if items.len() > max {
                info!("Reached maximum number of items ({}), skipping {} more", max, items.len() - max);
                items.truncate(max);
            }
        }
        items
    }
}

/// Owns the render context for one run and releases it exactly once.
struct RendererGuard<R: PageRenderer> {
    renderer: R,
    released: bool,
}

impl<R: PageRenderer> RendererGuard<R> {
    fn new(renderer: R) -> Self {
        Self {
            renderer,
            released: false,
        }
    }

    fn get(&mut self) -> &mut R {
        &mut self.renderer
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(e) = self.renderer.close() {
            error!("Error closing renderer: {}", e);
        }
    }
}

impl<R: PageRenderer> Drop for RendererGuard<R> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Discover listings, then scrape them one at a time in discovery order.
///
/// The renderer is closed on every exit path. Discovery failures abort the
/// run; a failing listing only turns into an error record.
pub fn run_rooms_scraper<R: PageRenderer>(
    renderer: R,
    scraper: &RoomsScraper,
    options: &ScrapingOptions,
) -> ScrapeResult<Vec<ScrapeOutcome>> {
    let mut guard = RendererGuard::new(renderer);
    let result = scrape_rooms(guard.get(), scraper, options);
    guard.release();

    if let Err(e) = &result {
        error!("Scraping failed: {}", e);
    }
    result
}

fn scrape_rooms<R: PageRenderer>(
    renderer: &mut R,
    scraper: &RoomsScraper,
    options: &ScrapingOptions,
) -> ScrapeResult<Vec<ScrapeOutcome>> {
    let links = options.limit(scraper.discover(renderer, &options.search_url)?);
    if links.is_empty() {
        warn!("No listings found on {}", options.search_url);
        return Ok(Vec::new());
    }

    let bar = progress::item_bar(links.len(), "listings");
    let mut listings = Vec::with_capacity(links.len());
    for link in &links {
        bar.set_message(link.clone());
        listings.push(scraper.scrape_listing(renderer, link));
        bar.inc(1);
    }
    bar.finish_and_clear();

    let failed = listings.iter().filter(|l| l.is_failed()).count();
    info!(
        "Scraped {} listings ({} failed)",
        listings.len(),
        failed
    );
    Ok(listings)
}
