//! End-to-end runs used by the binaries: configure, scrape, emit.

use crate::classifieds_scraper::ClassifiedsScraper;
use crate::common_scraper::run_rooms_scraper;
use crate::config::{ClassifiedsArgs, CommonArgs, RoomsArgs};
use crate::error::ScrapeError;
use crate::fetcher::ReqwestFetcher;
use crate::renderer;
use crate::rooms_scraper::RoomsScraper;
use crate::selectors::{load_strategy, ClassifiedsStrategy, RoomsStrategy};
use crate::sink;
use anyhow::{Context, Result};
use std::time::Duration;
use tracing::info;

/// Scrape the rental site and emit the listings. Returns the record count.
pub fn run_rooms(common: &CommonArgs, args: &RoomsArgs) -> Result<usize> {
    let search_url = args
        .search_url
        .as_deref()
        .ok_or_else(|| ScrapeError::InvalidConfig("no search URL given (use --link or set LINK)".to_string()))?;

    let strategy: RoomsStrategy = load_strategy(args.rooms_selectors.as_deref())?;
    let render_options = common.render_options(args.marker_timeout);
    let scraper = RoomsScraper::new(&strategy, &args.url_prefix, render_options.clone())?;
    let options = args.scraping_options(common, search_url);

    let renderer = renderer::launch(args.renderer, &render_options).context("Error setting up renderer")?;
    let listings = run_rooms_scraper(renderer, &scraper, &options)?;

    sink::emit(&listings, options.format, options.output.as_deref())?;
    Ok(listings.len())
}

/// Scrape the classifieds site and emit the posts. Returns the record count.
pub fn run_classifieds(common: &CommonArgs, args: &ClassifiedsArgs) -> Result<usize> {
    let strategy: ClassifiedsStrategy = load_strategy(args.classifieds_selectors.as_deref())?;
    let scraper = ClassifiedsScraper::new(&strategy, &args.classifieds_origin)?;
    let options = args.scraping_options(common);
    let fetcher = ReqwestFetcher::new(&common.user_agent, Duration::from_secs(common.timeout))?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    let posts = runtime.block_on(scraper.scrape(
        &fetcher,
        &options.search_url,
        options.max_items,
        options.concurrency,
    ))?;

    let detailed = posts.iter().filter(|p| p.detail.is_some()).count();
    info!("Scraped {} posts ({} with details)", posts.len(), detailed);

    sink::emit(&posts, options.format, options.output.as_deref())?;
    Ok(posts.len())
}
