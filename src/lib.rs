pub mod app;
pub mod classifieds_scraper;
pub mod common_scraper;
pub mod config;
pub mod discovery;
pub mod error;
pub mod fetcher;
pub mod logging;
pub mod models;
pub mod parser;
pub mod progress;
pub mod renderer;
pub mod rooms_scraper;
pub mod selectors;
pub mod sink;
pub mod testing;
