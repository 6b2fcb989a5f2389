//! Command-line and environment configuration shared by the binaries.

use crate::classifieds_scraper::{DEFAULT_LISTING_URL, DEFAULT_ORIGIN};
use crate::common_scraper::{ScrapingOptions, DEFAULT_CONCURRENCY};
use crate::renderer::{RenderOptions, RendererKind, DEFAULT_USER_AGENT};
use crate::sink::OutputFormat;
use clap::Args;
use std::path::PathBuf;
use std::time::Duration;

/// Read `.env` into the process environment, if there is one.
///
/// Runs before argument parsing so `env` fallbacks see the file's values.
pub fn load_dotenv() -> Option<PathBuf> {
    dotenvy::dotenv().ok()
}

#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Maximum number of items to scrape (if not set, scrape all discovered items)
    #[arg(short = 'i', long)]
    pub max_items: Option<usize>,

    /// User agent sent with every request
    #[arg(long, env = "USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Page load timeout in seconds
    #[arg(long, default_value_t = 60)]
    pub timeout: u64,

    /// Enable debug output
    #[arg(short, long)]
    pub debug: bool,
}

#[derive(Args, Debug, Clone)]
pub struct RoomsArgs {
    /// Search results page to start from
    #[arg(long = "link", env = "LINK")]
    pub search_url: Option<String>,

    /// Origin prepended to discovered listing paths
    #[arg(long, env = "URL_PREFIX", default_value = "https://www.airbnb.com")]
    pub url_prefix: String,

    /// How pages are rendered
    #[arg(long, value_enum, default_value_t = RendererKind::Http)]
    pub renderer: RendererKind,

    /// JSON file overriding the rental site selectors
    #[arg(long)]
    pub rooms_selectors: Option<PathBuf>,

    /// Seconds to wait for the results grid to appear
    #[arg(long, default_value_t = 10)]
    pub marker_timeout: u64,

    /// Output format for listings
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub rooms_format: OutputFormat,

    /// Write listings here instead of stdout
    #[arg(long)]
    pub rooms_output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ClassifiedsArgs {
    /// Classifieds results page to start from
    #[arg(long, env = "CLASSIFIEDS_URL", default_value = DEFAULT_LISTING_URL)]
    pub classifieds_url: String,

    /// Origin prepended to relative post links
    #[arg(long, env = "CLASSIFIEDS_ORIGIN", default_value = DEFAULT_ORIGIN)]
    pub classifieds_origin: String,

    /// Maximum number of post pages fetched at once
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// JSON file overriding the classifieds selectors
    #[arg(long)]
    pub classifieds_selectors: Option<PathBuf>,

    /// Output format for posts
    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    pub classifieds_format: OutputFormat,

    /// Write posts here ("-" for stdout) [default: classifieds.<format>]
    #[arg(long)]
    pub classifieds_output: Option<PathBuf>,
}

impl CommonArgs {
    pub fn render_options(&self, marker_timeout: u64) -> RenderOptions {
        RenderOptions {
            user_agent: self.user_agent.clone(),
            navigation_timeout: Duration::from_secs(self.timeout),
            marker_timeout: Duration::from_secs(marker_timeout),
            ..RenderOptions::default()
        }
    }
}

impl RoomsArgs {
    pub fn scraping_options(&self, common: &CommonArgs, search_url: &str) -> ScrapingOptions {
        ScrapingOptions {
            search_url: search_url.to_string(),
            max_items: common.max_items,
            format: self.rooms_format,
            output: self.rooms_output.clone(),
            ..ScrapingOptions::default()
        }
    }
}

impl ClassifiedsArgs {
    pub fn scraping_options(&self, common: &CommonArgs) -> ScrapingOptions {
        let output = match &self.classifieds_output {
            Some(path) if path.as_os_str() == "-" => None,
            Some(path) => Some(path.clone()),
            None => Some(PathBuf::from(format!(
                "classifieds.{}",
                self.classifieds_format.extension()
            ))),
        };
        ScrapingOptions {
            search_url: self.classifieds_url.clone(),
            max_items: common.max_items,
            concurrency: self.concurrency,
            format: self.classifieds_format,
            output,
        }
    }
}
