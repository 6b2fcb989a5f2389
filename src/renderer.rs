//! Page renderers: turn a URL into settled markup.

use crate::error::PageError;
use crate::parser::compile_selector;
use reqwest::blocking::Client;
use scraper::Html;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub user_agent: String,
    /// Upper bound for loading a page.
    pub navigation_timeout: Duration,
    /// How long discovery waits for the results marker.
    pub marker_timeout: Duration,
    /// How long a detail page waits for its title marker.
    pub title_timeout: Duration,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            navigation_timeout: Duration::from_secs(60),
            marker_timeout: Duration::from_secs(10),
            title_timeout: Duration::from_secs(10),
        }
    }
}

/// Readiness condition checked after navigation.
#[derive(Debug, Clone)]
pub struct WaitFor {
    pub selector: String,
    pub timeout: Duration,
}

impl WaitFor {
    pub fn new(selector: &str, timeout: Duration) -> Self {
        Self {
            selector: selector.to_string(),
            timeout,
        }
    }
}

/// A render context that can be navigated repeatedly and closed once.
pub trait PageRenderer {
    /// Navigate to `url`, wait for `wait` and return the rendered markup.
    fn render(&mut self, url: &str, wait: &WaitFor) -> Result<String, PageError>;

    fn close(&mut self) -> Result<(), PageError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum RendererKind {
    /// Plain HTTP fetch, no script execution
    Http,
    /// Headless Chrome (requires the `headless` feature)
    Chrome,
}

/// Build the renderer selected on the command line.
pub fn launch(kind: RendererKind, options: &RenderOptions) -> Result<Box<dyn PageRenderer>, PageError> {
    match kind {
        RendererKind::Http => Ok(Box::new(HttpRenderer::new(options)?)),
        #[cfg(feature = "headless")]
        RendererKind::Chrome => Ok(Box::new(chrome::ChromeRenderer::launch(options)?)),
        #[cfg(not(feature = "headless"))]
        RendererKind::Chrome => Err(PageError::Launch(
            "built without the `headless` feature".to_string(),
        )),
    }
}

impl<R: PageRenderer + ?Sized> PageRenderer for Box<R> {
    fn render(&mut self, url: &str, wait: &WaitFor) -> Result<String, PageError> {
        (**self).render(url, wait)
    }

    fn close(&mut self) -> Result<(), PageError> {
        (**self).close()
    }
}

/// Fetches server-rendered HTML and checks the marker in the returned markup.
///
/// Nothing is executed client-side, so a marker that only appears after
/// scripts run is reported as a timeout straight away.
pub struct HttpRenderer {
    client: Client,
}

impl HttpRenderer {
    pub fn new(options: &RenderOptions) -> Result<Self, PageError> {
        let client = Client::builder()
            .user_agent(&options.user_agent)
            .timeout(options.navigation_timeout)
            .cookie_store(true)
            .build()
            .map_err(|e| PageError::Launch(e.to_string()))?;
        Ok(Self { client })
    }
}

impl PageRenderer for HttpRenderer {
    fn render(&mut self, url: &str, wait: &WaitFor) -> Result<String, PageError> {
        debug!("Fetching {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| PageError::load(url, e))?;

        if !response.status().is_success() {
            return Err(PageError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let body = response.text().map_err(|e| PageError::load(url, e))?;
        ensure_marker(url, &body, wait)?;
        Ok(body)
    }

    fn close(&mut self) -> Result<(), PageError> {
        Ok(())
    }
}

/// Fail with `MarkerTimeout` unless `wait.selector` matches something in `html`.
pub fn ensure_marker(url: &str, html: &str, wait: &WaitFor) -> Result<(), PageError> {
    let selector = compile_selector(&wait.selector).map_err(|e| PageError::load(url, e))?;
    if Html::parse_document(html).select(&selector).next().is_some() {
        Ok(())
    } else {
        Err(PageError::MarkerTimeout {
            url: url.to_string(),
            selector: wait.selector.clone(),
            timeout: wait.timeout,
        })
    }
}

#[cfg(feature = "headless")]
pub mod chrome {
    use super::{PageRenderer, RenderOptions, WaitFor};
    use crate::error::PageError;
    use headless_chrome::{Browser, LaunchOptions, Tab};
    use std::sync::Arc;
    use tracing::{debug, info};

    /// One browser with one tab, reused for every page of a run.
    pub struct ChromeRenderer {
        browser: Option<Browser>,
        tab: Arc<Tab>,
    }

    impl ChromeRenderer {
        pub fn launch(options: &RenderOptions) -> Result<Self, PageError> {
            let launch_options = LaunchOptions::default_builder()
                .headless(true)
                .sandbox(false)
                .idle_browser_timeout(options.navigation_timeout * 2)
                .build()
                .map_err(|e| PageError::Launch(e.to_string()))?;

            let browser = Browser::new(launch_options).map_err(|e| PageError::Launch(e.to_string()))?;
            let tab = browser.new_tab().map_err(|e| PageError::Launch(e.to_string()))?;
            tab.set_user_agent(&options.user_agent, None, None)
                .map_err(|e| PageError::Launch(e.to_string()))?;
            tab.set_default_timeout(options.navigation_timeout);

            info!("Browser launched");
            Ok(Self {
                browser: Some(browser),
                tab,
            })
        }
    }

    impl PageRenderer for ChromeRenderer {
        /// Waits for the load event, not for network idle. Content filled in
        /// by late requests is covered by the marker wait that follows.
        fn render(&mut self, url: &str, wait: &WaitFor) -> Result<String, PageError> {
            debug!("Navigating to {}", url);
            self.tab
                .navigate_to(url)
                .and_then(|tab| tab.wait_until_navigated())
                .map_err(|e| PageError::load(url, e))?;

            self.tab
                .wait_for_element_with_custom_timeout(&wait.selector, wait.timeout)
                .map_err(|_| PageError::MarkerTimeout {
                    url: url.to_string(),
                    selector: wait.selector.clone(),
                    timeout: wait.timeout,
                })?;

            self.tab.get_content().map_err(|e| PageError::load(url, e))
        }

        fn close(&mut self) -> Result<(), PageError> {
            if let Some(browser) = self.browser.take() {
                self.tab
                    .close(true)
                    .map_err(|e| PageError::Close(e.to_string()))?;
                drop(browser);
                info!("Browser closed");
            }
            Ok(())
        }
    }
}
