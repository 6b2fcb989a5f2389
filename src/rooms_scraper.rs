use crate::discovery::LinkDiscoverer;
use crate::error::{PageError, ScrapeError, ScrapeResult};
use crate::models::{ErrorRecord, FactValue, ListingRecord, ScrapeOutcome, NOT_AVAILABLE};
use crate::parser::{self, compile_selector};
use crate::renderer::{PageRenderer, RenderOptions, WaitFor};
use crate::selectors::{Fact, ListRule, RoomsStrategy, TextRule};
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, warn};

struct CompiledText {
    selector: Selector,
    first_only: bool,
    prefix: Option<String>,
}

impl CompiledText {
    fn new(rule: &TextRule) -> ScrapeResult<Self> {
        Ok(Self {
            selector: compile_selector(&rule.selector)?,
            first_only: rule.first_only,
            prefix: rule.prefix.clone(),
        })
    }

    fn extract(&self, root: ElementRef<'_>) -> String {
        let text = if self.first_only {
            parser::first_text(root, &self.selector).unwrap_or_default()
        } else {
            parser::joined_text(root, &self.selector)
        };

        if text.is_empty() {
            return NOT_AVAILABLE.to_string();
        }
        match &self.prefix {
            Some(prefix) => format!("{}{}", prefix, text),
            None => text,
        }
    }
}

fn compile_list(rule: &ListRule) -> ScrapeResult<Selector> {
    compile_selector(&rule.selector)
}

/// Discovery and detail extraction for the short-term-rental site.
pub struct RoomsScraper {
    search_marker: String,
    title_marker: String,
    links: LinkDiscoverer,
    title: CompiledText,
    price: CompiledText,
    location: CompiledText,
    description: CompiledText,
    amenities: Selector,
    facts: Selector,
    fact_keywords: Vec<(Fact, String)>,
    render_options: RenderOptions,
}

impl RoomsScraper {
    /// Validates every selector of `strategy` up front.
    pub fn new(strategy: &RoomsStrategy, origin: &str, render_options: RenderOptions) -> ScrapeResult<Self> {
        compile_selector(&strategy.search_marker)?;
        compile_selector(&strategy.title_marker)?;

        Ok(Self {
            search_marker: strategy.search_marker.clone(),
            title_marker: strategy.title_marker.clone(),
            links: LinkDiscoverer::new(&strategy.links, origin)?,
            title: CompiledText::new(&strategy.title)?,
            price: CompiledText::new(&strategy.price)?,
            location: CompiledText::new(&strategy.location)?,
            description: CompiledText::new(&strategy.description)?,
            amenities: compile_list(&strategy.amenities)?,
            facts: compile_selector(&strategy.facts.selector)?,
            fact_keywords: strategy
                .facts
                .keywords
                .iter()
                .map(|k| (k.fact, k.keyword.to_lowercase()))
                .collect(),
            render_options,
        })
    }

    /// Load the results page and collect listing URLs.
    ///
    /// Any failure here is fatal to the run.
    pub fn discover<R: PageRenderer + ?Sized>(
        &self,
        renderer: &mut R,
        search_url: &str,
    ) -> ScrapeResult<Vec<String>> {
        info!("Navigating to {}", search_url);
        let wait = WaitFor::new(&self.search_marker, self.render_options.marker_timeout);
        let html = renderer
            .render(search_url, &wait)
            .map_err(ScrapeError::FatalNavigation)?;

        let links = self.links.discover(&html);
        info!("Found {} listing links", links.len());
        Ok(links)
    }

    /// Scrape one listing. Failures come back as an error record.
    pub fn scrape_listing<R: PageRenderer + ?Sized>(&self, renderer: &mut R, url: &str) -> ScrapeOutcome {
        match self.fetch_listing(renderer, url) {
            Ok(record) => ScrapeOutcome::Listing(record),
            Err(source) => {
                let record = ErrorRecord {
                    url: url.to_string(),
                    error: source.to_string(),
                };
                warn!(
                    "{}",
                    ScrapeError::ItemExtraction {
                        url: url.to_string(),
                        source,
                    }
                );
                ScrapeOutcome::Failed(record)
            }
        }
    }

    fn fetch_listing<R: PageRenderer + ?Sized>(
        &self,
        renderer: &mut R,
        url: &str,
    ) -> Result<ListingRecord, PageError> {
        debug!("Scraping details from {}", url);
        let wait = WaitFor::new(&self.title_marker, self.render_options.title_timeout);
        let html = renderer.render(url, &wait)?;
        Ok(self.extract_listing(&html, url))
    }

    /// Pull every field out of a listing page. Each field falls back on its own.
    pub fn extract_listing(&self, html: &str, url: &str) -> ListingRecord {
        let document = Html::parse_document(html);
        let root = document.root_element();

        let amenities = root
            .select(&self.amenities)
            .map(parser::element_text)
            .filter(|text| !text.is_empty())
            .collect();

        let mut record = ListingRecord {
            url: url.to_string(),
            title: self.title.extract(root),
            price: self.price.extract(root),
            location: self.location.extract(root),
            description: self.description.extract(root),
            amenities,
            guests: None,
            bedrooms: None,
            beds: None,
            baths: None,
        };
        self.fill_facts(root, &mut record);
        record
    }

    fn fill_facts(&self, root: ElementRef<'_>, record: &mut ListingRecord) {
        for phrase in root.select(&self.facts).map(parser::element_text) {
            let lower = phrase.to_lowercase();
            let Some(fact) = self
                .fact_keywords
                .iter()
                .find(|(_, keyword)| lower.contains(keyword.as_str()))
                .map(|(fact, _)| *fact)
            else {
                continue;
            };

            let slot = match fact {
                Fact::Guests => &mut record.guests,
                Fact::Bedrooms => &mut record.bedrooms,
                Fact::Beds => &mut record.beds,
                Fact::Baths => &mut record.baths,
            };
            if slot.is_none() {
                *slot = Some(
                    parser::leading_integer(&phrase)
                        .map(FactValue::Count)
                        .unwrap_or_else(FactValue::not_available),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FixtureRenderer;

    const LISTING: &str = r#"
        <html><body>
          <h1> Sunny Loft </h1><h1>Other heading</h1>
          <span class="umg93v9">120</span>
          <span class="slqk96pm">Lekki, Lagos, Nigeria</span>
          <span class="llh825yc">Bright and   quiet.</span>
          <ol class="lgx66tx">
            <li>4 guests</li><li>2 bedrooms</li><li>3 beds</li><li>1.5 baths</li>
          </ol>
          <div class="c16f2viy">Wifi</div>
          <div class="c16f2viy"> </div>
          <div class="c16f2viy">Kitchen</div>
          <div class="c16f2viy">Wifi</div>
          <div class="c16f2viy other">Pool</div>
        </body></html>
    "#;

    fn scraper() -> RoomsScraper {
        RoomsScraper::new(
            &RoomsStrategy::default(),
            "https://example.com",
            RenderOptions::default(),
        )
        .unwrap()
    }

    #[test]
    fn extracts_all_fields() {
        let record = scraper().extract_listing(LISTING, "https://example.com/rooms/1");
        assert_eq!(record.title, "Sunny Loft");
        assert_eq!(record.price, "$120");
        assert_eq!(record.location, "Lekki, Lagos, Nigeria");
        assert_eq!(record.description, "Bright and quiet.");
        assert_eq!(record.amenities, vec!["Wifi", "Kitchen", "Wifi"]);
        assert_eq!(record.guests, Some(FactValue::Count(4)));
        assert_eq!(record.bedrooms, Some(FactValue::Count(2)));
        assert_eq!(record.beds, Some(FactValue::Count(3)));
        assert_eq!(record.baths, Some(FactValue::Count(1)));
    }

    #[test]
    fn missing_fields_fall_back_independently() {
        let html = "<html><body><h1>Loft</h1><ol class='lgx66tx'><li>Studio bed</li></ol></body></html>";
        let record = scraper().extract_listing(html, "https://example.com/rooms/2");
        assert_eq!(record.title, "Loft");
        assert_eq!(record.price, NOT_AVAILABLE);
        assert_eq!(record.location, NOT_AVAILABLE);
        assert_eq!(record.description, NOT_AVAILABLE);
        assert!(record.amenities.is_empty());
        assert_eq!(record.beds, Some(FactValue::not_available()));
        assert_eq!(record.guests, None);
        assert_eq!(record.baths, None);
    }

    #[test]
    fn extraction_is_repeatable() {
        let scraper = scraper();
        let first = scraper.extract_listing(LISTING, "u");
        let second = scraper.extract_listing(LISTING, "u");
        assert_eq!(first, second);
    }

    #[test]
    fn render_failure_becomes_error_record() {
        let mut renderer = FixtureRenderer::new();
        let outcome = scraper().scrape_listing(&mut renderer, "https://example.com/rooms/404");
        match outcome {
            ScrapeOutcome::Failed(record) => {
                assert_eq!(record.url, "https://example.com/rooms/404");
                assert!(!record.error.is_empty());
            }
            other => panic!("expected a failed outcome, got {:?}", other),
        }
    }

    #[test]
    fn missing_title_marker_becomes_error_record() {
        let mut renderer = FixtureRenderer::new()
            .with_page("https://example.com/rooms/3", "<html><body><p>blocked</p></body></html>");
        let outcome = scraper().scrape_listing(&mut renderer, "https://example.com/rooms/3");
        assert!(outcome.is_failed());
        assert_eq!(outcome.url(), "https://example.com/rooms/3");
    }

    #[test]
    fn discovery_without_marker_is_fatal() {
        let mut renderer = FixtureRenderer::new()
            .with_page("https://example.com/s/lagos", "<html><body>Loading…</body></html>");
        let err = scraper()
            .discover(&mut renderer, "https://example.com/s/lagos")
            .unwrap_err();
        assert!(matches!(
            err,
            ScrapeError::FatalNavigation(PageError::MarkerTimeout { .. })
        ));
    }

    #[test]
    fn invalid_strategy_selector_is_rejected() {
        let mut strategy = RoomsStrategy::default();
        strategy.price = TextRule::all("span[");
        let result = RoomsScraper::new(&strategy, "https://example.com", RenderOptions::default());
        assert!(matches!(result, Err(ScrapeError::InvalidSelector { .. })));
    }
}
