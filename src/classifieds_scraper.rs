use crate::error::{PageError, ScrapeError, ScrapeResult};
use crate::fetcher::HtmlFetcher;
use crate::models::{ClassifiedRecord, PostDetail, PostHeader};
use crate::parser::{self, compile_selector};
use crate::progress;
use crate::selectors::ClassifiedsStrategy;
use futures::stream::{self, StreamExt, TryStreamExt};
use scraper::{Html, Selector};
use tracing::{debug, info, warn};

pub const DEFAULT_ORIGIN: &str = "https://jiji.ng";
pub const DEFAULT_LISTING_URL: &str = "https://jiji.ng/cars";

struct CompiledClassifieds {
    item: Selector,
    title: Selector,
    link: Selector,
    label: Selector,
    price: Selector,
    description: Selector,
    location: Selector,
    transmission: Selector,
    condition: Selector,
    advert: Selector,
    image: Selector,
}

/// Header scraping and concurrent detail enrichment for the classifieds site.
pub struct ClassifiedsScraper {
    selectors: CompiledClassifieds,
    origin: String,
}

impl ClassifiedsScraper {
    pub fn new(strategy: &ClassifiedsStrategy, origin: &str) -> ScrapeResult<Self> {
        Ok(Self {
            selectors: CompiledClassifieds {
                item: compile_selector(&strategy.item)?,
                title: compile_selector(&strategy.title)?,
                link: compile_selector(&strategy.link)?,
                label: compile_selector(&strategy.label)?,
                price: compile_selector(&strategy.price)?,
                description: compile_selector(&strategy.description)?,
                location: compile_selector(&strategy.location)?,
                transmission: compile_selector(&strategy.transmission)?,
                condition: compile_selector(&strategy.condition)?,
                advert: compile_selector(&strategy.advert)?,
                image: compile_selector(&strategy.image)?,
            },
            origin: origin.trim_end_matches('/').to_string(),
        })
    }

    /// One header per result card. A card without a link keeps an empty url.
    pub fn parse_headers(&self, html: &str) -> Vec<PostHeader> {
        let document = Html::parse_document(html);
        let s = &self.selectors;

        document
            .select(&s.item)
            .map(|card| {
                let url = parser::first_attr(card, &s.link, "href")
                    .map(|href| {
                        if href.starts_with("http") {
                            href
                        } else {
                            format!("{}{}", self.origin, href)
                        }
                    })
                    .unwrap_or_default();

                PostHeader {
                    title: parser::joined_text(card, &s.title),
                    url,
                    advert_label: parser::joined_text(card, &s.label),
                    price: parser::joined_text(card, &s.price),
                }
            })
            .collect()
    }

    pub fn parse_detail(&self, html: &str) -> PostDetail {
        let document = Html::parse_document(html);
        let root = document.root_element();
        let s = &self.selectors;

        PostDetail {
            description: parser::joined_text(root, &s.description),
            location: parser::joined_text(root, &s.location),
            transmission_type: parser::joined_text(root, &s.transmission),
            condition: parser::joined_text(root, &s.condition),
            advert: parser::joined_text(root, &s.advert),
            image: parser::first_attr(root, &s.image, "src"),
        }
    }

    /// Fetch the results page and parse its headers. Failure is fatal.
    pub async fn scrape_headers<F: HtmlFetcher + ?Sized>(
        &self,
        fetcher: &F,
        listing_url: &str,
    ) -> ScrapeResult<Vec<PostHeader>> {
        info!("Fetching listing page {}", listing_url);
        let html = fetcher
            .fetch(listing_url)
            .await
            .map_err(ScrapeError::FatalNavigation)?;

        let headers = self.parse_headers(&html);
        info!("Found {} posts", headers.len());
        Ok(headers)
    }

    /// Fetch every post page, at most `concurrency` at a time.
    ///
    /// Results keep the order of `headers`. If any fetch fails the whole batch
    /// is dropped and the headers come back without details.
    pub async fn enrich<F: HtmlFetcher + ?Sized>(
        &self,
        fetcher: &F,
        headers: Vec<PostHeader>,
        concurrency: usize,
    ) -> Vec<ClassifiedRecord> {
        match self.fetch_details(fetcher, &headers, concurrency).await {
            Ok(details) => headers
                .into_iter()
                .zip(details)
                .map(|(header, detail)| ClassifiedRecord {
                    header,
                    detail: Some(detail),
                })
                .collect(),
            Err(e) => {
                warn!("{}; keeping header-only records", ScrapeError::BatchFanout(e));
                headers.into_iter().map(ClassifiedRecord::header_only).collect()
            }
        }
    }

    async fn fetch_details<F: HtmlFetcher + ?Sized>(
        &self,
        fetcher: &F,
        headers: &[PostHeader],
        concurrency: usize,
    ) -> Result<Vec<PostDetail>, PageError> {
        let bar = progress::item_bar(headers.len(), "posts");
        let result: Result<Vec<PostDetail>, PageError> = stream::iter(headers)
            .map(|header| {
                let bar = bar.clone();
                async move {
                    debug!("Fetching post {}", header.url);
                    let html = fetcher.fetch(&header.url).await?;
                    bar.inc(1);
                    Ok::<_, PageError>(self.parse_detail(&html))
                }
            })
            .buffered(concurrency.max(1))
            .try_collect()
            .await;
        bar.finish_and_clear();
        result
    }

    /// Headers, then details. Only the header fetch can fail the run.
    pub async fn scrape<F: HtmlFetcher + ?Sized>(
        &self,
        fetcher: &F,
        listing_url: &str,
        max_items: Option<usize>,
        concurrency: usize,
    ) -> ScrapeResult<Vec<ClassifiedRecord>> {
        let mut headers = self.scrape_headers(fetcher, listing_url).await?;
        if let Some(max) = max_items {
            headers.truncate(max);
        }
        Ok(self.enrich(fetcher, headers, concurrency).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FixtureFetcher;

    const RESULTS: &str = r#"<html><body>
        <div class="masonry-item">
          <a class="b-list-advert-base" href="/cars/toyota-camry-1">
            <div class="b-advert-title-inner"> Toyota Camry 2010 </div>
            <span class="b-list-advert-base__label__inner">ENTERPRISE</span>
            <div class="qa-advert-price">₦ 5,500,000</div>
          </a>
        </div>
        <div class="masonry-item">
          <a class="b-list-advert-base" href="/cars/honda-accord-2">
            <div class="b-advert-title-inner">Honda Accord</div>
            <div class="qa-advert-price">₦ 3,000,000</div>
          </a>
        </div>
    </body></html>"#;

    const DETAIL: &str = r#"<html><body>
        <div class="b-advert-title-inner">Toyota Camry 2010 Silver</div>
        <div class="b-advert-info-statistics--region">Lagos, Ikeja</div>
        <div class="b-advert-icon-attribute"><span itemprop="vehicleTransmission">Automatic</span></div>
        <div class="b-advert-icon-attribute"><span itemprop="itemCondition">Nigerian Used</span></div>
        <div class="b-advert-paid-info__text">Top advert</div>
        <img class="b-slider-image" src="https://pictures.jiji.ng/1.jpg">
    </body></html>"#;

    fn scraper() -> ClassifiedsScraper {
        ClassifiedsScraper::new(&ClassifiedsStrategy::default(), DEFAULT_ORIGIN).unwrap()
    }

    #[test]
    fn headers_are_read_per_card() {
        let headers = scraper().parse_headers(RESULTS);
        assert_eq!(headers.len(), 2);
        assert_eq!(headers[0].title, "Toyota Camry 2010");
        assert_eq!(headers[0].url, "https://jiji.ng/cars/toyota-camry-1");
        assert_eq!(headers[0].advert_label, "ENTERPRISE");
        assert_eq!(headers[0].price, "₦ 5,500,000");
        assert_eq!(headers[1].advert_label, "");
    }

    #[test]
    fn card_without_link_keeps_empty_url() {
        let html = r#"<div class="masonry-item"><div class="b-advert-title-inner">No link</div></div>"#;
        let headers = scraper().parse_headers(html);
        assert_eq!(headers.len(), 1);
        assert_eq!(headers[0].url, "");
    }

    #[test]
    fn detail_fields_are_extracted() {
        let detail = scraper().parse_detail(DETAIL);
        assert_eq!(detail.description, "Toyota Camry 2010 Silver");
        assert_eq!(detail.location, "Lagos, Ikeja");
        assert_eq!(detail.transmission_type, "Automatic");
        assert_eq!(detail.condition, "Nigerian Used");
        assert_eq!(detail.advert, "Top advert");
        assert_eq!(detail.image.as_deref(), Some("https://pictures.jiji.ng/1.jpg"));
    }

    #[tokio::test]
    async fn enrich_keeps_input_order() {
        let scraper = scraper();
        let headers = scraper.parse_headers(RESULTS);
        let fetcher = FixtureFetcher::new()
            .with_page("https://jiji.ng/cars/toyota-camry-1", DETAIL)
            .with_page(
                "https://jiji.ng/cars/honda-accord-2",
                r#"<div class="b-advert-info-statistics--region">Abuja</div>"#,
            );

        let records = scraper.enrich(&fetcher, headers.clone(), 2).await;

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].header, headers[0]);
        assert_eq!(records[1].header, headers[1]);
        assert_eq!(records[0].detail.as_ref().unwrap().location, "Lagos, Ikeja");
        assert_eq!(records[1].detail.as_ref().unwrap().location, "Abuja");
        assert_eq!(records[1].detail.as_ref().unwrap().image, None);
    }

    #[tokio::test]
    async fn one_failed_fetch_degrades_the_whole_batch() {
        let scraper = scraper();
        let headers = scraper.parse_headers(RESULTS);
        let fetcher = FixtureFetcher::new().with_page("https://jiji.ng/cars/toyota-camry-1", DETAIL);

        let records = scraper.enrich(&fetcher, headers.clone(), 8).await;

        let expected: Vec<ClassifiedRecord> =
            headers.into_iter().map(ClassifiedRecord::header_only).collect();
        assert_eq!(records, expected);
    }

    #[tokio::test]
    async fn zero_concurrency_is_treated_as_one() {
        let scraper = scraper();
        let headers = scraper.parse_headers(RESULTS);
        let fetcher = FixtureFetcher::new()
            .with_page("https://jiji.ng/cars/toyota-camry-1", DETAIL)
            .with_page("https://jiji.ng/cars/honda-accord-2", DETAIL);

        let records = scraper.enrich(&fetcher, headers, 0).await;
        assert!(records.iter().all(|r| r.detail.is_some()));
        assert_eq!(fetcher.fetch_count(), 2);
    }

    #[tokio::test]
    async fn missing_results_page_is_fatal() {
        let err = scraper()
            .scrape(&FixtureFetcher::new(), DEFAULT_LISTING_URL, None, 4)
            .await
            .unwrap_err();
        assert!(matches!(err, ScrapeError::FatalNavigation(PageError::Load { .. })));
    }

    #[tokio::test]
    async fn scrape_respects_max_items() {
        let fetcher = FixtureFetcher::new()
            .with_page(DEFAULT_LISTING_URL, RESULTS)
            .with_page("https://jiji.ng/cars/toyota-camry-1", DETAIL);

        let records = scraper()
            .scrape(&fetcher, DEFAULT_LISTING_URL, Some(1), 4)
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].detail.is_some());
    }
}
