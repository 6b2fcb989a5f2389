use crate::error::ScrapeResult;
use crate::parser::compile_selector;
use crate::selectors::LinkRule;
use scraper::{Html, Selector};
use tracing::debug;

/// Pulls detail-page URLs out of a rendered results page.
///
/// Order follows the document and duplicates are kept as-is.
pub struct LinkDiscoverer {
    selector: Selector,
    kind: LinkKind,
}

enum LinkKind {
    Anchor { path_prefix: String, origin: String },
    Meta { attribute: String, scheme: String },
}

impl LinkDiscoverer {
    /// `origin` is only used by anchor rules.
    pub fn new(rule: &LinkRule, origin: &str) -> ScrapeResult<Self> {
        let (selector, kind) = match rule {
            LinkRule::Anchor {
                selector,
                path_prefix,
            } => (
                selector,
                LinkKind::Anchor {
                    path_prefix: path_prefix.clone(),
                    origin: origin.trim_end_matches('/').to_string(),
                },
            ),
            LinkRule::Meta {
                selector,
                attribute,
                scheme,
            } => (
                selector,
                LinkKind::Meta {
                    attribute: attribute.clone(),
                    scheme: scheme.clone(),
                },
            ),
        };

        Ok(Self {
            selector: compile_selector(selector)?,
            kind,
        })
    }

    pub fn discover(&self, html: &str) -> Vec<String> {
        let document = Html::parse_document(html);
        let links: Vec<String> = document
            .select(&self.selector)
            .filter_map(|element| match &self.kind {
                LinkKind::Anchor {
                    path_prefix,
                    origin,
                } => element
                    .value()
                    .attr("href")
                    .filter(|href| href.starts_with(path_prefix.as_str()))
                    .map(|href| format!("{}{}", origin, href)),
                LinkKind::Meta { attribute, scheme } => element
                    .value()
                    .attr(attribute)
                    .map(str::trim)
                    .filter(|value| !value.is_empty())
                    .map(|value| absolutize(value, scheme)),
            })
            .collect();

        debug!("Found {} listing links: {:?}", links.len(), links);
        links
    }
}

fn absolutize(value: &str, scheme: &str) -> String {
    if value.starts_with("http://") || value.starts_with("https://") {
        value.to_string()
    } else {
        format!("{}{}", scheme, value.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH: &str = r#"
        <html><body>
          <div data-testid="card-container"><a href="/rooms/1?check_in=x">Loft</a></div>
          <div data-testid="card-container"><a href="/wishlists/2">Save</a><a href="/rooms/2">Flat</a></div>
          <div data-testid="card-container"><a href="/rooms/1?check_in=x">Loft again</a></div>
          <a href="/rooms/99">outside any card</a>
        </body></html>
    "#;

    fn anchor_rule() -> LinkRule {
        LinkRule::Anchor {
            selector: "div[data-testid='card-container'] a".to_string(),
            path_prefix: "/rooms".to_string(),
        }
    }

    #[test]
    fn anchors_are_filtered_prefixed_and_kept_in_order() {
        let discoverer = LinkDiscoverer::new(&anchor_rule(), "https://example.com/").unwrap();
        assert_eq!(
            discoverer.discover(SEARCH),
            vec![
                "https://example.com/rooms/1?check_in=x",
                "https://example.com/rooms/2",
                "https://example.com/rooms/1?check_in=x",
            ]
        );
    }

    #[test]
    fn meta_urls_get_the_fixed_scheme() {
        let html = r#"
            <div itemprop="itemListElement"><meta itemprop="url" content="www.example.com/rooms/5"></div>
            <div itemprop="itemListElement"><meta itemprop="url" content="//www.example.com/rooms/6"></div>
            <div itemprop="itemListElement"><meta itemprop="url" content="https://www.example.com/rooms/7"></div>
            <div itemprop="itemListElement"><meta itemprop="url" content=""></div>
        "#;
        let rule = LinkRule::Meta {
            selector: "div[itemprop='itemListElement'] meta[itemprop='url']".to_string(),
            attribute: "content".to_string(),
            scheme: "https://".to_string(),
        };
        let discoverer = LinkDiscoverer::new(&rule, "ignored").unwrap();
        assert_eq!(
            discoverer.discover(html),
            vec![
                "https://www.example.com/rooms/5",
                "https://www.example.com/rooms/6",
                "https://www.example.com/rooms/7",
            ]
        );
    }

    #[test]
    fn page_without_cards_yields_nothing() {
        let discoverer = LinkDiscoverer::new(&anchor_rule(), "https://example.com").unwrap();
        assert!(discoverer.discover("<html><body></body></html>").is_empty());
    }
}
