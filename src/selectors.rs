//! Selector sets for the supported marketplaces.
//!
//! Every selector the scrapers use lives here as plain data. When a site
//! changes its markup, update the defaults below or ship a JSON override via
//! `--rooms-selectors` or `--classifieds-selectors`; the extraction code
//! itself should not need to change.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A text field: trimmed text of the matched node(s), or the sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRule {
    pub selector: String,
    /// Take only the first match instead of concatenating all matches.
    #[serde(default)]
    pub first_only: bool,
    /// Prepended to the text when something was found.
    #[serde(default)]
    pub prefix: Option<String>,
}

impl TextRule {
    pub fn all(selector: &str) -> Self {
        Self {
            selector: selector.to_string(),
            first_only: false,
            prefix: None,
        }
    }

    pub fn first(selector: &str) -> Self {
        Self {
            first_only: true,
            ..Self::all(selector)
        }
    }

    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = Some(prefix.to_string());
        self
    }
}

/// A list field: one entry per non-empty matched node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListRule {
    pub selector: String,
}

/// Which listing fact a keyword fills in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Fact {
    Guests,
    Bedrooms,
    Beds,
    Baths,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactKeyword {
    pub fact: Fact,
    pub keyword: String,
}

/// Counts derived from a list of short phrases ("4 guests", "2 bedrooms").
///
/// Keywords are tried in order against each lowercased phrase and the first
/// hit claims it, so more specific keywords must come first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactRule {
    pub selector: String,
    pub keywords: Vec<FactKeyword>,
}

/// How detail URLs are found on a results page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LinkRule {
    /// Anchors whose href starts with `path_prefix`, joined onto the configured origin.
    Anchor {
        selector: String,
        path_prefix: String,
    },
    /// Metadata elements carrying a canonical URL in `attribute`, joined onto `scheme`.
    Meta {
        selector: String,
        attribute: String,
        scheme: String,
    },
}

/// Selectors for the short-term-rental site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomsStrategy {
    /// Present once the results grid has rendered.
    pub search_marker: String,
    pub links: LinkRule,
    /// Present once a listing page has rendered.
    pub title_marker: String,
    pub title: TextRule,
    pub price: TextRule,
    pub location: TextRule,
    pub description: TextRule,
    pub amenities: ListRule,
    pub facts: FactRule,
}

impl Default for RoomsStrategy {
    fn default() -> Self {
        let keyword = |fact, keyword: &str| FactKeyword {
            fact,
            keyword: keyword.to_string(),
        };

        Self {
            search_marker: "div[data-testid='card-container']".to_string(),
            links: LinkRule::Anchor {
                selector: "div[data-testid='card-container'] a".to_string(),
                path_prefix: "/rooms".to_string(),
            },
            title_marker: "h1".to_string(),
            title: TextRule::first("h1"),
            price: TextRule::all("span.umg93v9").with_prefix("$"),
            location: TextRule::all("span.slqk96pm"),
            description: TextRule::all("span.llh825yc"),
            amenities: ListRule {
                selector: "div[class='c16f2viy']".to_string(),
            },
            facts: FactRule {
                selector: "ol.lgx66tx li".to_string(),
                keywords: vec![
                    keyword(Fact::Guests, "guest"),
                    keyword(Fact::Bedrooms, "bedroom"),
                    keyword(Fact::Beds, "bed"),
                    keyword(Fact::Baths, "bath"),
                ],
            },
        }
    }
}

/// Selectors for the classifieds site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifiedsStrategy {
    /// One card per post on the results page.
    pub item: String,
    pub title: String,
    pub link: String,
    pub label: String,
    pub price: String,
    pub description: String,
    pub location: String,
    pub transmission: String,
    pub condition: String,
    pub advert: String,
    pub image: String,
}

impl Default for ClassifiedsStrategy {
    fn default() -> Self {
        Self {
            item: ".masonry-item".to_string(),
            title: ".b-advert-title-inner".to_string(),
            link: ".b-list-advert-base".to_string(),
            label: ".b-list-advert-base__label__inner".to_string(),
            price: ".qa-advert-price".to_string(),
            description: ".b-advert-title-inner".to_string(),
            location: ".b-advert-info-statistics--region".to_string(),
            transmission: ".b-advert-icon-attribute span[itemprop='vehicleTransmission']"
                .to_string(),
            condition: ".b-advert-icon-attribute span[itemprop='itemCondition']".to_string(),
            advert: ".b-advert-paid-info__text".to_string(),
            image: ".b-slider-image".to_string(),
        }
    }
}

/// Load a selector set from JSON, or fall back to the built-in defaults.
///
/// Keys missing from the file keep their default value.
pub fn load_strategy<T>(path: Option<&Path>) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    let Some(path) = path else {
        return Ok(T::default());
    };

    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read selector file: {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse selector file: {}", path.display()))
}
