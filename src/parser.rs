use crate::error::{ScrapeError, ScrapeResult};
use regex::Regex;
use scraper::{ElementRef, Selector};
use std::sync::OnceLock;

pub fn compile_selector(selector: &str) -> ScrapeResult<Selector> {
    Selector::parse(selector).map_err(|e| ScrapeError::InvalidSelector {
        selector: selector.to_string(),
        reason: format!("{:?}", e),
    })
}

/// Text of a single node, whitespace collapsed.
pub fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text of every match under `scope`, concatenated in document order.
pub fn joined_text(scope: ElementRef<'_>, selector: &Selector) -> String {
    scope
        .select(selector)
        .map(element_text)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn first_text(scope: ElementRef<'_>, selector: &Selector) -> Option<String> {
    scope
        .select(selector)
        .next()
        .map(element_text)
        .filter(|text| !text.is_empty())
}

pub fn first_attr(scope: ElementRef<'_>, selector: &Selector, attribute: &str) -> Option<String> {
    scope
        .select(selector)
        .find_map(|element| element.value().attr(attribute))
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Leading integer of a phrase such as "4 guests" or "1.5 baths".
pub fn leading_integer(text: &str) -> Option<u32> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"^\s*(\d+)").expect("static regex"));
    re.captures(text)?.get(1)?.as_str().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn leading_integer_handles_fact_phrases() {
        assert_eq!(leading_integer("4 guests"), Some(4));
        assert_eq!(leading_integer(" 2 bedrooms"), Some(2));
        assert_eq!(leading_integer("1.5 baths"), Some(1));
        assert_eq!(leading_integer("Half-bath"), None);
        assert_eq!(leading_integer("Studio"), None);
    }

    #[test]
    fn text_helpers_trim_and_join() {
        let html = Html::parse_fragment(
            "<div><span class='p'>  $120 </span><span class='p'>\n night</span><span class='p'> </span></div>",
        );
        let selector = compile_selector("span.p").unwrap();
        let root = html.root_element();

        assert_eq!(joined_text(root, &selector), "$120 night");
        assert_eq!(first_text(root, &selector).as_deref(), Some("$120"));
    }

    #[test]
    fn first_attr_skips_missing_attributes() {
        let html = Html::parse_fragment(
            "<div><a class='x'>no href</a><a class='x' href=' /rooms/7 '>ok</a></div>",
        );
        let selector = compile_selector("a.x").unwrap();
        assert_eq!(
            first_attr(html.root_element(), &selector, "href").as_deref(),
            Some("/rooms/7")
        );
    }

    #[test]
    fn invalid_selector_is_reported() {
        let err = compile_selector("div[").unwrap_err();
        assert!(matches!(err, ScrapeError::InvalidSelector { .. }));
    }
}
