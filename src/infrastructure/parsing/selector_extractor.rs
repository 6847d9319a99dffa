//! Ordered selector fallback chains
//!
//! A chain is tried strictly in order and the first selector yielding a
//! non-empty value wins. When no selector yields text, a second pass reads the
//! structured value attributes some sites use for prices and availability.

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::domain::SiteKind;
use crate::infrastructure::parsing_error::{ParsingError, ParsingResult};

/// Attributes consulted, in order, when no matched element has text
pub const VALUE_ATTRIBUTES: [&str; 4] = ["data-price", "content", "value", "data-value"];

/// Compiled, ordered list of CSS selectors for one logical field
#[derive(Debug, Clone)]
pub struct SelectorChain {
    field: String,
    sources: Vec<String>,
    selectors: Vec<Selector>,
}

impl SelectorChain {
    /// Compile every selector; a single invalid one rejects the whole chain.
    pub fn compile(site: SiteKind, field: &str, selector_strings: &[&str]) -> ParsingResult<Self> {
        if selector_strings.is_empty() {
            return Err(ParsingError::EmptySelectorChain {
                site,
                field: field.to_string(),
            });
        }

        let mut selectors = Vec::with_capacity(selector_strings.len());
        for selector_str in selector_strings {
            let selector = Selector::parse(selector_str).map_err(|e| {
                ParsingError::invalid_selector(site, field, selector_str, &e.to_string())
            })?;
            selectors.push(selector);
        }

        Ok(Self {
            field: field.to_string(),
            sources: selector_strings.iter().map(|s| (*s).to_string()).collect(),
            selectors,
        })
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    /// Elements matched by each selector, in chain order
    pub fn matches<'a>(&'a self, document: &'a Html) -> impl Iterator<Item = ElementRef<'a>> + 'a {
        self.selectors
            .iter()
            .flat_map(move |selector| document.select(selector))
    }
}

/// Extract the first non-empty value for a field.
///
/// Text pass first, then the attribute pass over [`VALUE_ATTRIBUTES`] in the
/// same selector order. Returns `None` when nothing matches.
pub fn extract_field(document: &Html, chain: &SelectorChain) -> Option<String> {
    extract_text(document, chain).or_else(|| extract_attribute(document, chain, &VALUE_ATTRIBUTES))
}

/// First selector whose matched elements carry non-empty trimmed text
pub fn extract_text(document: &Html, chain: &SelectorChain) -> Option<String> {
    for (index, selector) in chain.selectors.iter().enumerate() {
        for element in document.select(selector) {
            let text = element_text(element);
            if !text.is_empty() {
                debug!(
                    "Extracted {} using selector {} ({}): {}",
                    chain.field, index, chain.sources[index], text
                );
                return Some(text);
            }
        }
    }

    None
}

/// First non-empty attribute among `attributes`, walking selectors in chain order
pub fn extract_attribute(document: &Html, chain: &SelectorChain, attributes: &[&str]) -> Option<String> {
    for (index, selector) in chain.selectors.iter().enumerate() {
        for element in document.select(selector) {
            if let Some(value) = first_attribute(element, attributes) {
                debug!(
                    "Extracted {} from attribute via selector {} ({}): {}",
                    chain.field, index, chain.sources[index], value
                );
                return Some(value.to_string());
            }
        }
    }

    debug!(
        "No value for {} after {} selectors",
        chain.field,
        chain.selectors.len()
    );
    None
}

/// First attribute in priority order with a non-blank value
pub fn first_attribute<'a>(element: ElementRef<'a>, attributes: &[&str]) -> Option<&'a str> {
    attributes
        .iter()
        .filter_map(|name| element.value().attr(name))
        .map(str::trim)
        .find(|value| !value.is_empty())
}

/// Element text with runs of whitespace collapsed
pub fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(selectors: &[&str]) -> SelectorChain {
        SelectorChain::compile(SiteKind::Generic, "title", selectors).unwrap()
    }

    #[test]
    fn test_first_match_wins_in_order() {
        let html = Html::parse_document(
            r#"<html><body><h1 id="title">  Wireless
                Mouse </h1><span class="name">Other</span></body></html>"#,
        );
        let selectors = chain(&[".missing", ".also-missing", "#title"]);

        assert_eq!(extract_field(&html, &selectors), Some("Wireless Mouse".to_string()));
    }

    #[test]
    fn test_earlier_selector_beats_later_one() {
        let html = Html::parse_document(
            r#"<div class="b">second</div><div class="a">first</div>"#,
        );
        assert_eq!(extract_field(&html, &chain(&[".a", ".b"])), Some("first".to_string()));
    }

    #[test]
    fn test_empty_text_falls_through_to_next_selector() {
        let html = Html::parse_document(r#"<h1>   </h1><h2>Fallback</h2>"#);
        assert_eq!(extract_field(&html, &chain(&["h1", "h2"])), Some("Fallback".to_string()));
    }

    #[test]
    fn test_attribute_pass_runs_when_all_text_is_empty() {
        let html = Html::parse_document(
            r#"<span class="price" data-price=" 49.90 "></span>
               <meta itemprop="price" content="12.00">"#,
        );
        let prices = chain(&["meta[itemprop='price']", ".price"]);

        assert_eq!(extract_field(&html, &prices), Some("12.00".to_string()));
    }

    #[test]
    fn test_attribute_priority_within_element() {
        let html = Html::parse_document(r#"<input class="p" value="3" data-price="7">"#);
        assert_eq!(extract_field(&html, &chain(&[".p"])), Some("7".to_string()));
    }

    #[test]
    fn test_no_match_is_absent_not_error() {
        let html = Html::parse_document("<p>nothing here</p>");
        assert_eq!(extract_field(&html, &chain(&[".x", "#y"])), None);
    }

    #[test]
    fn test_invalid_selector_rejects_chain() {
        let err = SelectorChain::compile(SiteKind::Amazon, "price", &["div[", ".ok"]).unwrap_err();
        assert!(matches!(err, ParsingError::InvalidSelector { .. }));

        let err = SelectorChain::compile(SiteKind::Amazon, "price", &[]).unwrap_err();
        assert!(matches!(err, ParsingError::EmptySelectorChain { .. }));
    }
}
