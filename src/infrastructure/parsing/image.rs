//! Product image URL resolution
//!
//! Lazy-loading pages often put a placeholder in `src` and the real image in a
//! `data-*` attribute, so every attribute is tried in priority order and the
//! first one that resolves to a well-formed absolute URL wins.

use scraper::{ElementRef, Html};
use tracing::debug;
use url::Url;

use super::selector_extractor::SelectorChain;

/// Image source attributes in priority order; `content` covers `<meta property="og:image">`
pub const IMAGE_SOURCE_ATTRIBUTES: [&str; 5] =
    ["src", "data-src", "data-lazy-src", "data-original", "content"];

/// Resolve one candidate source against the page it was found on.
///
/// Returns `None` for blank or malformed results; a broken image reference is
/// worse than none.
pub fn resolve_image(candidate: &str, page_url: &Url) -> Option<String> {
    let candidate = candidate.trim();
    if candidate.is_empty() {
        return None;
    }

    let absolute = if has_scheme(candidate) {
        candidate.to_string()
    } else if let Some(rest) = candidate.strip_prefix("//") {
        format!("{}://{}", page_url.scheme(), rest)
    } else {
        let origin = page_url.origin().ascii_serialization();
        if candidate.starts_with('/') {
            format!("{origin}{candidate}")
        } else {
            format!("{origin}/{candidate}")
        }
    };

    match Url::parse(&absolute) {
        Ok(url) if is_well_formed(&url) => Some(url.to_string()),
        Ok(url) => {
            debug!("Dropping image with unsupported scheme or no host: {}", url);
            None
        }
        Err(e) => {
            debug!("Dropping malformed image URL '{}': {}", absolute, e);
            None
        }
    }
}

/// First attribute of `element` that resolves to a usable image URL
pub fn resolve_image_element(element: ElementRef<'_>, page_url: &Url) -> Option<String> {
    IMAGE_SOURCE_ATTRIBUTES
        .iter()
        .filter_map(|name| element.value().attr(name))
        .find_map(|value| resolve_image(value, page_url))
}

/// Walk an image selector chain and return the first resolvable image
pub fn extract_image(document: &Html, chain: &SelectorChain, page_url: &Url) -> Option<String> {
    chain
        .matches(document)
        .find_map(|element| resolve_image_element(element, page_url))
}

fn has_scheme(value: &str) -> bool {
    let Some(colon) = value.find(':') else {
        return false;
    };
    let scheme = &value[..colon];
    let mut chars = scheme.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

fn is_well_formed(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https") && url.host_str().is_some_and(|h| !h.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SiteKind;

    fn page() -> Url {
        Url::parse("https://shop.example/p/1").unwrap()
    }

    #[test]
    fn test_relative_image_rebased_on_origin() {
        assert_eq!(
            resolve_image("/img/x.jpg", &page()),
            Some("https://shop.example/img/x.jpg".to_string())
        );
        assert_eq!(
            resolve_image("img/x.jpg", &page()),
            Some("https://shop.example/img/x.jpg".to_string())
        );
    }

    #[test]
    fn test_protocol_relative_inherits_scheme() {
        assert_eq!(
            resolve_image("//cdn.example/a.png", &page()),
            Some("https://cdn.example/a.png".to_string())
        );
    }

    #[test]
    fn test_absolute_and_port_preserved() {
        let page = Url::parse("http://localhost:8080/item").unwrap();
        assert_eq!(
            resolve_image("/a.png", &page),
            Some("http://localhost:8080/a.png".to_string())
        );
        assert_eq!(
            resolve_image("https://img.example/b.png", &page),
            Some("https://img.example/b.png".to_string())
        );
    }

    #[test]
    fn test_malformed_or_unsupported_dropped() {
        assert_eq!(resolve_image("", &page()), None);
        assert_eq!(resolve_image("data:image/gif;base64,R0lGOD", &page()), None);
        assert_eq!(resolve_image("javascript:void(0)", &page()), None);
        assert_eq!(resolve_image("http://", &page()), None);
    }

    #[test]
    fn test_lazy_attribute_used_when_src_is_placeholder() {
        let html = Html::parse_document(
            r#"<img id="main" src="data:image/gif;base64,AAAA" data-src="/real.jpg">"#,
        );
        let chain = SelectorChain::compile(SiteKind::Generic, "image", &["#main"]).unwrap();

        assert_eq!(
            extract_image(&html, &chain, &page()),
            Some("https://shop.example/real.jpg".to_string())
        );
    }

    #[test]
    fn test_src_beats_lazy_attributes() {
        let html = Html::parse_document(
            r#"<img class="p" src="/a.jpg" data-src="/b.jpg" data-original="/c.jpg">"#,
        );
        let chain = SelectorChain::compile(SiteKind::Generic, "image", &["img.p"]).unwrap();

        assert_eq!(
            extract_image(&html, &chain, &page()),
            Some("https://shop.example/a.jpg".to_string())
        );
    }
}
