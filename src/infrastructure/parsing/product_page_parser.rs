//! Product page parser
//!
//! Runs every field chain of an [`ExtractionProfile`] over one document and
//! post-processes price and image. Parsing is synchronous: `scraper::Html` is
//! not `Send`, so callers parse between awaits and only hold the result.

use scraper::Html;
use tracing::{debug, warn};
use url::Url;

use crate::domain::ExtractedFields;

use super::image::extract_image;
use super::price::normalize_price;
use super::selector_extractor::extract_field;
use super::site_profiles::ExtractionProfile;

/// Extracts [`ExtractedFields`] from raw markup using one site profile
pub struct ProductPageParser<'a> {
    profile: &'a ExtractionProfile,
}

impl<'a> ProductPageParser<'a> {
    pub fn new(profile: &'a ExtractionProfile) -> Self {
        Self { profile }
    }

    /// Parse a fetched page. Missing or malformed fields are left absent.
    pub fn parse(&self, html: &str, page_url: &Url) -> ExtractedFields {
        let document = Html::parse_document(html);
        let profile = self.profile;

        let title = extract_field(&document, &profile.title);
        let raw_price = extract_field(&document, &profile.price);
        let normalized_price = raw_price.as_deref().and_then(|raw| {
            let price = normalize_price(raw);
            if price.is_none() {
                warn!("Unparsable price '{}' on {}", raw, page_url);
            }
            price
        });
        let image_url = extract_image(&document, &profile.image, page_url);
        let description = extract_field(&document, &profile.description);

        debug!(
            "Parsed {} page {}: title={} price={} image={} description={}",
            profile.site,
            page_url,
            title.is_some(),
            normalized_price.is_some(),
            image_url.is_some(),
            description.is_some()
        );

        ExtractedFields {
            title,
            raw_price,
            normalized_price,
            image_url,
            description,
            source_name: profile.site,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SiteKind;
    use crate::infrastructure::parsing::SiteProfiles;
    use rust_decimal::Decimal;

    const AMAZON_PAGE: &str = r#"
        <html><head><title>Amazon.com</title></head><body>
          <span id="productTitle">  Echo Dot (5th Gen)  </span>
          <span class="a-price"><span class="a-offscreen">$49.99</span></span>
          <div id="imgTagWrapperId">
            <img id="landingImage" src="//m.media-amazon.com/images/I/echo.jpg">
          </div>
          <div id="productDescription"><p>Smart speaker with Alexa.</p></div>
        </body></html>"#;

    #[test]
    fn test_parses_full_amazon_page() {
        let profiles = SiteProfiles::builtin().unwrap();
        let url = Url::parse("https://www.amazon.com/dp/B09B8V1LZ3").unwrap();
        let fields = ProductPageParser::new(profiles.get(SiteKind::Amazon)).parse(AMAZON_PAGE, &url);

        assert_eq!(fields.title.as_deref(), Some("Echo Dot (5th Gen)"));
        assert_eq!(fields.raw_price.as_deref(), Some("$49.99"));
        assert_eq!(fields.normalized_price, Some(Decimal::new(4999, 2)));
        assert_eq!(
            fields.image_url.as_deref(),
            Some("https://m.media-amazon.com/images/I/echo.jpg")
        );
        assert_eq!(fields.description.as_deref(), Some("Smart speaker with Alexa."));
        assert_eq!(fields.source_name, SiteKind::Amazon);
        assert!(fields.is_complete());
    }

    #[test]
    fn test_unparsable_price_is_absent_not_zero() {
        let profiles = SiteProfiles::builtin().unwrap();
        let url = Url::parse("https://shop.example/p/1").unwrap();
        let html = r#"<h1>Desk Lamp</h1><span class="price">Contact us</span>"#;
        let fields = ProductPageParser::new(profiles.get(SiteKind::Generic)).parse(html, &url);

        assert_eq!(fields.title.as_deref(), Some("Desk Lamp"));
        assert_eq!(fields.raw_price.as_deref(), Some("Contact us"));
        assert_eq!(fields.normalized_price, None);
        assert!(!fields.is_complete());
    }

    #[test]
    fn test_generic_page_uses_meta_fallbacks() {
        let profiles = SiteProfiles::builtin().unwrap();
        let url = Url::parse("https://shop.example/p/2").unwrap();
        let html = r#"<html><head>
            <meta property="og:image" content="/media/chair.png">
            <meta name="description" content="A sturdy oak chair.">
            </head><body>
            <h1 class="product-title">Oak Chair</h1>
            <meta itemprop="price" content="1.234,50">
            </body></html>"#;
        let fields = ProductPageParser::new(profiles.get(SiteKind::Generic)).parse(html, &url);

        assert_eq!(fields.title.as_deref(), Some("Oak Chair"));
        assert_eq!(fields.normalized_price, Some(Decimal::new(123450, 2)));
        assert_eq!(fields.image_url.as_deref(), Some("https://shop.example/media/chair.png"));
        assert_eq!(fields.description.as_deref(), Some("A sturdy oak chair."));
    }

    #[test]
    fn test_empty_page_yields_empty_fields() {
        let profiles = SiteProfiles::builtin().unwrap();
        let url = Url::parse("https://www.ebay.com/itm/1").unwrap();
        let fields = ProductPageParser::new(profiles.get(SiteKind::Ebay)).parse("", &url);

        assert_eq!(fields, ExtractedFields::empty(SiteKind::Ebay));
    }
}
