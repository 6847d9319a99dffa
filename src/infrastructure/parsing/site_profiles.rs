//! Site strategy table
//!
//! One statically defined extraction profile per supported site family plus a
//! generic fallback. Dispatch is a match over [`SiteKind`], so adding a site
//! without a profile does not compile.

use std::collections::HashMap;
use std::time::Duration;

use url::Url;

use crate::domain::SiteKind;
use crate::infrastructure::parsing_error::ParsingResult;

use super::selector_extractor::SelectorChain;

/// Selector lists for one site, most specific first
struct SelectorSet {
    title: &'static [&'static str],
    price: &'static [&'static str],
    image: &'static [&'static str],
    description: &'static [&'static str],
    min_delay_ms: u64,
}

const AMAZON: SelectorSet = SelectorSet {
    title: &["#productTitle", "#title span", "h1.a-size-large", "h1"],
    price: &[
        ".a-price .a-offscreen",
        "#priceblock_ourprice",
        "#priceblock_dealprice",
        "#corePrice_feature_div .a-offscreen",
        ".a-price-whole",
    ],
    image: &["#landingImage", "#imgBlkFront", "#main-image", "#imgTagWrapperId img"],
    description: &["#productDescription", "#feature-bullets", "#bookDescription_feature_div"],
    min_delay_ms: 3000,
};

const EBAY: SelectorSet = SelectorSet {
    title: &[".x-item-title__mainTitle span", "#itemTitle", "h1.it-ttl", "h1"],
    price: &[
        ".x-price-primary span",
        "#prcIsum",
        "#mm-saleDscPrc",
        "[itemprop='price']",
    ],
    image: &["#icImg", ".ux-image-carousel-item img", "[itemprop='image']"],
    description: &["#viTabs_0_is", ".x-item-description", "#desc_div"],
    min_delay_ms: 2000,
};

const JUMIA: SelectorSet = SelectorSet {
    title: &["h1.-fs20", ".-pvs h1", "h1"],
    price: &["span.-b.-ltr.-tal.-fs24", ".-hr .-b", "[data-price]"],
    image: &["#imgs img", ".sldr img", "img.-fw"],
    description: &[".markup.-mhm", ".markup", "#productDescriptionTab"],
    min_delay_ms: 1500,
};

const GENERIC: SelectorSet = SelectorSet {
    title: &[
        "h1[itemprop='name']",
        "[itemprop='name']",
        "meta[property='og:title']",
        ".product-title",
        ".product-name",
        "h1",
        "title",
    ],
    price: &[
        "[itemprop='price']",
        "meta[property='product:price:amount']",
        ".price",
        ".product-price",
        "[class*='price']",
    ],
    image: &[
        "[itemprop='image']",
        "meta[property='og:image']",
        ".product-image img",
        "img.product",
        "main img",
    ],
    description: &[
        "[itemprop='description']",
        "meta[name='description']",
        ".product-description",
        "#description",
    ],
    min_delay_ms: 1000,
};

fn selector_set(kind: SiteKind) -> &'static SelectorSet {
    match kind {
        SiteKind::Amazon => &AMAZON,
        SiteKind::Ebay => &EBAY,
        SiteKind::Jumia => &JUMIA,
        SiteKind::Generic => &GENERIC,
    }
}

/// Compiled selectors and rate policy for one site family
#[derive(Debug, Clone)]
pub struct ExtractionProfile {
    pub site: SiteKind,
    pub title: SelectorChain,
    pub price: SelectorChain,
    pub image: SelectorChain,
    pub description: SelectorChain,
    pub min_delay: Duration,
}

impl ExtractionProfile {
    fn compile(site: SiteKind) -> ParsingResult<Self> {
        let set = selector_set(site);
        Ok(Self {
            site,
            title: SelectorChain::compile(site, "title", set.title)?,
            price: SelectorChain::compile(site, "price", set.price)?,
            image: SelectorChain::compile(site, "image", set.image)?,
            description: SelectorChain::compile(site, "description", set.description)?,
            min_delay: Duration::from_millis(set.min_delay_ms),
        })
    }
}

/// Immutable profile table, built once at startup and shared read-only
#[derive(Debug, Clone)]
pub struct SiteProfiles {
    amazon: ExtractionProfile,
    ebay: ExtractionProfile,
    jumia: ExtractionProfile,
    generic: ExtractionProfile,
}

impl SiteProfiles {
    /// Compile the built-in profiles. Fails only on an invalid built-in selector.
    pub fn builtin() -> ParsingResult<Self> {
        Ok(Self {
            amazon: ExtractionProfile::compile(SiteKind::Amazon)?,
            ebay: ExtractionProfile::compile(SiteKind::Ebay)?,
            jumia: ExtractionProfile::compile(SiteKind::Jumia)?,
            generic: ExtractionProfile::compile(SiteKind::Generic)?,
        })
    }

    /// Replace the minimum inter-request delay of selected sites
    pub fn with_delay_overrides(mut self, overrides: &HashMap<SiteKind, u64>) -> Self {
        for (kind, delay_ms) in overrides {
            self.get_mut(*kind).min_delay = Duration::from_millis(*delay_ms);
        }
        self
    }

    pub fn get(&self, kind: SiteKind) -> &ExtractionProfile {
        match kind {
            SiteKind::Amazon => &self.amazon,
            SiteKind::Ebay => &self.ebay,
            SiteKind::Jumia => &self.jumia,
            SiteKind::Generic => &self.generic,
        }
    }

    fn get_mut(&mut self, kind: SiteKind) -> &mut ExtractionProfile {
        match kind {
            SiteKind::Amazon => &mut self.amazon,
            SiteKind::Ebay => &mut self.ebay,
            SiteKind::Jumia => &mut self.jumia,
            SiteKind::Generic => &mut self.generic,
        }
    }

    pub fn for_url(&self, url: &Url) -> &ExtractionProfile {
        self.get(detect_site(url))
    }
}

/// Map a URL to its site family by host label.
///
/// `www.amazon.co.uk`, `amazon.de` and `m.ebay.com` match; `notamazon.com`
/// and a path containing "amazon" do not.
pub fn detect_site(url: &Url) -> SiteKind {
    let Some(host) = url.host_str() else {
        return SiteKind::Generic;
    };
    let host = host.to_ascii_lowercase();
    let labels: Vec<&str> = host.split('.').collect();
    let Some((_, registrable)) = labels.split_last() else {
        return SiteKind::Generic;
    };

    registrable
        .iter()
        .find_map(|label| match *label {
            "amazon" => Some(SiteKind::Amazon),
            "ebay" => Some(SiteKind::Ebay),
            "jumia" => Some(SiteKind::Jumia),
            _ => None,
        })
        .unwrap_or(SiteKind::Generic)
}
