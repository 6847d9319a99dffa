//! Product data as it moves from a scraped page to a persisted row
//!
//! `ExtractedFields` is what the page parser produces, `ProductDraft` is the
//! normalized subset that passed the acceptance gate, and `ProductRecord` is
//! the stored row returned by the product store.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fractional digits consumers expect on a stored price
pub const PRICE_SCALE: u32 = 2;

/// Site family used to pick an extraction profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteKind {
    Amazon,
    Ebay,
    Jumia,
    Generic,
}

impl SiteKind {
    pub const ALL: [SiteKind; 4] = [
        SiteKind::Amazon,
        SiteKind::Ebay,
        SiteKind::Jumia,
        SiteKind::Generic,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SiteKind::Amazon => "amazon",
            SiteKind::Ebay => "ebay",
            SiteKind::Jumia => "jumia",
            SiteKind::Generic => "generic",
        }
    }
}

impl fmt::Display for SiteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Origin stored alongside a product row.
///
/// `Manual` rows are entered outside the scraper; the engine never produces them
/// but must read them back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceName {
    Amazon,
    Ebay,
    Jumia,
    Generic,
    Manual,
}

impl SourceName {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceName::Amazon => "amazon",
            SourceName::Ebay => "ebay",
            SourceName::Jumia => "jumia",
            SourceName::Generic => "generic",
            SourceName::Manual => "manual",
        }
    }
}

impl From<SiteKind> for SourceName {
    fn from(kind: SiteKind) -> Self {
        match kind {
            SiteKind::Amazon => SourceName::Amazon,
            SiteKind::Ebay => SourceName::Ebay,
            SiteKind::Jumia => SourceName::Jumia,
            SiteKind::Generic => SourceName::Generic,
        }
    }
}

impl FromStr for SourceName {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "amazon" => Ok(SourceName::Amazon),
            "ebay" => Ok(SourceName::Ebay),
            "jumia" => Ok(SourceName::Jumia),
            "generic" => Ok(SourceName::Generic),
            "manual" => Ok(SourceName::Manual),
            other => Err(format!("unknown product source '{other}'")),
        }
    }
}

impl fmt::Display for SourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields pulled from one fetched page. Any of them may be missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFields {
    pub title: Option<String>,
    pub raw_price: Option<String>,
    pub normalized_price: Option<Decimal>,
    pub image_url: Option<String>,
    pub description: Option<String>,
    pub source_name: SiteKind,
}

impl ExtractedFields {
    pub fn empty(source_name: SiteKind) -> Self {
        Self {
            title: None,
            raw_price: None,
            normalized_price: None,
            image_url: None,
            description: None,
            source_name,
        }
    }

    /// A record is only worth storing with both a title and a parsable price.
    pub fn is_complete(&self) -> bool {
        self.title.is_some() && self.normalized_price.is_some()
    }

    /// Build the persistable draft, or `None` when the acceptance gate rejects the page.
    pub fn to_draft(&self, url: &str, description_max_chars: usize) -> Option<ProductDraft> {
        let title = self.title.clone()?;
        let price = self.normalized_price?;

        Some(ProductDraft {
            url: url.to_string(),
            title,
            price: storage_price(price),
            image_url: self.image_url.clone(),
            source: self.source_name.into(),
            description: self
                .description
                .as_deref()
                .map(|text| truncate_chars(text, description_max_chars)),
        })
    }
}

/// Normalized product ready for `upsert_by_url`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub url: String,
    pub title: String,
    pub price: Decimal,
    pub image_url: Option<String>,
    pub source: SourceName,
    pub description: Option<String>,
}

/// Stored product row; unique by `url`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: String,
    pub url: String,
    pub title: String,
    pub price: Decimal,
    pub image_url: Option<String>,
    pub source: SourceName,
    pub description: Option<String>,
    #[serde(rename = "scrapedAt")]
    pub scraped_at: DateTime<Utc>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// Round a price to the stored precision
pub fn storage_price(price: Decimal) -> Decimal {
    price.round_dp_with_strategy(PRICE_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => text[..byte_index].trim_end().to_string(),
        None => text.to_string(),
    }
}
