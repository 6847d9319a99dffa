//! Domain module - product data and scrape outcomes
//!
//! Plain data types shared by the parsing, fetching and storage layers.

pub mod outcome;
pub mod product;

pub use outcome::{FailureReason, ScrapeOutcome, ScrapeReport};
pub use product::{
    ExtractedFields, ProductDraft, ProductRecord, SiteKind, SourceName, storage_price,
};
