//! Product Scraper - resilient multi-site product extraction
//!
//! Fetches e-commerce product pages through rotating identities and proxies,
//! extracts title, price, image and description with per-site selector
//! chains, and upserts accepted products into SQLite keyed by URL.

// Module declarations
pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::{ProductScraper, ScraperSettings};
pub use domain::{FailureReason, ScrapeOutcome, ScrapeReport};
