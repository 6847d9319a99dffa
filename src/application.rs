//! Application layer
//!
//! Orchestrates fetching, parsing and storage into the scrape use cases.

pub mod bootstrap;
pub mod product_scraper;

pub use product_scraper::{ProductScraper, ScraperSettings};
