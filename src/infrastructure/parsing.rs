//! HTML parsing infrastructure
//!
//! Selector fallback chains, price and image post-processing, and the
//! per-site extraction profiles that tie them together.

pub mod image;
pub mod price;
pub mod product_page_parser;
pub mod selector_extractor;
pub mod site_profiles;

pub use crate::infrastructure::parsing_error::{ParsingError, ParsingResult};
pub use image::{extract_image, resolve_image};
pub use price::normalize_price;
pub use product_page_parser::ProductPageParser;
pub use selector_extractor::{SelectorChain, extract_field};
pub use site_profiles::{ExtractionProfile, SiteProfiles, detect_site};
