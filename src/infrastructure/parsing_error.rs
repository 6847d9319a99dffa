//! Parsing error types
//!
//! Selector misses and unparsable values never surface as errors; they degrade
//! the field to absent. These variants cover contract violations only.

use thiserror::Error;

use crate::domain::SiteKind;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParsingError {
    #[error("Invalid CSS selector for {site}.{field}: {selector} - {reason}")]
    InvalidSelector {
        site: SiteKind,
        field: String,
        selector: String,
        reason: String,
    },

    #[error("Empty selector chain for {site}.{field}")]
    EmptySelectorChain { site: SiteKind, field: String },

    #[error("Invalid page URL: {url} - {reason}")]
    InvalidPageUrl { url: String, reason: String },
}

impl ParsingError {
    pub fn invalid_selector(site: SiteKind, field: &str, selector: &str, reason: &str) -> Self {
        Self::InvalidSelector {
            site,
            field: field.to_string(),
            selector: selector.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_page_url(url: &str, reason: impl ToString) -> Self {
        Self::InvalidPageUrl {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type ParsingResult<T> = Result<T, ParsingError>;
