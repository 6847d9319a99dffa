//! Scrape outcomes reported to callers
//!
//! An ordinary "page had nothing usable" result is a value, not an error.

use serde::{Deserialize, Serialize};

use super::product::{ExtractedFields, ProductRecord};

/// Reason code attached to every unsuccessful scrape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureReason {
    /// Page fetched but title or price missing
    NoDataExtracted,
    /// Fetch gave up: deterministic HTTP status or retries exhausted
    FetchFailed,
    /// Last permitted attempt timed out
    Timeout,
    /// Extraction succeeded but the product store rejected the upsert
    StorageFailed,
}

/// Result of `scrape_product`
#[derive(Debug, Clone, PartialEq)]
pub enum ScrapeOutcome {
    Stored {
        record: ProductRecord,
        fields: ExtractedFields,
    },
    NoData {
        fields: ExtractedFields,
    },
    Failed(FailureReason),
}

impl ScrapeOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ScrapeOutcome::Stored { .. })
    }

    pub fn reason(&self) -> Option<FailureReason> {
        match self {
            ScrapeOutcome::Stored { .. } => None,
            ScrapeOutcome::NoData { .. } => Some(FailureReason::NoDataExtracted),
            ScrapeOutcome::Failed(reason) => Some(*reason),
        }
    }

    pub fn fields(&self) -> Option<&ExtractedFields> {
        match self {
            ScrapeOutcome::Stored { fields, .. } | ScrapeOutcome::NoData { fields } => Some(fields),
            ScrapeOutcome::Failed(_) => None,
        }
    }
}

/// Serializable shape of a scrape result for outer layers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeReport {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<ExtractedFields>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<FailureReason>,
}

impl From<ScrapeOutcome> for ScrapeReport {
    fn from(outcome: ScrapeOutcome) -> Self {
        match outcome {
            ScrapeOutcome::Stored { fields, .. } => Self {
                success: true,
                fields: Some(fields),
                reason: None,
            },
            ScrapeOutcome::NoData { fields } => Self {
                success: false,
                fields: Some(fields),
                reason: Some(FailureReason::NoDataExtracted),
            },
            ScrapeOutcome::Failed(reason) => Self {
                success: false,
                fields: None,
                reason: Some(reason),
            },
        }
    }
}
