use crate::models::Brand;

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// Discovery page unreachable or its expected markup is gone.
    /// Brand-level: aborts that brand's run, never silently swallowed.
    #[error("catalog unavailable for {brand}: {reason}")]
    CatalogUnavailable { brand: Brand, reason: String },

    /// Transient network/HTTP failure for one market.
    #[error("fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// Payload retrieved but does not match the expected shape.
    #[error("parse failed for {context}: {reason}")]
    Parse { context: String, reason: String },

    /// A snapshot already exists for this (date, brand, market) key.
    /// Ordering error in the caller; a prior day's evidence is never overwritten.
    #[error("snapshot already exists for {date} {brand} {market_id}")]
    DuplicateSnapshot {
        date: chrono::NaiveDate,
        brand: Brand,
        market_id: String,
    },

    /// No snapshot for the requested key. Expected when probing history;
    /// callers treat this as absence, not failure.
    #[error("no snapshot for {date} {brand} {market_id}")]
    SnapshotNotFound {
        date: chrono::NaiveDate,
        brand: Brand,
        market_id: String,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl ArchiveError {
    /// True for errors recorded against one market and skipped, as opposed
    /// to errors that abort a whole brand or signal a caller bug.
    pub fn is_market_level(&self) -> bool {
        matches!(
            self,
            ArchiveError::Fetch { .. } | ArchiveError::Parse { .. } | ArchiveError::Http(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ArchiveError>;
