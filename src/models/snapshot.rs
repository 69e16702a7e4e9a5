use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{MarketIdentity, PriceRecord};

// ---------------------------------------------------------------------------
// Snapshot: one immutable, dated price listing for one market
// ---------------------------------------------------------------------------

/// A dated, append-only price listing for one market.
///
/// At most one snapshot exists per `(date, brand, market id)`; once persisted
/// it is never mutated or deleted. Corrections are new snapshots for a later
/// date, never in-place edits. The identity embedded here is the one resolved
/// at fetch time, regardless of later catalog renames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub date: NaiveDate,
    pub market: MarketIdentity,
    pub records: Vec<PriceRecord>,
    pub fetched_at: DateTime<Utc>,
    /// SHA-256 of the raw source payload; lets the comparator short-circuit
    /// when the upstream bytes are identical day over day.
    pub source_checksum: String,
}

// ---------------------------------------------------------------------------
// ComparisonResult: structured day-over-day diff
// ---------------------------------------------------------------------------

/// One product whose price moved between two snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceChange {
    pub product_code: String,
    pub old_price: Decimal,
    pub new_price: Decimal,
    /// `(new - old) / old * 100`, rounded to 2 decimal places half-to-even.
    pub delta_percent: Decimal,
}

/// Transient diff of two snapshots of the same market, keyed by product code.
/// Serializes to the JSON shape the presentation layer consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub market: MarketIdentity,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub added: Vec<PriceRecord>,
    pub removed: Vec<PriceRecord>,
    pub changed: Vec<PriceChange>,
}

impl ComparisonResult {
    /// An empty result between the given snapshots (nothing changed).
    pub fn empty(from: &Snapshot, to: &Snapshot) -> Self {
        Self {
            market: to.market.clone(),
            from_date: from.date,
            to_date: to.date,
            added: Vec::new(),
            removed: Vec::new(),
            changed: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}
