//! Day-over-day and market-over-market snapshot diffing.

use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use tracing::debug;

use crate::models::{ComparisonResult, PriceChange, Snapshot};

/// Diff two snapshots of the same market, keyed by product code.
///
/// A record present only in `to` is added, only in `from` removed, present
/// in both with a different price changed. Identical source checksums
/// short-circuit to the empty result without per-record comparison; the
/// full path would produce the same answer.
pub fn diff(from: &Snapshot, to: &Snapshot) -> ComparisonResult {
    if !from.source_checksum.is_empty() && from.source_checksum == to.source_checksum {
        debug!(market = %to.market, "source payload unchanged, skipping record diff");
        return ComparisonResult::empty(from, to);
    }

    // First occurrence per code wins for matching; later duplicates in `to`
    // surface as added so audits see every shelf position.
    let mut from_by_code: HashMap<&str, &crate::models::PriceRecord> = HashMap::new();
    for record in &from.records {
        from_by_code.entry(record.product_code.as_str()).or_insert(record);
    }
    let to_codes: HashSet<&str> = to.records.iter().map(|r| r.product_code.as_str()).collect();

    let mut result = ComparisonResult::empty(from, to);
    let mut matched: HashSet<&str> = HashSet::new();
    for record in &to.records {
        match from_by_code.get(record.product_code.as_str()) {
            None => result.added.push(record.clone()),
            Some(old) => {
                if !matched.insert(record.product_code.as_str()) {
                    // Duplicate code in `to`; only the first matches.
                    result.added.push(record.clone());
                    continue;
                }
                if old.price != record.price {
                    result.changed.push(PriceChange {
                        product_code: record.product_code.clone(),
                        old_price: old.price,
                        new_price: record.price,
                        delta_percent: delta_percent(old.price, record.price),
                    });
                }
            }
        }
    }
    for record in &from.records {
        if !to_codes.contains(record.product_code.as_str()) {
            result.removed.push(record.clone());
        }
    }
    result
}

/// `(new - old) / old * 100`, rounded to 2 decimal places half-to-even.
fn delta_percent(old: Decimal, new: Decimal) -> Decimal {
    if old.is_zero() {
        return Decimal::ZERO;
    }
    ((new - old) / old * Decimal::ONE_HUNDRED).round_dp(2)
}
