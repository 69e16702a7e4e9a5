//! Source adapters: one variant per brand, dispatched on the closed
//! [`Brand`] enum. Each turns its brand's published format into canonical
//! [`PriceRecord`]s while preserving source row order.

pub mod kam;
pub mod paged;
pub mod vero;

use chrono::NaiveDate;
use sha2::{Digest, Sha256};

use crate::config;
use crate::error::{ArchiveError, Result};
use crate::models::{parse_price, Brand, MarketIdentity, PriceRecord};
use crate::transport::Transport;

// ---------------------------------------------------------------------------
// Options and outcome
// ---------------------------------------------------------------------------

/// Tunables shared by all adapter variants.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Rows per page on the paginated sites; a shorter page is terminal.
    pub page_size: usize,
    /// Safety bound against infinite pagination from a server bug.
    pub max_pages: usize,
    /// A fetch whose skipped/attempted row ratio exceeds this fails with a
    /// parse error instead of returning a misleading partial result.
    pub skip_ratio_threshold: f64,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            page_size: config::PAGE_SIZE,
            max_pages: config::MAX_PAGES,
            skip_ratio_threshold: config::DEFAULT_SKIP_RATIO,
        }
    }
}

/// Result of one market fetch: the normalized records plus the bookkeeping
/// the snapshot store and run report need.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub records: Vec<PriceRecord>,
    /// SHA-256 hex over the raw source payload (all page bodies, in order).
    pub source_checksum: String,
    /// Source rows that failed row-level parsing and were dropped.
    pub skipped_rows: usize,
    pub pages_fetched: usize,
}

/// Fetch and normalize one market's listing, selecting the adapter variant
/// by the market's brand tag.
pub fn fetch(
    transport: &dyn Transport,
    market: &MarketIdentity,
    date: NaiveDate,
    opts: &FetchOptions,
) -> Result<FetchOutcome> {
    match market.brand {
        Brand::Tinex => paged::fetch(transport, market, config::TINEX_BASE, date, opts),
        Brand::Stokomak => paged::fetch(transport, market, config::STOKOMAK_BASE, date, opts),
        Brand::Kam => kam::fetch(transport, market, date, opts),
        Brand::Vero => vero::fetch(transport, market, date, opts),
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// SHA-256 hex digest over payload parts in order.
pub(crate) fn checksum(parts: &[&[u8]]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    format!("{:x}", hasher.finalize())
}

/// Normalize one HTML table row into a record.
///
/// Four or more cells are read as (code, name, unit, price); exactly three as
/// (name, unit, price) with the code falling back to the name, so comparator
/// matching stays defined for sources that publish no code column.
pub(crate) fn record_from_cells(cells: &[String], date: NaiveDate) -> Option<PriceRecord> {
    let (code, name, unit, price_text) = match cells.len() {
        0..=2 => return None,
        3 => (&cells[0], &cells[0], &cells[1], &cells[2]),
        _ => (&cells[0], &cells[1], &cells[2], &cells[3]),
    };
    if name.is_empty() {
        return None;
    }
    let price = parse_price(price_text).ok()?;
    Some(PriceRecord::new(
        code.clone(),
        name.clone(),
        Some(unit.clone()).filter(|u| !u.is_empty()),
        price,
        date,
    ))
}

/// Escalate to a parse error when more than the allowed fraction of
/// attempted rows was skipped. Near-total failure means the source layout
/// changed, and a partial result would look misleadingly successful.
pub(crate) fn enforce_skip_ratio(
    market: &MarketIdentity,
    parsed: usize,
    skipped: usize,
    threshold: f64,
) -> Result<()> {
    let attempted = parsed + skipped;
    if attempted == 0 {
        return Ok(());
    }
    let ratio = skipped as f64 / attempted as f64;
    if ratio > threshold {
        return Err(ArchiveError::Parse {
            context: market.to_string(),
            reason: format!(
                "{} of {} rows failed to parse (skip ratio {:.2} > {:.2})",
                skipped, attempted, ratio, threshold
            ),
        });
    }
    Ok(())
}
