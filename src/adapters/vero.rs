//! Vero adapter: one static per-market page, one table, no pagination.

use chrono::NaiveDate;
use tracing::{debug, warn};

use super::{checksum, enforce_skip_ratio, record_from_cells, FetchOptions, FetchOutcome};
use crate::error::{ArchiveError, Result};
use crate::html;
use crate::models::MarketIdentity;
use crate::transport::Transport;

pub fn fetch(
    transport: &dyn Transport,
    market: &MarketIdentity,
    date: NaiveDate,
    opts: &FetchOptions,
) -> Result<FetchOutcome> {
    let payload = transport.get(&market.url)?;
    let text = payload.text();

    let rows = html::table_rows(&text, "<table", "</table>").ok_or_else(|| ArchiveError::Parse {
        context: market.to_string(),
        reason: "no price table on market page".to_string(),
    })?;

    let mut records = Vec::new();
    let mut skipped = 0usize;
    for cells in &rows {
        if cells.is_empty() {
            continue;
        }
        match record_from_cells(cells, date) {
            Some(record) => records.push(record),
            None => skipped += 1,
        }
    }
    debug!(market = %market, rows = records.len(), skipped, "parsed market page");

    enforce_skip_ratio(market, records.len(), skipped, opts.skip_ratio_threshold)?;
    if skipped > 0 {
        warn!(market = %market, skipped, "skipped unparseable rows");
    }

    Ok(FetchOutcome {
        records,
        source_checksum: checksum(&[&payload.body]),
        skipped_rows: skipped,
        pages_fetched: 1,
    })
}
