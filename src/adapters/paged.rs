//! Paginated table listing shared by Tinex and Stokomak.
//!
//! Both sites serve the same shape: a `<tbody>` product table reached by
//! repeated page requests with a fixed page size. Pages are requested
//! sequentially; a page with fewer rows than the page size is terminal, and
//! `max_pages` bounds the loop against a server that paginates forever.
//! Rows across pages are concatenated in server order.

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
    base: &str,
    date: NaiveDate,
    opts: &FetchOptions,
) -> Result<FetchOutcome> {
    let mut records = Vec::new();
    let mut skipped = 0usize;
    let mut bodies: Vec<Vec<u8>> = Vec::new();

    let mut page = 1usize;
    loop {
        let url = format!(
            "{}?org={}&page={}&perPage={}",
            base, market.id, page, opts.page_size
        );
        let payload = transport.get(&url)?;
        let text = payload.text();
        bodies.push(payload.body);

        let rows = html::table_rows(&text, "<tbody", "</tbody>")
            .ok_or_else(|| ArchiveError::Parse {
                context: market.to_string(),
                reason: format!("no product table on page {}", page),
            })?;
        // Termination is driven by the raw row count: unparseable rows still
        // fill the page.
        let row_count = rows.len();
        for cells in &rows {
            if cells.is_empty() {
                // Structural row (<th> header), not a data row.
                continue;
            }
            match record_from_cells(cells, date) {
                Some(record) => records.push(record),
                None => skipped += 1,
            }
        }
        debug!(market = %market, page, rows = row_count, "fetched page");

        if row_count < opts.page_size {
            break;
        }
        if page >= opts.max_pages {
            warn!(market = %market, max_pages = opts.max_pages, "hit pagination safety bound");
            break;
        }
        page += 1;
    }

    enforce_skip_ratio(market, records.len(), skipped, opts.skip_ratio_threshold)?;
    if skipped > 0 {
        warn!(market = %market, skipped, "skipped unparseable rows");
    }

    let parts: Vec<&[u8]> = bodies.iter().map(|b| b.as_slice()).collect();
    Ok(FetchOutcome {
        records,
        source_checksum: checksum(&parts),
        skipped_rows: skipped,
        pages_fetched: page,
    })
}
