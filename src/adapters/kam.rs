//! KAM adapter: the market page links a price-sheet document; its tabular
//! text is parsed line by line into product/price rows.
//!
//! Sheet layouts vary between markets and change without notice, so row
//! parsing is tolerant: a line that fails to parse as (text, price) is
//! skipped and counted, and only a skip ratio past the configured threshold
//! fails the whole fetch. Near-total failure means the sheet's internal
//! layout changed and a partial result would be misleading.

use chrono::NaiveDate;
use tracing::{debug, warn};

use super::{checksum, enforce_skip_ratio, FetchOptions, FetchOutcome};
use crate::config;
use crate::error::{ArchiveError, Result};
use crate::html;
use crate::models::{parse_price, MarketIdentity, PriceRecord};
use crate::transport::Transport;

/// Header/footer phrases that mark non-data lines in the sheets.
const STRUCTURAL_TERMS: [&str; 7] = [
    "артикл",
    "производ",
    "име",
    "цена",
    "страна",
    "цени во маркети",
    "важи до",
];

/// Unit words the sheets append after the product name.
const UNIT_WORDS: [&str; 12] = [
    "кг", "kg", "г", "g", "л", "l", "мл", "ml", "бр", "br", "пак", "пар",
];

pub fn fetch(
    transport: &dyn Transport,
    market: &MarketIdentity,
    date: NaiveDate,
    opts: &FetchOptions,
) -> Result<FetchOutcome> {
    let page = transport.get(&market.url)?;
    let sheet_url = find_sheet_url(&page.text()).ok_or_else(|| ArchiveError::Parse {
        context: market.to_string(),
        reason: "no linked price sheet on market page".to_string(),
    })?;
    debug!(market = %market, sheet_url, "fetching price sheet");

    let sheet = transport.get(&sheet_url)?;
    let (records, skipped) = parse_sheet(&sheet.text(), date);

    enforce_skip_ratio(market, records.len(), skipped, opts.skip_ratio_threshold)?;
    if skipped > 0 {
        warn!(market = %market, skipped, "skipped unparseable sheet rows");
    }

    Ok(FetchOutcome {
        records,
        source_checksum: checksum(&[&sheet.body]),
        skipped_rows: skipped,
        pages_fetched: 2,
    })
}

/// Locate the linked price-sheet document on a market page. Links in the
/// `/pdf/{n}.pdf` form win; any other `.pdf` link is the fallback. The
/// result is absolutized against the KAM site root.
fn find_sheet_url(page: &str) -> Option<String> {
    let hrefs = html::anchor_hrefs(page);
    let preferred = hrefs.iter().find(|h| {
        let lc = h.to_ascii_lowercase();
        lc.ends_with(".pdf") && lc.contains("pdf/") && sheet_stem_is_numeric(&lc)
    });
    let href = preferred.or_else(|| {
        hrefs
            .iter()
            .find(|h| h.to_ascii_lowercase().ends_with(".pdf"))
    })?;
    Some(config::absolutize(config::KAM_BASE, href))
}

fn sheet_stem_is_numeric(href: &str) -> bool {
    href.trim_end_matches(".pdf")
        .rsplit('/')
        .next()
        .map(|stem| !stem.is_empty() && stem.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(false)
}

enum SheetLine {
    Row(PriceRecord),
    Skipped,
    Structural,
}

/// Parse the sheet's tabular text. Returns the records in sheet order plus
/// the count of data lines that failed to parse.
fn parse_sheet(text: &str, date: NaiveDate) -> (Vec<PriceRecord>, usize) {
    let mut records = Vec::new();
    let mut skipped = 0usize;
    for line in text.lines() {
        match parse_sheet_line(line, date) {
            SheetLine::Row(record) => records.push(record),
            SheetLine::Skipped => skipped += 1,
            SheetLine::Structural => {}
        }
    }
    (records, skipped)
}

fn parse_sheet_line(line: &str, date: NaiveDate) -> SheetLine {
    let line = line.trim();
    if line.len() < 5 {
        return SheetLine::Structural;
    }
    let lc = line.to_lowercase();
    if STRUCTURAL_TERMS.iter().any(|t| lc.contains(t)) {
        return SheetLine::Structural;
    }
    // Lines with no digits are prose, not failed rows.
    if !line.chars().any(|c| c.is_ascii_digit()) {
        return SheetLine::Structural;
    }

    // A data row ends in "<price> ден"-style text.
    let Some(without_suffix) = strip_price_suffix(line) else {
        return SheetLine::Skipped;
    };
    let Some((name_part, price_text)) = without_suffix.rsplit_once(char::is_whitespace) else {
        return SheetLine::Skipped;
    };
    let Ok(price) = parse_price(price_text) else {
        return SheetLine::Skipped;
    };

    let (name, unit) = split_trailing_unit(name_part.trim());
    if name.len() <= 2 || name.chars().all(|c| c.is_ascii_digit()) {
        return SheetLine::Skipped;
    }
    // The sheets publish no product code; the normalized name is the
    // stable identity the comparator keys on.
    SheetLine::Row(PriceRecord::new(name.clone(), name, unit, price, date))
}

/// Strip a trailing currency marker, returning the line without it, or
/// `None` when the line carries no price marker at all.
fn strip_price_suffix(line: &str) -> Option<&str> {
    let lc = line.to_lowercase();
    for suffix in ["ден.", "ден", "den", "мкд", "mkd"] {
        if lc.ends_with(suffix) {
            return Some(line[..line.len() - suffix.len()].trim_end());
        }
    }
    None
}

/// Split a trailing unit off the product text: either a bare unit word
/// (`"кг"`) or a quantity plus unit (`"1 кг"`, `"500 мл"`).
fn split_trailing_unit(text: &str) -> (String, Option<String>) {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let is_unit = |tok: &str| {
        let t = tok.to_lowercase();
        UNIT_WORDS.contains(&t.trim_end_matches('.'))
    };
    let is_quantity = |tok: &str| {
        !tok.is_empty() && tok.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',')
    };

    if let Some(last) = tokens.last() {
        if is_unit(last) {
            let take = if tokens.len() >= 2 && is_quantity(tokens[tokens.len() - 2]) {
                2
            } else {
                1
            };
            let name = tokens[..tokens.len() - take].join(" ");
            let unit = tokens[tokens.len() - take..].join(" ");
            if !name.is_empty() {
                return (name, Some(unit));
            }
        }
    }
    (tokens.join(" "), None)
}
