//! Canonical price record and exact price parsing.
//!
//! Prices are fixed-point with 2 fraction digits. Source sites write them
//! with either `,` or `.` as the decimal separator and often a currency
//! suffix; parsing goes through `rust_decimal` so repeated parse/serialize
//! cycles never drift the way float round-trips would.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::CURRENCY;
use crate::error::{ArchiveError, Result};

// ---------------------------------------------------------------------------
// PriceRecord
// ---------------------------------------------------------------------------

/// One normalized price row from one market on one day.
///
/// `product_code` uniqueness is scoped to a single snapshot, and even there
/// duplicates are preserved rather than deduplicated: brands sometimes list
/// the same code at two shelf positions with different prices, and both must
/// stay visible for audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRecord {
    pub product_code: String,
    pub product_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub price: Decimal,
    pub currency: String,
    pub captured_at: NaiveDate,
}

impl PriceRecord {
    pub fn new(
        product_code: impl Into<String>,
        product_name: impl Into<String>,
        unit: Option<String>,
        price: Decimal,
        captured_at: NaiveDate,
    ) -> Self {
        Self {
            product_code: product_code.into(),
            product_name: product_name.into(),
            unit: unit.filter(|u| !u.is_empty()),
            price,
            currency: CURRENCY.to_string(),
            captured_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Price parsing
// ---------------------------------------------------------------------------

/// Suffixes the source sites append to price cells, longest first so the
/// dotted forms win over their prefixes.
const PRICE_SUFFIXES: [&str; 8] = ["ден.", "ден", "мкд.", "мкд", "den.", "den", "mkd.", "mkd"];

/// Parse a textual price into an exact fixed-point value with 2 fraction
/// digits.
///
/// Accepts `,` or `.` as the decimal separator and tolerates a trailing
/// currency suffix: `"123,45 ден"` and `"123.45"` both parse to `123.45`.
/// Never goes through floating point.
pub fn parse_price(raw: &str) -> Result<Decimal> {
    let mut s = raw.trim().to_lowercase();
    for suffix in PRICE_SUFFIXES {
        if let Some(stripped) = s.strip_suffix(suffix) {
            s = stripped.trim_end().to_string();
            break;
        }
    }
    // Sites use at most one separator; normalize comma to dot.
    let s = s.replace(',', ".").replace(' ', "");
    if s.is_empty() {
        return Err(ArchiveError::Parse {
            context: "price".to_string(),
            reason: format!("empty price in {:?}", raw),
        });
    }
    let mut value = Decimal::from_str(&s).map_err(|e| ArchiveError::Parse {
        context: "price".to_string(),
        reason: format!("{:?}: {}", raw, e),
    })?;
    value.rescale(2);
    Ok(value)
}

/// Render a price the way snapshot CSV files store it: plain decimal,
/// exactly 2 fraction digits.
pub fn format_price(price: &Decimal) -> String {
    let mut p = *price;
    p.rescale(2);
    p.to_string()
}
