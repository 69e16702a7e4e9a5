//! Shared fixtures: a canned transport and small HTML payload builders
//! shaped like the brand sites' markup.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use ceni_archive::{ArchiveError, Brand, MarketIdentity, Payload, PriceRecord, Snapshot, Transport};
use chrono::NaiveDate;
use rust_decimal::Decimal;

// ---------------------------------------------------------------------------
// MockTransport
// ---------------------------------------------------------------------------

/// Canned transport: URLs map to fixed payloads, anything else is a fetch
/// error. Records every requested URL so tests can assert request counts.
pub struct MockTransport {
    responses: HashMap<String, Vec<u8>>,
    requests: Mutex<Vec<String>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            responses: HashMap::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_page(mut self, url: &str, body: impl Into<Vec<u8>>) -> Self {
        self.responses.insert(url.to_string(), body.into());
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl Transport for MockTransport {
    fn get(&self, url: &str) -> ceni_archive::Result<Payload> {
        self.requests.lock().unwrap().push(url.to_string());
        match self.responses.get(url) {
            Some(body) => Ok(Payload {
                status: 200,
                body: body.clone(),
            }),
            None => Err(ArchiveError::Fetch {
                url: url.to_string(),
                reason: "connection refused".to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// HTML payload builders
// ---------------------------------------------------------------------------

/// Discovery page for Tinex/Stokomak: a `<select name="org">` of markets.
pub fn org_select_page(options: &[(&str, &str)]) -> String {
    let mut html = String::from("<html><body><form><select name=\"org\">\n");
    html.push_str("<option value=\"\">Избери маркет</option>\n");
    for (value, label) in options {
        html.push_str(&format!("<option value=\"{}\">{}</option>\n", value, label));
    }
    html.push_str("</select></form></body></html>");
    html
}

/// Paginated product table page: `<tbody>` rows of (code, name, unit, price).
pub fn product_table_page(rows: &[(&str, &str, &str, &str)]) -> String {
    let mut html = String::from("<html><body><table class=\"table\"><tbody>\n");
    for (code, name, unit, price) in rows {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            code, name, unit, price
        ));
    }
    html.push_str("</tbody></table></body></html>");
    html
}

/// Vero static market page: one table, `<th>` header row, 3-column rows.
pub fn vero_market_page(rows: &[(&str, &str, &str)]) -> String {
    let mut html = String::from(
        "<html><body><table>\n<tr><th>Производ</th><th>ЕМ</th><th>Цена</th></tr>\n",
    );
    for (name, unit, price) in rows {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            name, unit, price
        ));
    }
    html.push_str("</table></body></html>");
    html
}

/// KAM discovery page: store cards with heading, address and page link.
pub fn kam_markets_page(cards: &[(&str, &str, &str)]) -> String {
    let mut html = String::from("<html><body>\n");
    for (name, address, href) in cards {
        html.push_str(&format!(
            "<div class=\"markets_wrap\"><h2>{}</h2><p>{}</p>\
             <a href=\"{}\">Погледни цени</a></div>\n",
            name, address, href
        ));
    }
    html.push_str("</body></html>");
    html
}

/// KAM market page linking a price sheet.
pub fn kam_market_page(sheet_href: &str) -> String {
    format!(
        "<html><body><h1>Цени во маркети</h1>\
         <a href=\"{}\">Преземи ценовник</a></body></html>",
        sheet_href
    )
}

// ---------------------------------------------------------------------------
// Model builders
// ---------------------------------------------------------------------------

pub fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

pub fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

pub fn market(brand: Brand, id: &str, name: &str) -> MarketIdentity {
    MarketIdentity {
        brand,
        id: id.to_string(),
        name: name.to_string(),
        address: None,
        url: format!("https://example.test/{}", id),
    }
}

pub fn record(code: &str, name: &str, price: &str, day: &str) -> PriceRecord {
    PriceRecord::new(code, name, Some("кг".to_string()), dec(price), date(day))
}

pub fn snapshot(
    market_identity: MarketIdentity,
    day: &str,
    checksum: &str,
    records: Vec<PriceRecord>,
) -> Snapshot {
    Snapshot {
        date: date(day),
        market: market_identity,
        records,
        fetched_at: chrono::Utc::now(),
        source_checksum: checksum.to_string(),
    }
}
