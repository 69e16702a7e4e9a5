//! Market catalog resolution and drift detection.
//!
//! Each brand publishes its store list differently: Tinex and Stokomak as an
//! HTML `<select>` of numeric org ids, KAM as a directory of store cards,
//! Vero as a list of static per-market page links. Resolution is idempotent
//! and side-effect-free beyond the network read.
//!
//! A missing structural element (the select, the cards, the link pattern) is
//! `CatalogUnavailable`, never an empty success: a silently-missed markup
//! change would drop markets from every future snapshot.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::config;
use crate::error::{ArchiveError, Result};
use crate::html;
use crate::models::{Brand, CatalogDelta, MarketIdentity};
use crate::transport::Transport;

/// Resolves the current market list per brand. Borrows the shared transport,
/// holds no state of its own.
pub struct MarketCatalog<'t> {
    transport: &'t dyn Transport,
}

impl<'t> MarketCatalog<'t> {
    pub fn new(transport: &'t dyn Transport) -> Self {
        Self { transport }
    }

    /// Resolve the current list of known markets for `brand`.
    pub fn resolve(&self, brand: Brand) -> Result<Vec<MarketIdentity>> {
        let url = config::discovery_url(brand);
        debug!(%brand, url, "resolving market catalog");
        let payload = self
            .transport
            .get(url)
            .map_err(|e| ArchiveError::CatalogUnavailable {
                brand,
                reason: e.to_string(),
            })?;
        let page = payload.text();

        let markets = match brand {
            Brand::Tinex => from_org_select(&page, brand, config::TINEX_BASE)?,
            Brand::Stokomak => from_org_select(&page, brand, config::STOKOMAK_BASE)?,
            Brand::Kam => from_store_cards(&page)?,
            Brand::Vero => from_page_links(&page)?,
        };
        info!(%brand, count = markets.len(), "resolved markets");
        Ok(markets)
    }

    /// Compare two catalog resolutions, matched by `(brand, id)`.
    ///
    /// A market present in both with a different name or address is reported
    /// as renamed (old, new), not as removed-plus-added.
    pub fn diff(previous: &[MarketIdentity], current: &[MarketIdentity]) -> CatalogDelta {
        let mut delta = CatalogDelta::default();
        for cur in current {
            match previous.iter().find(|p| p.key() == cur.key()) {
                None => delta.added.push(cur.clone()),
                Some(prev) if prev.name != cur.name || prev.address != cur.address => {
                    delta.renamed.push((prev.clone(), cur.clone()));
                }
                Some(_) => {}
            }
        }
        for prev in previous {
            if !current.iter().any(|c| c.key() == prev.key()) {
                delta.removed.push(prev.clone());
            }
        }
        delta
    }
}

/// Persist a resolved catalog as one JSON array of market identities.
pub fn save_catalog(path: &Path, markets: &[MarketIdentity]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(markets)?;
    fs::write(path, json)?;
    Ok(())
}

/// Load a previously saved catalog file.
pub fn load_catalog(path: &Path) -> Result<Vec<MarketIdentity>> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

// ---------------------------------------------------------------------------
// Per-brand discovery parsers
// ---------------------------------------------------------------------------

/// Tinex / Stokomak: numeric org ids in `<select name="org">`.
fn from_org_select(page: &str, brand: Brand, base: &str) -> Result<Vec<MarketIdentity>> {
    let options =
        html::select_options(page, "org").ok_or_else(|| ArchiveError::CatalogUnavailable {
            brand,
            reason: "no <select name=\"org\"> on discovery page".to_string(),
        })?;
    Ok(options
        .into_iter()
        .map(|(value, label)| MarketIdentity {
            brand,
            url: format!("{}?org={}&perPage={}", base, value, config::PAGE_SIZE),
            id: value,
            name: label,
            address: None,
        })
        .collect())
}

/// KAM: store cards with a heading, an address paragraph and a page link.
/// The market id is the last path segment of the linked page.
fn from_store_cards(page: &str) -> Result<Vec<MarketIdentity>> {
    let cards = html::blocks_with_class(page, "div", "markets_wrap");
    if cards.is_empty() {
        return Err(ArchiveError::CatalogUnavailable {
            brand: Brand::Kam,
            reason: "no markets_wrap store cards on discovery page".to_string(),
        });
    }
    let mut markets = Vec::new();
    for card in cards {
        let name = html::next_tag_block_ci(card, "<h2", "</h2>", 0)
            .map(|(s, e)| html::block_text(&card[s..e]));
        let address = html::next_tag_block_ci(card, "<p", "</p>", 0)
            .map(|(s, e)| html::block_text(&card[s..e]))
            .filter(|a| !a.is_empty());
        let link = html::first_anchor(card).map(|(href, _)| config::absolutize(config::KAM_BASE, &href));
        if let (Some(name), Some(url)) = (name, link) {
            let id = url
                .trim_end_matches('/')
                .rsplit('/')
                .next()
                .unwrap_or_default()
                .to_string();
            markets.push(MarketIdentity {
                brand: Brand::Kam,
                id,
                name,
                address,
                url,
            });
        }
    }
    Ok(markets)
}

/// Vero: static per-market pages linked as `NN_1.html`.
fn from_page_links(page: &str) -> Result<Vec<MarketIdentity>> {
    let mut markets = Vec::new();
    let mut pos = 0;
    while let Some((start, end)) = html::next_tag_block_ci(page, "<a", "</a>", pos) {
        let block = &page[start..end];
        if let Some((href, text)) = html::first_anchor(block) {
            if href.ends_with(".html") && href.starts_with(|c: char| c.is_ascii_digit()) {
                markets.push(MarketIdentity {
                    brand: Brand::Vero,
                    id: href.trim_end_matches(".html").to_string(),
                    name: text,
                    address: None,
                    url: format!("{}{}", config::VERO_BASE, href),
                });
            }
        }
        pos = end;
    }
    if markets.is_empty() {
        return Err(ArchiveError::CatalogUnavailable {
            brand: Brand::Vero,
            reason: "no per-market page links on discovery page".to_string(),
        });
    }
    Ok(markets)
}
