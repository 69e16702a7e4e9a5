use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Brand: one supermarket chain source
// ---------------------------------------------------------------------------

/// The supermarket chains this archive knows how to scrape. Closed set:
/// adapter and catalog dispatch match exhaustively on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Brand {
    #[serde(rename = "KAM")]
    Kam,
    Tinex,
    Vero,
    Stokomak,
}

impl Brand {
    pub const ALL: [Brand; 4] = [Brand::Kam, Brand::Tinex, Brand::Vero, Brand::Stokomak];

    /// Lowercase token used in snapshot file names.
    pub fn slug(&self) -> &'static str {
        match self {
            Brand::Kam => "kam",
            Brand::Tinex => "tinex",
            Brand::Vero => "vero",
            Brand::Stokomak => "stokomak",
        }
    }
}

impl fmt::Display for Brand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Brand::Kam => "KAM",
            Brand::Tinex => "Tinex",
            Brand::Vero => "Vero",
            Brand::Stokomak => "Stokomak",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Brand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "kam" => Ok(Brand::Kam),
            "tinex" => Ok(Brand::Tinex),
            "vero" => Ok(Brand::Vero),
            "stokomak" => Ok(Brand::Stokomak),
            other => Err(format!("unknown brand: {}", other)),
        }
    }
}

// ---------------------------------------------------------------------------
// MarketIdentity: one physical store location published by a brand
// ---------------------------------------------------------------------------

/// Identity of one market as resolved from a brand's discovery page.
///
/// `id` is brand-scoped; global identity is the pair `(brand, id)`. Once a
/// snapshot is written this identity travels with it unchanged, even if the
/// catalog later renames the market.
///
/// Field names match the public catalog JSON: `{brand, id, name, address?, url}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketIdentity {
    pub brand: Brand,
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub url: String,
}

impl MarketIdentity {
    /// The `(brand, id)` pair used for matching across catalog resolutions
    /// and as the snapshot key.
    pub fn key(&self) -> (Brand, &str) {
        (self.brand, &self.id)
    }
}

impl fmt::Display for MarketIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.brand, self.id, self.name)
    }
}

// ---------------------------------------------------------------------------
// CatalogDelta: drift between two catalog resolutions
// ---------------------------------------------------------------------------

/// Transient result of comparing two catalog resolutions. Not persisted.
///
/// A market present in both with a changed `name` or `address` is reported
/// as renamed, not as removed-plus-added.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CatalogDelta {
    pub added: Vec<MarketIdentity>,
    pub removed: Vec<MarketIdentity>,
    pub renamed: Vec<(MarketIdentity, MarketIdentity)>,
}

impl CatalogDelta {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.renamed.is_empty()
    }
}
