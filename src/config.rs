use std::path::PathBuf;

use crate::models::Brand;

pub const TINEX_BASE: &str = "http://ceni.tinex.mk/";
pub const STOKOMAK_BASE: &str = "https://stokomak.proverkanaceni.mk/";
pub const KAM_MARKETS_URL: &str = "https://kam.com.mk/ceni-vo-marketi/";
pub const KAM_BASE: &str = "https://kam.com.mk";
pub const VERO_BASE: &str = "https://pricelist.vero.com.mk/";

pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Rows per page on the paginated brand sites.
pub const PAGE_SIZE: usize = 100;

/// Upper bound on page requests per market, against runaway pagination.
pub const MAX_PAGES: usize = 100;

/// A fetch whose row-level parse failures exceed this fraction fails whole.
pub const DEFAULT_SKIP_RATIO: f64 = 0.5;

pub const CURRENCY: &str = "MKD";

/// Discovery page for a brand's market catalog.
pub fn discovery_url(brand: Brand) -> &'static str {
    match brand {
        Brand::Tinex => TINEX_BASE,
        Brand::Stokomak => STOKOMAK_BASE,
        Brand::Kam => KAM_MARKETS_URL,
        Brand::Vero => VERO_BASE,
    }
}

/// Resolve a possibly-relative `href` against a site root.
pub(crate) fn absolutize(base: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else if href.starts_with('/') {
        format!("{}{}", base.trim_end_matches('/'), href)
    } else {
        format!("{}/{}", base.trim_end_matches('/'), href)
    }
}

pub fn default_cache_dir() -> PathBuf {
    if let Some(cache) = dirs::cache_dir() {
        cache.join("ceni-archive")
    } else {
        PathBuf::from(".ceni-archive-cache")
    }
}
