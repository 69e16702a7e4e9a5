//! Daily price archive for Macedonian supermarket chains.
//!
//! Resolves each brand's market catalog, fetches and parses every market's
//! published price listing into a common record shape, and persists one
//! immutable dated snapshot per market so that day-over-day and
//! market-over-market comparisons stay well-defined even as source formats
//! and market catalogs drift.
//!
//! # Quick start
//!
//! ```no_run
//! use ceni_archive::PriceArchive;
//!
//! let archive = PriceArchive::builder().build().unwrap();
//!
//! // Snapshot every brand's markets for today.
//! let report = archive.run(chrono::Utc::now().date_naive());
//! assert!(report.succeeded());
//!
//! // Compare one market day over day.
//! let diff = archive
//!     .compare(
//!         "2025-04-19".parse().unwrap(),
//!         "2025-04-20".parse().unwrap(),
//!         ceni_archive::Brand::Tinex,
//!         "4",
//!     )
//!     .unwrap();
//! println!("{} price changes", diff.changed.len());
//! ```

pub mod adapters;
pub mod catalog;
pub mod compare;
pub mod config;
pub mod error;
pub mod html;
pub mod models;
pub mod run;
pub mod store;
pub mod transport;

pub use adapters::{FetchOptions, FetchOutcome};
pub use catalog::MarketCatalog;
pub use error::{ArchiveError, Result};
pub use models::{
    Brand, CatalogDelta, ComparisonResult, MarketIdentity, PriceChange, PriceRecord, Snapshot,
};
pub use run::{BrandReport, BrandStatus, MarketOutcome, MarketResult, RunOptions, RunReport};
pub use store::SnapshotStore;
pub use transport::{HttpTransport, Payload, Transport};

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;

// ---------------------------------------------------------------------------
// PriceArchiveBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing a [`PriceArchive`].
pub struct PriceArchiveBuilder {
    cache_dir: Option<PathBuf>,
    timeout: Duration,
    run_options: RunOptions,
}

impl Default for PriceArchiveBuilder {
    fn default() -> Self {
        Self {
            cache_dir: None,
            timeout: Duration::from_secs(15),
            run_options: RunOptions::default(),
        }
    }
}

impl PriceArchiveBuilder {
    /// Root directory for snapshot storage. Defaults to the platform cache
    /// directory (e.g. `~/.cache/ceni-archive` on Linux).
    pub fn cache_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.cache_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// HTTP request timeout. Defaults to 15 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Bound on concurrent market fetches. Defaults to 4.
    pub fn workers(mut self, workers: usize) -> Self {
        self.run_options.workers = workers.max(1);
        self
    }

    /// Restrict runs to the given brands.
    pub fn brands(mut self, brands: Vec<Brand>) -> Self {
        self.run_options.brands = Some(brands);
        self
    }

    /// Attach a comparison against the previous snapshot to each market
    /// result. Defaults to off.
    pub fn compare_with_previous(mut self, enabled: bool) -> Self {
        self.run_options.compare_with_previous = enabled;
        self
    }

    /// Adapter tunables (page size, pagination cap, skip-ratio threshold).
    pub fn fetch_options(mut self, fetch: FetchOptions) -> Self {
        self.run_options.fetch = fetch;
        self
    }

    /// Build the archive, creating the cache directory and HTTP client.
    pub fn build(self) -> Result<PriceArchive> {
        let root = self.cache_dir.unwrap_or_else(config::default_cache_dir);
        let store = SnapshotStore::new(root)?;
        let transport = HttpTransport::new(self.timeout)?;
        Ok(PriceArchive {
            transport,
            store,
            run_options: self.run_options,
        })
    }
}

// ---------------------------------------------------------------------------
// PriceArchive
// ---------------------------------------------------------------------------

/// The main entry point: owns the HTTP transport and the snapshot store, and
/// exposes catalog resolution, dated runs, history listing and comparisons.
pub struct PriceArchive {
    transport: HttpTransport,
    store: SnapshotStore,
    run_options: RunOptions,
}

impl PriceArchive {
    pub fn builder() -> PriceArchiveBuilder {
        PriceArchiveBuilder::default()
    }

    /// Resolve the current market catalog for one brand.
    pub fn resolve_catalog(&self, brand: Brand) -> Result<Vec<MarketIdentity>> {
        MarketCatalog::new(&self.transport).resolve(brand)
    }

    /// Execute one dated run: catalog resolution, per-market fetch and
    /// snapshot write, with partial-failure semantics per market and brand.
    pub fn run(&self, date: NaiveDate) -> RunReport {
        run::RunOrchestrator::new(&self.transport, &self.store, self.run_options.clone()).run(date)
    }

    /// Read one persisted snapshot.
    pub fn snapshot(&self, date: NaiveDate, brand: Brand, market_id: &str) -> Result<Snapshot> {
        self.store.read(date, brand, market_id)
    }

    /// Diff two persisted snapshots of the same market.
    pub fn compare(
        &self,
        from_date: NaiveDate,
        to_date: NaiveDate,
        brand: Brand,
        market_id: &str,
    ) -> Result<ComparisonResult> {
        let from = self.store.read(from_date, brand, market_id)?;
        let to = self.store.read(to_date, brand, market_id)?;
        Ok(compare::diff(&from, &to))
    }

    /// Dates with a snapshot of the given market, ascending.
    pub fn history(
        &self,
        brand: Brand,
        market_id: &str,
    ) -> Result<impl Iterator<Item = NaiveDate> + '_> {
        self.store.list(brand, market_id)
    }

    /// The underlying snapshot store, for callers composing their own flows.
    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }
}
