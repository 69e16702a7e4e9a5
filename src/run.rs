//! Daily run orchestration.
//!
//! Per brand the pipeline is: resolve catalog -> fetch/parse per market ->
//! snapshot write -> optional comparison against the previous snapshot.
//! Markets are independent, so fetches run on a bounded worker pool across
//! all `(brand, market)` pairs with no ordering guarantee between markets;
//! within one market the pipeline is strict. One failed market is recorded
//! and skipped; a failed catalog fails its brand; nothing aborts the run.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::adapters::{self, FetchOptions};
use crate::catalog::MarketCatalog;
use crate::compare;
use crate::error::Result;
use crate::models::{Brand, ComparisonResult, MarketIdentity, Snapshot};
use crate::store::SnapshotStore;
use crate::transport::Transport;

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BrandStatus {
    /// Every market snapshotted.
    Complete,
    /// At least one market snapshotted, at least one failed.
    Partial,
    /// Catalog unavailable, or every market failed.
    Failed,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum MarketResult {
    #[serde(rename = "ok")]
    Snapshotted {
        records: usize,
        skipped_rows: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        comparison: Option<ComparisonResult>,
    },
    #[serde(rename = "failed")]
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketOutcome {
    pub market: MarketIdentity,
    #[serde(flatten)]
    pub result: MarketResult,
}

impl MarketOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self.result, MarketResult::Snapshotted { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandReport {
    pub brand: Brand,
    pub status: BrandStatus,
    pub markets: Vec<MarketOutcome>,
    /// Brand-level failure reason (catalog unavailable), if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub date: NaiveDate,
    pub brands: Vec<BrandReport>,
}

impl RunReport {
    /// The run as a whole succeeds if at least one market anywhere
    /// snapshotted; partial success is normal and expected.
    pub fn succeeded(&self) -> bool {
        self.brands
            .iter()
            .any(|b| b.markets.iter().any(MarketOutcome::is_ok))
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Bound on concurrent market fetches, to respect source-site load.
    pub workers: usize,
    /// Restrict the run to these brands; `None` runs all of them.
    pub brands: Option<Vec<Brand>>,
    /// Diff each new snapshot against the market's most recent prior one.
    pub compare_with_previous: bool,
    pub fetch: FetchOptions,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            workers: 4,
            brands: None,
            compare_with_previous: false,
            fetch: FetchOptions::default(),
        }
    }
}

pub struct RunOrchestrator<'a> {
    transport: &'a dyn Transport,
    store: &'a SnapshotStore,
    options: RunOptions,
}

impl<'a> RunOrchestrator<'a> {
    pub fn new(transport: &'a dyn Transport, store: &'a SnapshotStore, options: RunOptions) -> Self {
        Self {
            transport,
            store,
            options,
        }
    }

    /// Execute one dated run across the selected brands.
    pub fn run(&self, date: NaiveDate) -> RunReport {
        let brands: Vec<Brand> = match &self.options.brands {
            Some(filter) => filter.clone(),
            None => Brand::ALL.to_vec(),
        };

        // Resolve catalogs brand by brand; a brand whose discovery page is
        // unreachable or changed shape fails alone.
        let catalog = MarketCatalog::new(self.transport);
        let mut reports = Vec::with_capacity(brands.len());
        let mut work: Vec<(usize, MarketIdentity)> = Vec::new();
        for (idx, brand) in brands.iter().enumerate() {
            match catalog.resolve(*brand) {
                Ok(markets) => {
                    for market in &markets {
                        work.push((idx, market.clone()));
                    }
                    reports.push(BrandReport {
                        brand: *brand,
                        status: BrandStatus::Complete,
                        markets: Vec::with_capacity(markets.len()),
                        error: None,
                    });
                }
                Err(e) => {
                    warn!(%brand, error = %e, "catalog resolution failed");
                    reports.push(BrandReport {
                        brand: *brand,
                        status: BrandStatus::Failed,
                        markets: Vec::new(),
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        for outcome in self.fetch_all(date, &work) {
            let (brand_idx, outcome) = outcome;
            reports[brand_idx].markets.push(outcome);
        }

        for report in &mut reports {
            if report.error.is_some() {
                continue;
            }
            let ok = report.markets.iter().filter(|m| m.is_ok()).count();
            let failed = report.markets.len() - ok;
            report.status = match (ok, failed) {
                (_, 0) => BrandStatus::Complete,
                (0, _) => BrandStatus::Failed,
                _ => BrandStatus::Partial,
            };
        }

        let report = RunReport {
            date,
            brands: reports,
        };
        info!(
            %date,
            succeeded = report.succeeded(),
            markets = report.brands.iter().map(|b| b.markets.len()).sum::<usize>(),
            "run finished"
        );
        report
    }

    /// Fetch and snapshot every market over the worker pool. Workers pull
    /// work items through a shared cursor and report back on a channel;
    /// results arrive in completion order.
    fn fetch_all(
        &self,
        date: NaiveDate,
        work: &[(usize, MarketIdentity)],
    ) -> Vec<(usize, MarketOutcome)> {
        if work.is_empty() {
            return Vec::new();
        }
        let workers = self.options.workers.clamp(1, work.len());
        let cursor = AtomicUsize::new(0);
        let (tx, rx) = mpsc::channel::<(usize, MarketOutcome)>();

        thread::scope(|scope| {
            for _ in 0..workers {
                let tx = tx.clone();
                let cursor = &cursor;
                scope.spawn(move || loop {
                    let i = cursor.fetch_add(1, Ordering::Relaxed);
                    let Some((brand_idx, market)) = work.get(i) else {
                        break;
                    };
                    let result = match self.process_market(date, market) {
                        Ok(result) => result,
                        Err(e) => {
                            warn!(market = %market, error = %e, "market failed");
                            MarketResult::Failed {
                                error: e.to_string(),
                            }
                        }
                    };
                    let outcome = MarketOutcome {
                        market: market.clone(),
                        result,
                    };
                    if tx.send((*brand_idx, outcome)).is_err() {
                        break;
                    }
                });
            }
            drop(tx);
            rx.iter().collect()
        })
    }

    /// Strict per-market pipeline: fetch/parse, then snapshot write, then
    /// optionally a comparison against the previous snapshot. Any error
    /// fails this market only; `DuplicateSnapshot` is never swallowed.
    fn process_market(&self, date: NaiveDate, market: &MarketIdentity) -> Result<MarketResult> {
        let outcome = adapters::fetch(self.transport, market, date, &self.options.fetch)?;
        let snapshot = Snapshot {
            date,
            market: market.clone(),
            records: outcome.records,
            fetched_at: Utc::now(),
            source_checksum: outcome.source_checksum,
        };
        self.store.write(&snapshot)?;

        let comparison = if self.options.compare_with_previous {
            match self.store.latest_before(date, market.brand, &market.id)? {
                Some(previous) => Some(compare::diff(&previous, &snapshot)),
                None => None,
            }
        } else {
            None
        };

        Ok(MarketResult::Snapshotted {
            records: snapshot.records.len(),
            skipped_rows: outcome.skipped_rows,
            comparison,
        })
    }
}
