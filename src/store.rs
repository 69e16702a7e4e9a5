//! Dated, append-only snapshot storage.
//!
//! Layout on disk, stable across implementations:
//!
//! ```text
//! {root}/{date}/{brand}_{marketId}.csv    # the records, UTF-8, header row
//! {root}/{date}/{brand}_{marketId}.json   # manifest: identity, fetchedAt, checksum
//! ```
//!
//! At most one snapshot exists per `(date, brand, market id)` and nothing
//! here mutates or deletes one once written: a run must never overwrite a
//! prior day's evidence. The manifest is created with `create_new`, so two
//! concurrent writers for the same key serialize on the filesystem: the
//! first wins, the second gets `DuplicateSnapshot`. Records land in a temp
//! file first and are renamed into place, so an interrupted write never
//! leaves a partial snapshot behind.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ArchiveError, Result};
use crate::models::{format_price, parse_price, Brand, MarketIdentity, PriceRecord, Snapshot};

const CSV_HEADER: [&str; 5] = ["productCode", "productName", "unit", "price", "currency"];

/// Snapshot metadata stored beside the record CSV, since it is not a price row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Manifest {
    date: NaiveDate,
    market: MarketIdentity,
    fetched_at: chrono::DateTime<chrono::Utc>,
    source_checksum: String,
    record_count: usize,
}

/// Filesystem-backed snapshot store rooted at one cache directory.
pub struct SnapshotStore {
    root: PathBuf,
}

impl SnapshotStore {
    /// Open (and create if needed) a store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn csv_path(&self, date: NaiveDate, brand: Brand, market_id: &str) -> PathBuf {
        self.root
            .join(date.to_string())
            .join(format!("{}_{}.csv", brand.slug(), market_id))
    }

    fn manifest_path(&self, date: NaiveDate, brand: Brand, market_id: &str) -> PathBuf {
        self.root
            .join(date.to_string())
            .join(format!("{}_{}.json", brand.slug(), market_id))
    }

    /// Persist a snapshot. Fails with `DuplicateSnapshot` if one already
    /// exists for the same `(date, brand, market id)`; the existing files
    /// are left untouched.
    pub fn write(&self, snapshot: &Snapshot) -> Result<()> {
        let brand = snapshot.market.brand;
        let market_id = &snapshot.market.id;
        let dir = self.root.join(snapshot.date.to_string());
        fs::create_dir_all(&dir)?;

        let manifest_path = self.manifest_path(snapshot.date, brand, market_id);
        let csv_path = self.csv_path(snapshot.date, brand, market_id);

        // Claiming the manifest with create_new is the serialization point:
        // first writer wins.
        let manifest_file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&manifest_path)
            .map_err(|e| {
                if e.kind() == ErrorKind::AlreadyExists {
                    ArchiveError::DuplicateSnapshot {
                        date: snapshot.date,
                        brand,
                        market_id: market_id.clone(),
                    }
                } else {
                    ArchiveError::Io(e)
                }
            })?;

        let result = (|| -> Result<()> {
            let manifest = Manifest {
                date: snapshot.date,
                market: snapshot.market.clone(),
                fetched_at: snapshot.fetched_at,
                source_checksum: snapshot.source_checksum.clone(),
                record_count: snapshot.records.len(),
            };
            serde_json::to_writer_pretty(&manifest_file, &manifest)?;
            manifest_file.sync_all()?;

            let tmp_path = csv_path.with_extension("csv.tmp");
            write_records_csv(&tmp_path, &snapshot.records)?;
            fs::rename(&tmp_path, &csv_path)?;
            Ok(())
        })();

        if result.is_err() {
            // Roll the claim back so a later run can retry cleanly.
            let _ = fs::remove_file(&manifest_path);
            let _ = fs::remove_file(csv_path.with_extension("csv.tmp"));
        } else {
            info!(
                date = %snapshot.date, market = %snapshot.market,
                records = snapshot.records.len(), "snapshot written"
            );
        }
        result
    }

    /// Read the snapshot for an exact key. `SnapshotNotFound` when absent.
    pub fn read(&self, date: NaiveDate, brand: Brand, market_id: &str) -> Result<Snapshot> {
        let manifest_path = self.manifest_path(date, brand, market_id);
        let csv_path = self.csv_path(date, brand, market_id);
        if !manifest_path.exists() || !csv_path.exists() {
            return Err(ArchiveError::SnapshotNotFound {
                date,
                brand,
                market_id: market_id.to_string(),
            });
        }
        let manifest: Manifest = serde_json::from_str(&fs::read_to_string(&manifest_path)?)?;
        let records = read_records_csv(&csv_path, date)?;
        Ok(Snapshot {
            date,
            market: manifest.market,
            records,
            fetched_at: manifest.fetched_at,
            source_checksum: manifest.source_checksum,
        })
    }

    /// The newest snapshot strictly before `date`, or `None`. Days with no
    /// snapshot for this market are skipped, so a source being down one day
    /// does not break the next day's comparison baseline.
    pub fn latest_before(
        &self,
        date: NaiveDate,
        brand: Brand,
        market_id: &str,
    ) -> Result<Option<Snapshot>> {
        let candidate = self
            .snapshot_dates(brand, market_id)?
            .filter(|d| *d < date)
            .max();
        match candidate {
            Some(d) => self.read(d, brand, market_id).map(Some),
            None => Ok(None),
        }
    }

    /// Dates for which a snapshot of this market exists, ascending.
    ///
    /// Lazy per item: date directories are listed once, but each date's
    /// snapshot presence is checked only as the iterator advances.
    pub fn list(
        &self,
        brand: Brand,
        market_id: &str,
    ) -> Result<impl Iterator<Item = NaiveDate> + '_> {
        let mut dates = self.date_dirs()?;
        dates.sort_unstable();
        let market_id = market_id.to_string();
        Ok(dates
            .into_iter()
            .filter(move |d| self.csv_path(*d, brand, &market_id).exists()))
    }

    fn snapshot_dates(&self, brand: Brand, market_id: &str) -> Result<impl Iterator<Item = NaiveDate>> {
        let dates = self.date_dirs()?;
        let store_root = self.root.clone();
        let market_id = market_id.to_string();
        Ok(dates.into_iter().filter(move |d| {
            store_root
                .join(d.to_string())
                .join(format!("{}_{}.csv", brand.slug(), market_id))
                .exists()
        }))
    }

    /// All date-named directories under the root, unordered.
    fn date_dirs(&self) -> Result<Vec<NaiveDate>> {
        let mut dates = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if let Ok(date) = name.parse::<NaiveDate>() {
                    dates.push(date);
                }
            }
        }
        Ok(dates)
    }
}

// ---------------------------------------------------------------------------
// CSV record I/O
// ---------------------------------------------------------------------------

fn write_records_csv(path: &Path, records: &[PriceRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(CSV_HEADER)?;
    for record in records {
        writer.write_record([
            record.product_code.as_str(),
            record.product_name.as_str(),
            record.unit.as_deref().unwrap_or(""),
            &format_price(&record.price),
            record.currency.as_str(),
        ])?;
    }
    writer.flush().map_err(ArchiveError::Io)?;
    Ok(())
}

fn read_records_csv(path: &Path, captured_at: NaiveDate) -> Result<Vec<PriceRecord>> {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_path(path)?;
    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let get = |i: usize| row.get(i).unwrap_or("").to_string();
        let price = parse_price(&get(3))?;
        records.push(PriceRecord {
            product_code: get(0),
            product_name: get(1),
            unit: Some(get(2)).filter(|u| !u.is_empty()),
            price,
            currency: get(4),
            captured_at,
        });
    }
    Ok(records)
}
