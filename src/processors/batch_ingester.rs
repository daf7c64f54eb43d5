use crate::error::Result;
use crate::models::document::{identity_key, merge_into};
use crate::models::{Document, Keyed};
use crate::readers::{DecodedBatch, ObservationReader, StationReader};
use crate::store::StoreGateway;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IngestMode {
    /// Stage every record for insertion without looking anything up.
    InsertOnly,
    /// Merge into an existing document with the same identity, insert otherwise.
    #[default]
    Upsert,
}

/// How a dry run counts records that already exist in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DryRunAccounting {
    /// Count exactly what a live run would do.
    #[default]
    MatchLive,
    /// Count every record as a new insert, even when a match exists. Kept for
    /// parity with the legacy loader; its update count is always zero.
    TreatAllAsNew,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    pub inserted: usize,
    pub updated: usize,
    pub skipped: usize,
}

impl IngestSummary {
    pub fn add(&mut self, other: &IngestSummary) {
        self.inserted += other.inserted;
        self.updated += other.updated;
        self.skipped += other.skipped;
    }
}

impl std::fmt::Display for IngestSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} new, {} updated, {} skipped",
            self.inserted, self.updated, self.skipped
        )
    }
}

/// Loads decoded records into the store, one batch per source file.
#[derive(Debug, Clone)]
pub struct BatchIngester {
    gateway: StoreGateway,
    dry_run: bool,
    dry_run_accounting: DryRunAccounting,
}

impl BatchIngester {
    pub fn new(gateway: StoreGateway) -> Self {
        Self {
            gateway,
            dry_run: false,
            dry_run_accounting: DryRunAccounting::default(),
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_dry_run_accounting(mut self, accounting: DryRunAccounting) -> Self {
        self.dry_run_accounting = accounting;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn ingest_observation_file(&self, path: &Path, mode: IngestMode) -> Result<IngestSummary> {
        let batch = ObservationReader::new().read_observations(path)?;
        let summary = self.ingest_batch(batch, mode)?;
        info!(file = %path.display(), %summary, dry_run = self.dry_run, "observations ingested");
        Ok(summary)
    }

    pub fn ingest_station_file(&self, path: &Path, mode: IngestMode) -> Result<IngestSummary> {
        let batch = StationReader::new().read_stations(path)?;
        let summary = self.ingest_batch(batch, mode)?;
        info!(file = %path.display(), %summary, dry_run = self.dry_run, "stations ingested");
        Ok(summary)
    }

    /// Ingest a decoded batch, carrying its skipped-row count into the summary.
    pub fn ingest_batch<T: Keyed>(&self, batch: DecodedBatch<T>, mode: IngestMode) -> Result<IngestSummary> {
        let mut summary = self.ingest(batch.records, mode)?;
        summary.skipped += batch.skipped;
        Ok(summary)
    }

    pub fn ingest<T: Keyed>(&self, records: Vec<T>, mode: IngestMode) -> Result<IngestSummary> {
        let collection = T::COLLECTION;
        let mut summary = IngestSummary::default();
        let mut staged: Vec<Document> = Vec::new();
        // identity -> position in `staged`, so a key repeated within one batch
        // is merged rather than inserted twice
        let mut staged_index: HashMap<String, usize> = HashMap::new();

        for record in records {
            let document = record.to_document()?;

            if mode == IngestMode::InsertOnly {
                staged.push(document);
                continue;
            }

            let identity = record.identity();
            let key = identity_key(&identity);

            if let Some(&position) = staged_index.get(&key) {
                merge_into(&mut staged[position], document);
                summary.updated += 1;
                continue;
            }

            let existing = self.gateway.find_by_key(collection, &identity)?;
            let count_as_new =
                self.dry_run && self.dry_run_accounting == DryRunAccounting::TreatAllAsNew;

            match existing {
                Some(mut existing) if !count_as_new => {
                    merge_into(&mut existing, document);
                    if !self.dry_run {
                        self.gateway.merge_and_save(collection, existing)?;
                    }
                    summary.updated += 1;
                }
                _ => {
                    staged_index.insert(key, staged.len());
                    staged.push(document);
                }
            }
        }

        summary.inserted = staged.len();
        if self.dry_run {
            debug!(%collection, would_insert = summary.inserted, "dry run, insert suppressed");
        } else {
            self.gateway.bulk_insert(collection, staged)?;
        }

        Ok(summary)
    }
}
