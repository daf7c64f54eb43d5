use crate::error::{ProcessingError, Result};
use crate::processors::{BatchIngester, IngestMode, IngestSummary};
use crate::sync::staging::StagingArea;
use crate::sync::transfer::TransferClient;
use crate::utils::constants::{DEFAULT_REMOTE_BASE_DIR, STATIONS_FILE};
use crate::utils::filename::{is_observation_file, observation_year_dir};
use crate::utils::progress::ProgressReporter;
use rayon::prelude::*;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{error, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileStatus {
    Ingested(IngestSummary),
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileOutcome {
    pub file: String,
    #[serde(flatten)]
    pub status: FileStatus,
}

impl FileOutcome {
    fn ingested(file: &str, summary: IngestSummary) -> Self {
        Self {
            file: file.to_string(),
            status: FileStatus::Ingested(summary),
        }
    }

    fn failed(file: &str, err: &ProcessingError) -> Self {
        Self {
            file: file.to_string(),
            status: FileStatus::Failed {
                reason: err.to_string(),
            },
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.status, FileStatus::Failed { .. })
    }
}

/// Per-file results of one sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub files: Vec<FileOutcome>,
}

impl SyncReport {
    pub fn totals(&self) -> IngestSummary {
        let mut totals = IngestSummary::default();
        for outcome in &self.files {
            if let FileStatus::Ingested(summary) = &outcome.status {
                totals.add(summary);
            }
        }
        totals
    }

    pub fn failed_count(&self) -> usize {
        self.files.iter().filter(|o| o.is_failure()).count()
    }

    pub fn ingested_count(&self) -> usize {
        self.files.len() - self.failed_count()
    }
}

impl std::fmt::Display for SyncReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} files ingested, {} failed ({})",
            self.ingested_count(),
            self.failed_count(),
            self.totals()
        )
    }
}

/// Pulls station metadata and yearly observation files from a remote server
/// and feeds them to the ingester.
///
/// Every sync opens its own session and closes it on the way out, whether
/// the sync succeeded or not.
pub struct SyncOrchestrator<C: TransferClient> {
    client: C,
    ingester: BatchIngester,
    remote_base_dir: String,
    stations_file: String,
    max_workers: usize,
    silent: bool,
}

impl<C: TransferClient> SyncOrchestrator<C> {
    pub fn new(client: C, ingester: BatchIngester) -> Self {
        Self {
            client,
            ingester,
            remote_base_dir: DEFAULT_REMOTE_BASE_DIR.to_string(),
            stations_file: STATIONS_FILE.to_string(),
            max_workers: 1,
            silent: false,
        }
    }

    pub fn with_remote_base_dir(mut self, dir: impl Into<String>) -> Self {
        self.remote_base_dir = dir.into();
        self
    }

    pub fn with_stations_file(mut self, name: impl Into<String>) -> Self {
        self.stations_file = name.into();
        self
    }

    /// Ingest downloaded files on up to `max_workers` threads. Downloads stay
    /// sequential since they share one session.
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    pub fn with_silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    pub fn into_client(self) -> C {
        self.client
    }

    /// Download the station list and upsert every station in it.
    ///
    /// A missing station file comes back as `SourceFileMissing`; the caller
    /// decides whether that is fatal. A failed download is recorded in the report.
    pub fn sync_stations(&mut self) -> Result<SyncReport> {
        self.client.login()?;
        let result = self.sync_stations_in_session();
        self.close_session();
        result
    }

    /// Download and upsert every observation file for `year`.
    ///
    /// Files that fail to download or ingest are recorded in the report and
    /// the rest are still processed.
    pub fn sync_observations(&mut self, year: i32) -> Result<SyncReport> {
        self.client.login()?;
        let result = self.sync_observations_in_session(year);
        self.close_session();
        result
    }

    fn close_session(&mut self) {
        if let Err(e) = self.client.close() {
            warn!(error = %e, "failed to close transfer session");
        }
    }

    fn sync_stations_in_session(&mut self) -> Result<SyncReport> {
        self.client.change_directory(&self.remote_base_dir)?;
        let listing = self.client.list()?;

        if !listing.iter().any(|name| name == &self.stations_file) {
            let err = ProcessingError::SourceFileMissing {
                file: self.stations_file.clone(),
                directory: self.remote_base_dir.clone(),
            };
            warn!(error = %err, "station sync skipped");
            return Err(err);
        }

        let spinner = ProgressReporter::new_spinner(
            &format!("Downloading {}...", self.stations_file),
            self.silent,
        );
        let mut staging = StagingArea::new()?;
        let name = self.stations_file.clone();

        let outcome = match staging.download(&mut self.client, &name) {
            Ok(path) => {
                spinner.set_message(&format!("Ingesting {}...", name));
                let summary = self.ingester.ingest_station_file(&path, IngestMode::Upsert)?;
                FileOutcome::ingested(&name, summary)
            }
            Err(e @ ProcessingError::TransferFailed { .. }) => {
                error!(file = %name, error = %e, "station download failed");
                FileOutcome::failed(&name, &e)
            }
            Err(e) => return Err(e),
        };

        spinner.finish_with_message(&format!("{}: done", name));
        Ok(SyncReport {
            files: vec![outcome],
        })
    }

    fn sync_observations_in_session(&mut self, year: i32) -> Result<SyncReport> {
        let directory = observation_year_dir(&self.remote_base_dir, year);
        self.client.change_directory(&directory)?;

        let files: Vec<String> = self
            .client
            .list()?
            .into_iter()
            .filter(|name| is_observation_file(name))
            .collect();

        info!(year, directory = %directory, files = files.len(), "observation files listed");

        let progress = ProgressReporter::new(
            files.len() as u64,
            &format!("Syncing observations for {}", year),
            self.silent,
        );
        let mut staging = StagingArea::new()?;

        let outcomes = if self.max_workers > 1 {
            self.download_then_ingest_parallel(&files, &mut staging, &progress)?
        } else {
            self.download_and_ingest_sequential(&files, &mut staging, &progress)
        };

        let report = SyncReport { files: outcomes };
        progress.finish_with_message(&format!("{}: {}", year, report));
        info!(year, %report, "observation sync finished");
        Ok(report)
    }

    fn download_and_ingest_sequential(
        &mut self,
        files: &[String],
        staging: &mut StagingArea,
        progress: &ProgressReporter,
    ) -> Vec<FileOutcome> {
        let mut outcomes = Vec::with_capacity(files.len());

        for name in files {
            progress.set_message(&format!("Processing {}", name));
            let outcome = staging
                .download(&mut self.client, name)
                .and_then(|path| self.ingester.ingest_observation_file(&path, IngestMode::Upsert));
            outcomes.push(record_outcome(name, outcome));

            if let Err(e) = staging.discard(name) {
                warn!(file = %name, error = %e, "could not remove staged file");
            }
            progress.increment(1);
        }

        outcomes
    }

    fn download_then_ingest_parallel(
        &mut self,
        files: &[String],
        staging: &mut StagingArea,
        progress: &ProgressReporter,
    ) -> Result<Vec<FileOutcome>> {
        progress.set_message(&format!("Downloading {} files", files.len()));
        let downloads: Vec<(&String, Result<PathBuf>)> = files
            .iter()
            .map(|name| (name, staging.download(&mut self.client, name)))
            .collect();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.max_workers)
            .build()
            .map_err(|e| ProcessingError::Config(e.to_string()))?;

        progress.set_message(&format!("Ingesting on {} workers", self.max_workers));
        let ingester = &self.ingester;
        let outcomes = pool.install(|| {
            downloads
                .into_par_iter()
                .map(|(name, download)| {
                    let outcome = download
                        .and_then(|path| ingester.ingest_observation_file(&path, IngestMode::Upsert));
                    progress.increment(1);
                    record_outcome(name, outcome)
                })
                .collect()
        });

        Ok(outcomes)
    }
}

fn record_outcome(name: &str, outcome: Result<IngestSummary>) -> FileOutcome {
    match outcome {
        Ok(summary) => FileOutcome::ingested(name, summary),
        Err(e) => {
            error!(file = %name, error = %e, "file skipped");
            FileOutcome::failed(name, &e)
        }
    }
}
