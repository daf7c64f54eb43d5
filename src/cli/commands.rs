use crate::cli::args::{Cli, Commands};
use crate::config::Settings;
use crate::error::ProcessingError;
use crate::models::GeoPoint;
use crate::processors::{BatchIngester, IngestMode, NearestObservationResolver};
use crate::store::{MemoryStore, StoreGateway};
use crate::sync::{FileStatus, LocalMirror, SyncOrchestrator, SyncReport};
use anyhow::Context;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{info, warn, Level};

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    init_logging(cli.verbose, cli.log_file.as_deref())?;

    let mut settings = Settings::load(cli.config.as_deref()).context("failed to load settings")?;
    if cli.dry_run {
        settings.dry_run = true;
    }

    // Store calls and retries block; keep them off the async workers.
    run_blocking(move || execute(cli.command, settings)).await
}

/// Run `job` on the blocking pool. A panic inside it comes back as `TaskJoin`.
async fn run_blocking<T, F>(job: F) -> anyhow::Result<T>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(ProcessingError::from)
        .context("command task failed")?
}

fn init_logging(verbose: bool, log_file: Option<&Path>) -> anyhow::Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let builder = tracing_subscriber::fmt().with_max_level(level).with_target(false);

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }

    Ok(())
}

fn execute(command: Commands, settings: Settings) -> anyhow::Result<()> {
    let store = Arc::new(match &settings.store_path {
        Some(path) => MemoryStore::open(path)
            .with_context(|| format!("cannot load store snapshot {}", path.display()))?,
        None => MemoryStore::new(),
    });
    let gateway = StoreGateway::new(store.clone(), settings.retry_policy());
    let ingester = BatchIngester::new(gateway.clone()).with_dry_run(settings.dry_run);

    if ingester.is_dry_run() {
        info!("dry run: nothing will be written to the store");
    }

    let writes = match command {
        Commands::SyncStations => {
            let mirror = LocalMirror::new(settings.require_mirror_root()?);
            let mut sync = orchestrator(mirror, ingester, &settings, settings.worker_count());

            match sync.sync_stations() {
                Ok(report) => print_report("Station sync", &report),
                Err(e @ ProcessingError::SourceFileMissing { .. }) => {
                    warn!(error = %e, "nothing to sync");
                    println!("Station sync skipped: {}", e);
                }
                Err(e) => return Err(e).context("station sync failed"),
            }
            true
        }

        Commands::SyncObservations { year, max_workers } => {
            let mirror = LocalMirror::new(settings.require_mirror_root()?);
            let workers = match max_workers {
                Some(0) => num_cpus::get(),
                Some(n) => n,
                None => settings.worker_count(),
            };
            let mut sync = orchestrator(mirror, ingester, &settings, workers);

            let report = sync
                .sync_observations(year)
                .with_context(|| format!("observation sync for {} failed", year))?;
            print_report(&format!("Observation sync {}", year), &report);
            true
        }

        Commands::IngestStations { file, insert_only } => {
            let summary = ingester
                .ingest_station_file(&file, ingest_mode(insert_only))
                .with_context(|| format!("cannot ingest {}", file.display()))?;
            println!("{}: {}", file.display(), summary);
            true
        }

        Commands::IngestObservations { file, insert_only } => {
            let summary = ingester
                .ingest_observation_file(&file, ingest_mode(insert_only))
                .with_context(|| format!("cannot ingest {}", file.display()))?;
            println!("{}: {}", file.display(), summary);
            true
        }

        Commands::Query {
            lat,
            lon,
            date,
            neighbors,
            json,
        } => {
            let resolver = NearestObservationResolver::new(gateway)
                .with_neighbor_limit(neighbors.unwrap_or(settings.neighbor_limit));

            match resolver.resolve(GeoPoint::new(lat, lon), date)? {
                Some(reading) if json => println!("{}", serde_json::to_string_pretty(&reading)?),
                Some(reading) => println!("{}", reading.summary()),
                None => println!("No observation near ({}, {}) on {}", lat, lon, date),
            }
            false
        }
    };

    if writes && !settings.dry_run {
        if let Some(path) = &settings.store_path {
            store
                .persist(path)
                .with_context(|| format!("cannot save store snapshot {}", path.display()))?;
            info!(path = %path.display(), "store snapshot saved");
        }
    }

    Ok(())
}

fn orchestrator(
    mirror: LocalMirror,
    ingester: BatchIngester,
    settings: &Settings,
    workers: usize,
) -> SyncOrchestrator<LocalMirror> {
    SyncOrchestrator::new(mirror, ingester)
        .with_remote_base_dir(settings.remote_base_dir.clone())
        .with_stations_file(settings.stations_file.clone())
        .with_max_workers(workers)
}

fn ingest_mode(insert_only: bool) -> IngestMode {
    if insert_only {
        IngestMode::InsertOnly
    } else {
        IngestMode::Upsert
    }
}

fn print_report(label: &str, report: &SyncReport) {
    println!("{}: {}", label, report);
    for outcome in &report.files {
        if let FileStatus::Failed { reason } = &outcome.status {
            println!("  {}: {}", outcome.file, reason);
        }
    }
}
