use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gsod-processor")]
#[command(about = "Ingests NOAA GSOD weather data and answers nearest-temperature queries")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,

    #[arg(
        short,
        long,
        global = true,
        help = "Settings file [default: gsod.toml if present]"
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        help = "Decode and count everything but write nothing to the store"
    )]
    pub dry_run: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download the station list from the mirror and upsert it
    SyncStations,

    /// Download one year of observation files from the mirror and upsert them
    SyncObservations {
        #[arg(short, long)]
        year: i32,

        #[arg(long, help = "Ingestion threads (0 = one per CPU) [default: from settings]")]
        max_workers: Option<usize>,
    },

    /// Load a local station CSV
    IngestStations {
        #[arg(help = "Station history CSV file")]
        file: PathBuf,

        #[arg(long, help = "Insert every row without looking for existing stations")]
        insert_only: bool,
    },

    /// Load a local observation file, plain or gzipped
    IngestObservations {
        #[arg(help = "Fixed-width observation file (.op or .op.gz)")]
        file: PathBuf,

        #[arg(long, help = "Insert every row without looking for existing observations")]
        insert_only: bool,
    },

    /// Temperature observed nearest to a point on a date
    Query {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        #[arg(short, long, help = "Date as YYYY-MM-DD")]
        date: chrono::NaiveDate,

        #[arg(long, help = "Stations to try [default: from settings]")]
        neighbors: Option<usize>,

        #[arg(long, help = "Print the reading as JSON")]
        json: bool,
    },
}
