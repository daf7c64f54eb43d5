/// Remote layout
pub const DEFAULT_REMOTE_BASE_DIR: &str = "pub/data/gsod";
pub const STATIONS_FILE: &str = "ish-history.csv";
pub const OBSERVATION_FILE_PATTERN: &str = r"^[0-9]{6}-[0-9]{5}-[0-9]{4}\.op\.gz$";

/// Completion status the transfer server sends after a successful download
pub const TRANSFER_COMPLETE: &str = "226 Transfer complete";

/// Missing-value sentinels
pub const MISSING_TEMPERATURE: &str = "9999.9";
pub const MISSING_COORDINATE: &str = "-999999";
pub const MISSING_ELEVATION: &str = "-99999";

/// Raw station encodings
pub const COORDINATE_SCALE: f64 = 0.001;
pub const ELEVATION_SCALE: f64 = 0.1;

/// Fixed-width observation line length
pub const OBSERVATION_LINE_WIDTH: usize = 138;

/// Store retry defaults
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 10;
pub const DEFAULT_RETRY_DELAY_SECS: u64 = 5;

/// Query defaults
pub const DEFAULT_NEIGHBOR_LIMIT: usize = 10;

/// Processing defaults
pub const DEFAULT_BUFFER_SIZE: usize = 8192 * 16; // 128KB
