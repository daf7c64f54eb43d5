use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProcessingError>;

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Malformed date '{value}': expected YYYYMMDD")]
    MalformedDate { value: String },

    #[error("Malformed temperature in field '{field}': '{value}'")]
    MalformedTemperature { field: &'static str, value: String },

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("Source file {file} not found in remote directory {directory}")]
    SourceFileMissing { file: String, directory: String },

    #[error("Transfer of {file} failed: {status}")]
    TransferFailed { file: String, status: String },

    #[error("Store unavailable after {attempts} attempts during {operation}")]
    StoreUnavailable {
        operation: &'static str,
        attempts: u32,
    },

    #[error("Store error: {0}")]
    Store(String),

    #[error("Async task error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl From<config::ConfigError> for ProcessingError {
    fn from(err: config::ConfigError) -> Self {
        ProcessingError::Config(err.to_string())
    }
}
