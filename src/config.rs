use crate::error::{ProcessingError, Result};
use crate::store::RetryPolicy;
use crate::utils::constants::{
    DEFAULT_NEIGHBOR_LIMIT, DEFAULT_REMOTE_BASE_DIR, DEFAULT_RETRY_ATTEMPTS,
    DEFAULT_RETRY_DELAY_SECS, STATIONS_FILE,
};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use validator::Validate;

pub const DEFAULT_CONFIG_FILE: &str = "gsod.toml";
pub const ENV_PREFIX: &str = "GSOD";

/// Runtime settings, layered as defaults < config file < `GSOD_*` environment.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Settings {
    /// JSON snapshot the store is loaded from and saved back to. Without it
    /// the store lives only for the duration of one command.
    #[serde(default)]
    pub store_path: Option<PathBuf>,

    /// Local directory laid out like the remote server.
    #[serde(default)]
    pub mirror_root: Option<PathBuf>,

    #[validate(length(min = 1))]
    pub remote_base_dir: String,

    #[validate(length(min = 1))]
    pub stations_file: String,

    #[validate(range(min = 1, max = 100))]
    pub retry_attempts: u32,

    #[validate(range(max = 3600))]
    pub retry_delay_secs: u64,

    #[serde(default)]
    pub retry_deadline_secs: Option<u64>,

    #[validate(range(min = 1, max = 1000))]
    pub neighbor_limit: usize,

    pub dry_run: bool,

    /// Ingestion threads for observation sync; 0 means one per CPU.
    #[validate(range(max = 256))]
    pub max_workers: usize,
}

impl Settings {
    /// Load settings from `path`, or from `gsod.toml` in the working
    /// directory when no path is given. Only an explicit path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let settings: Settings = Config::builder()
            .set_default("remote_base_dir", DEFAULT_REMOTE_BASE_DIR)?
            .set_default("stations_file", STATIONS_FILE)?
            .set_default("retry_attempts", DEFAULT_RETRY_ATTEMPTS as i64)?
            .set_default("retry_delay_secs", DEFAULT_RETRY_DELAY_SECS as i64)?
            .set_default("neighbor_limit", DEFAULT_NEIGHBOR_LIMIT as i64)?
            .set_default("dry_run", false)?
            .set_default("max_workers", 1_i64)?
            .add_source(file)
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry_attempts,
            Duration::from_secs(self.retry_delay_secs),
        )
        .with_deadline(self.retry_deadline_secs.map(Duration::from_secs))
    }

    pub fn worker_count(&self) -> usize {
        if self.max_workers == 0 {
            num_cpus::get()
        } else {
            self.max_workers
        }
    }

    pub fn require_mirror_root(&self) -> Result<&Path> {
        self.mirror_root.as_deref().ok_or_else(|| {
            ProcessingError::Config(
                "mirror_root is not set (use gsod.toml or GSOD_MIRROR_ROOT)".to_string(),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn toml_file(content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_apply_under_a_sparse_file() {
        let file = toml_file("mirror_root = \"/srv/gsod\"\n");

        let settings = Settings::load(Some(file.path())).unwrap();

        assert_eq!(settings.mirror_root, Some(PathBuf::from("/srv/gsod")));
        assert_eq!(settings.remote_base_dir, "pub/data/gsod");
        assert_eq!(settings.stations_file, "ish-history.csv");
        assert_eq!(settings.retry_attempts, 10);
        assert_eq!(settings.retry_delay_secs, 5);
        assert_eq!(settings.neighbor_limit, 10);
        assert_eq!(settings.max_workers, 1);
        assert!(!settings.dry_run);
        assert!(settings.store_path.is_none());
    }

    #[test]
    fn test_file_values_and_retry_policy() {
        let file = toml_file(
            "retry_attempts = 3\nretry_delay_secs = 1\nretry_deadline_secs = 2\nneighbor_limit = 4\n",
        );

        let settings = Settings::load(Some(file.path())).unwrap();
        let policy = settings.retry_policy();

        assert_eq!(settings.neighbor_limit, 4);
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.delay(), Duration::from_secs(1));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let file = toml_file("retry_attempts = 0\n");

        let result = Settings::load(Some(file.path()));

        assert!(matches!(result, Err(ProcessingError::Validation(_))));
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let result = Settings::load(Some(Path::new("/nonexistent/gsod.toml")));

        assert!(matches!(result, Err(ProcessingError::Config(_))));
    }

    #[test]
    fn test_zero_workers_means_one_per_cpu() {
        let file = toml_file("max_workers = 0\n");

        let settings = Settings::load(Some(file.path())).unwrap();

        assert_eq!(settings.worker_count(), num_cpus::get());
        assert!(settings.require_mirror_root().is_err());
    }
}
