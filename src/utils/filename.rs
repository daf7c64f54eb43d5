use crate::utils::constants::OBSERVATION_FILE_PATTERN;
use regex::Regex;
use std::sync::OnceLock;

fn observation_file_regex() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(OBSERVATION_FILE_PATTERN).expect("observation file pattern is a valid regex")
    })
}

/// Whether a remote file name is a yearly GSOD observation file (`USAF-WBAN-YEAR.op.gz`).
pub fn is_observation_file(name: &str) -> bool {
    observation_file_regex().is_match(name)
}

/// Remote directory holding the observation files for `year`.
pub fn observation_year_dir(base_dir: &str, year: i32) -> String {
    format!("{}/{}", base_dir.trim_end_matches('/'), year)
}
