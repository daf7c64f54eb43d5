pub mod constants;
pub mod coordinates;
pub mod dates;
pub mod filename;
pub mod progress;

pub use constants::*;
pub use coordinates::{clamp_coordinate, haversine_distance};
pub use dates::parse_yyyymmdd;
pub use filename::{is_observation_file, observation_year_dir};
pub use progress::ProgressReporter;
