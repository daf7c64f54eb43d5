pub mod fixed_width;
pub mod observation_reader;
pub mod station_reader;

pub use observation_reader::{decode_line, fahrenheit_to_celsius, ObservationReader};
pub use station_reader::{decode_station_row, StationReader, StationRow};

use crate::error::Result;
use crate::utils::constants::DEFAULT_BUFFER_SIZE;
use flate2::bufread::MultiGzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Records decoded from one source, plus how many rows could not be decoded.
#[derive(Debug, Clone)]
pub struct DecodedBatch<T> {
    pub records: Vec<T>,
    pub skipped: usize,
}

impl<T> Default for DecodedBatch<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            skipped: 0,
        }
    }
}

/// Open a file for buffered reading, transparently gunzipping it when it starts
/// with the gzip magic bytes.
pub fn open_source(path: &Path) -> Result<Box<dyn BufRead + Send>> {
    let mut reader = BufReader::with_capacity(DEFAULT_BUFFER_SIZE, File::open(path)?);
    let is_gzip = reader.fill_buf()?.starts_with(&GZIP_MAGIC);

    if is_gzip {
        Ok(Box::new(BufReader::with_capacity(
            DEFAULT_BUFFER_SIZE,
            MultiGzDecoder::new(reader),
        )))
    } else {
        Ok(Box::new(reader))
    }
}
