use crate::error::{ProcessingError, Result};
use crate::models::ObservationRecord;
use crate::readers::fixed_width::split_line;
use crate::readers::{open_source, DecodedBatch};
use crate::utils::constants::MISSING_TEMPERATURE;
use crate::utils::dates::parse_yyyymmdd;
use std::io::BufRead;
use std::path::Path;
use tracing::{debug, warn};

/// Convert Fahrenheit to whole degrees Celsius.
///
/// Ties round to the even neighbour (`36.5°F` is exactly `2.5°C` and becomes `2`).
pub fn fahrenheit_to_celsius(fahrenheit: f64) -> i32 {
    ((fahrenheit - 32.0) * 5.0 / 9.0).round_ties_even() as i32
}

fn parse_temperature(field: &'static str, raw: &str) -> Result<Option<i32>> {
    if raw.is_empty() || raw == MISSING_TEMPERATURE {
        return Ok(None);
    }

    let fahrenheit = raw
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .ok_or_else(|| ProcessingError::MalformedTemperature {
            field,
            value: raw.to_string(),
        })?;

    Ok(Some(fahrenheit_to_celsius(fahrenheit)))
}

/// Decode one fixed-width GSOD line.
pub fn decode_line(line: &str) -> Result<ObservationRecord> {
    let mut fields = split_line(line);
    let mut take = |name: &str| fields.remove(name).unwrap_or_default();

    let station = take("station");
    let wban = take("wban");
    let date = parse_yyyymmdd(&take("date"))?;
    let temp = parse_temperature("temp", &take("temp"))?;
    let max_temp = parse_temperature("max_temp", &take("max_temp"))?;
    let min_temp = parse_temperature("min_temp", &take("min_temp"))?;

    Ok(ObservationRecord {
        station,
        wban,
        date,
        temp,
        max_temp,
        min_temp,
        temp_count: take("temp_count"),
        dew: take("dew"),
        dew_count: take("dew_count"),
        slp: take("slp"),
        slp_count: take("slp_count"),
        stp: take("stp"),
        stp_count: take("stp_count"),
        visibility: take("visibility"),
        visibility_count: take("visibility_count"),
        wind: take("wind"),
        wind_count: take("wind_count"),
        max_wind: take("max_wind"),
        gust: take("gust"),
        max_flag: take("max_flag"),
        min_flag: take("min_flag"),
        precipitation: take("precipitation"),
        prcp_flag: take("prcp_flag"),
        snow: take("snow"),
        frshtt: take("frshtt"),
    })
}

/// Reads `.op` / `.op.gz` observation files. The first line of every file is
/// the column header and is never decoded.
#[derive(Debug, Default)]
pub struct ObservationReader;

impl ObservationReader {
    pub fn new() -> Self {
        Self
    }

    /// Read every decodable line of a file, gzip-compressed or not.
    pub fn read_observations(&self, path: &Path) -> Result<DecodedBatch<ObservationRecord>> {
        let reader = open_source(path)?;
        self.read_from(reader, &path.display().to_string())
    }

    /// Decode lines from any buffered source. Lines that fail to decode are
    /// logged and counted, never fatal.
    pub fn read_from<R: BufRead>(
        &self,
        mut reader: R,
        source: &str,
    ) -> Result<DecodedBatch<ObservationRecord>> {
        let mut batch = DecodedBatch::default();
        let mut buf = Vec::new();
        let mut line_number = 0usize;

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            line_number += 1;

            if line_number == 1 {
                continue;
            }

            let line = String::from_utf8_lossy(&buf);
            let line = line.trim_end_matches(['\n', '\r']);
            if line.trim().is_empty() {
                continue;
            }

            match decode_line(line) {
                Ok(record) => batch.records.push(record),
                Err(e) => {
                    warn!(source, line = line_number, error = %e, "record skipped");
                    batch.skipped += 1;
                }
            }
        }

        debug!(
            source,
            records = batch.records.len(),
            skipped = batch.skipped,
            "decoded observation file"
        );
        Ok(batch)
    }
}
