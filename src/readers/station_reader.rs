use crate::error::{ProcessingError, Result};
use crate::models::{GeoPoint, Station};
use crate::readers::{open_source, DecodedBatch};
use crate::utils::constants::{ELEVATION_SCALE, MISSING_COORDINATE, MISSING_ELEVATION};
use crate::utils::coordinates::{clamp_coordinate, scale_raw_coordinate};
use crate::utils::dates::parse_yyyymmdd;
use encoding_rs::WINDOWS_1252;
use serde::Deserialize;
use std::borrow::Cow;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

/// One row of `ish-history.csv`, matched to columns by header name.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StationRow {
    #[serde(rename = "USAF")]
    pub usaf: String,
    #[serde(rename = "WBAN", default)]
    pub wban: String,
    #[serde(rename = "STATION NAME", default)]
    pub station_name: String,
    #[serde(rename = "CTRY", default)]
    pub country: String,
    #[serde(rename = "FIPS", default)]
    pub fips: String,
    #[serde(rename = "STATE", default)]
    pub state: String,
    #[serde(rename = "CALL", default)]
    pub call: String,
    #[serde(rename = "LAT", default)]
    pub lat: String,
    #[serde(rename = "LON", default)]
    pub lon: String,
    #[serde(rename = "ELEV(.1M)", default)]
    pub elevation: String,
    #[serde(rename = "BEGIN", default)]
    pub begin: String,
    #[serde(rename = "END", default)]
    pub end: String,
}

fn has_coordinate(raw: &str) -> bool {
    !raw.is_empty() && raw != MISSING_COORDINATE
}

fn parse_optional_date(raw: &str) -> Result<Option<chrono::NaiveDate>> {
    if raw.is_empty() {
        Ok(None)
    } else {
        parse_yyyymmdd(raw).map(Some)
    }
}

fn parse_elevation(raw: &str) -> Result<Option<f64>> {
    if raw.is_empty() || raw == MISSING_ELEVATION {
        return Ok(None);
    }
    let tenths = raw
        .parse::<f64>()
        .map_err(|_| ProcessingError::InvalidFormat(format!("Invalid elevation: '{}'", raw)))?;
    Ok(Some(tenths * ELEVATION_SCALE))
}

/// Turn a CSV row into a station. `Ok(None)` means the row has no usable
/// position and is left out without being an error.
pub fn decode_station_row(row: StationRow) -> Result<Option<Station>> {
    if !has_coordinate(&row.lat) || !has_coordinate(&row.lon) {
        return Ok(None);
    }

    let lat = clamp_coordinate(scale_raw_coordinate(&row.lat)?);
    let long = clamp_coordinate(scale_raw_coordinate(&row.lon)?);

    Ok(Some(Station {
        elevation: parse_elevation(&row.elevation)?,
        begin: parse_optional_date(&row.begin)?,
        end: parse_optional_date(&row.end)?,
        usaf: row.usaf,
        wban: row.wban,
        station_name: row.station_name,
        country: row.country,
        fips: row.fips,
        state: row.state,
        call: row.call,
        loc: GeoPoint::new(lat, long),
    }))
}

/// Station names in the upstream file are Latin-1; fall back to Windows-1252
/// when the bytes are not UTF-8.
fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => {
            let (text, _, _) = WINDOWS_1252.decode(bytes);
            text
        }
    }
}

/// Reads the station history CSV.
pub struct StationReader;

impl StationReader {
    pub fn new() -> Self {
        Self
    }

    pub fn read_stations(&self, path: &Path) -> Result<DecodedBatch<Station>> {
        let mut bytes = Vec::new();
        open_source(path)?.read_to_end(&mut bytes)?;
        self.read_from_bytes(&bytes, &path.display().to_string())
    }

    pub fn read_from_bytes(&self, bytes: &[u8], source: &str) -> Result<DecodedBatch<Station>> {
        let text = decode_text(bytes);
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(text.as_bytes());

        let mut batch = DecodedBatch::default();
        let mut without_position = 0usize;

        for (index, row) in reader.deserialize::<StationRow>().enumerate() {
            let row_number = index + 2;
            let decoded = row.map_err(ProcessingError::from).and_then(decode_station_row);
            match decoded {
                Ok(Some(station)) => batch.records.push(station),
                Ok(None) => without_position += 1,
                Err(e) => {
                    warn!(source, row = row_number, error = %e, "station row skipped");
                    batch.skipped += 1;
                }
            }
        }

        debug!(
            source,
            stations = batch.records.len(),
            without_position,
            skipped = batch.skipped,
            "decoded station file"
        );
        Ok(batch)
    }
}

impl Default for StationReader {
    fn default() -> Self {
        Self::new()
    }
}
