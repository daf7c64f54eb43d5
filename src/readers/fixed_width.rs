//! Column layout of GSOD daily summary lines.
//!
//! The offsets are the upstream provider's format contract
//! (ftp://ftp.ncdc.noaa.gov/pub/data/gsod/readme.txt) and change only when it does.

use crate::utils::constants::OBSERVATION_LINE_WIDTH;
use std::borrow::Cow;
use std::collections::HashMap;

/// A named, half-open byte range `[start, end)` within a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub start: usize,
    pub end: usize,
}

impl FieldSpec {
    const fn new(name: &'static str, start: usize, end: usize) -> Self {
        Self { name, start, end }
    }

    pub fn width(&self) -> usize {
        self.end - self.start
    }
}

pub const OBSERVATION_FIELDS: [FieldSpec; 25] = [
    FieldSpec::new("station", 0, 6),
    FieldSpec::new("wban", 7, 12),
    FieldSpec::new("date", 14, 22),
    FieldSpec::new("temp", 24, 30),
    FieldSpec::new("temp_count", 31, 33),
    FieldSpec::new("dew", 35, 41),
    FieldSpec::new("dew_count", 42, 44),
    FieldSpec::new("slp", 46, 52),
    FieldSpec::new("slp_count", 53, 55),
    FieldSpec::new("stp", 57, 63),
    FieldSpec::new("stp_count", 64, 66),
    FieldSpec::new("visibility", 68, 73),
    FieldSpec::new("visibility_count", 74, 76),
    FieldSpec::new("wind", 78, 83),
    FieldSpec::new("wind_count", 84, 86),
    FieldSpec::new("max_wind", 88, 93),
    FieldSpec::new("gust", 95, 100),
    FieldSpec::new("max_temp", 102, 108),
    FieldSpec::new("max_flag", 108, 109),
    FieldSpec::new("min_temp", 110, 116),
    FieldSpec::new("min_flag", 116, 117),
    FieldSpec::new("precipitation", 118, 123),
    FieldSpec::new("prcp_flag", 123, 124),
    FieldSpec::new("snow", 125, 130),
    FieldSpec::new("frshtt", 133, 138),
];

pub fn field_spec(name: &str) -> Option<&'static FieldSpec> {
    OBSERVATION_FIELDS.iter().find(|spec| spec.name == name)
}

/// Raw text of one field. Ranges past the end of a short line come back truncated
/// or empty; a range that splits a multi-byte character is decoded lossily.
pub fn extract<'a>(line: &'a str, spec: &FieldSpec) -> Cow<'a, str> {
    let bytes = line.as_bytes();
    let start = spec.start.min(bytes.len());
    let end = spec.end.min(bytes.len());
    String::from_utf8_lossy(&bytes[start..end])
}

/// Split a line into trimmed field values, keyed by field name.
pub fn split_line(line: &str) -> HashMap<&'static str, String> {
    OBSERVATION_FIELDS
        .iter()
        .map(|spec| (spec.name, extract(line, spec).trim().to_string()))
        .collect()
}

/// Lay values out on a blank line, each right-aligned within its column.
///
/// Unknown names are ignored and over-long values are cut to the column width.
pub fn render_line(values: &[(&str, &str)]) -> String {
    let mut line = vec![b' '; OBSERVATION_LINE_WIDTH];
    for (name, value) in values {
        let Some(spec) = field_spec(name) else {
            continue;
        };
        let bytes = value.as_bytes();
        let len = bytes.len().min(spec.width());
        let offset = spec.end - len;
        line[offset..spec.end].copy_from_slice(&bytes[..len]);
    }
    String::from_utf8_lossy(&line).into_owned()
}
