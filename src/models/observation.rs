use crate::models::document::{Collection, Document, Keyed};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One station-day from a GSOD `.op` file.
///
/// Temperatures are whole degrees Celsius. Every other measurement is kept as the
/// trimmed text of its fixed-width column; nothing downstream interprets them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationRecord {
    pub station: String,
    pub wban: String,
    pub date: NaiveDate,

    pub temp: Option<i32>,
    pub max_temp: Option<i32>,
    pub min_temp: Option<i32>,

    pub temp_count: String,
    pub dew: String,
    pub dew_count: String,
    pub slp: String,
    pub slp_count: String,
    pub stp: String,
    pub stp_count: String,
    pub visibility: String,
    pub visibility_count: String,
    pub wind: String,
    pub wind_count: String,
    pub max_wind: String,
    pub gust: String,
    pub max_flag: String,
    pub min_flag: String,
    pub precipitation: String,
    pub prcp_flag: String,
    pub snow: String,
    pub frshtt: String,
}

impl ObservationRecord {
    /// The text fields that are stored exactly as read, by column name.
    pub fn raw_fields(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("station", self.station.as_str()),
            ("wban", self.wban.as_str()),
            ("temp_count", self.temp_count.as_str()),
            ("dew", self.dew.as_str()),
            ("dew_count", self.dew_count.as_str()),
            ("slp", self.slp.as_str()),
            ("slp_count", self.slp_count.as_str()),
            ("stp", self.stp.as_str()),
            ("stp_count", self.stp_count.as_str()),
            ("visibility", self.visibility.as_str()),
            ("visibility_count", self.visibility_count.as_str()),
            ("wind", self.wind.as_str()),
            ("wind_count", self.wind_count.as_str()),
            ("max_wind", self.max_wind.as_str()),
            ("gust", self.gust.as_str()),
            ("max_flag", self.max_flag.as_str()),
            ("min_flag", self.min_flag.as_str()),
            ("precipitation", self.precipitation.as_str()),
            ("prcp_flag", self.prcp_flag.as_str()),
            ("snow", self.snow.as_str()),
            ("frshtt", self.frshtt.as_str()),
        ]
    }

    pub fn has_temperature(&self) -> bool {
        self.temp.is_some() || self.max_temp.is_some() || self.min_temp.is_some()
    }
}

impl Keyed for ObservationRecord {
    const COLLECTION: Collection = Collection::Observations;

    fn identity(&self) -> Document {
        observation_filter(&self.station, &self.wban, self.date)
    }
}

/// Exact-match filter for the observation of one station on one day.
pub fn observation_filter(station: &str, wban: &str, date: NaiveDate) -> Document {
    let mut filter = Document::new();
    filter.insert("station".to_string(), Value::String(station.to_string()));
    filter.insert("wban".to_string(), Value::String(wban.to_string()));
    filter.insert(
        "date".to_string(),
        Value::String(date.format("%Y-%m-%d").to_string()),
    );
    filter
}
