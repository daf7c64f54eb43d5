use crate::models::document::{Collection, Document, Keyed};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

/// Geographic point as stored on `stations.loc`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
pub struct GeoPoint {
    #[validate(range(min = -179.999, max = 179.999))]
    pub lat: f64,

    #[validate(range(min = -179.999, max = 179.999))]
    pub long: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, long: f64) -> Self {
        Self { lat, long }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Station {
    #[validate(length(min = 1))]
    pub usaf: String,

    /// Empty when the station has no WBAN number.
    pub wban: String,

    pub station_name: String,
    pub country: String,
    pub fips: String,
    pub state: String,
    pub call: String,

    #[validate(nested)]
    pub loc: GeoPoint,

    /// Metres above sea level.
    pub elevation: Option<f64>,
    pub begin: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl Keyed for Station {
    const COLLECTION: Collection = Collection::Stations;

    fn identity(&self) -> Document {
        let mut filter = Document::new();
        filter.insert("usaf".to_string(), Value::String(self.usaf.clone()));
        filter.insert("wban".to_string(), Value::String(self.wban.clone()));
        filter
    }
}
