use serde::{Deserialize, Serialize};

/// Temperature observed at the station nearest to a queried point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureReading {
    pub temp: Option<i32>,
    pub max_temp: Option<i32>,
    pub min_temp: Option<i32>,
    pub lat: f64,
    pub lon: f64,
    pub usaf: String,
    pub wban: String,
    pub station_name: String,
}

impl TemperatureReading {
    pub fn summary(&self) -> String {
        let fmt = |t: Option<i32>| t.map_or_else(|| "n/a".to_string(), |t| format!("{}°C", t));
        format!(
            "{} ({}-{}) at {:.3}, {:.3}: mean={}, max={}, min={}",
            self.station_name,
            self.usaf,
            self.wban,
            self.lat,
            self.lon,
            fmt(self.temp),
            fmt(self.max_temp),
            fmt(self.min_temp)
        )
    }
}
