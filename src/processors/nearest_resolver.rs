use crate::error::Result;
use crate::models::{observation_filter, Collection, Document, GeoPoint, TemperatureReading};
use crate::store::StoreGateway;
use crate::utils::constants::DEFAULT_NEIGHBOR_LIMIT;
use crate::utils::coordinates::clamp_coordinate;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct StationRef {
    usaf: String,
    #[serde(default)]
    wban: String,
    #[serde(default)]
    station_name: String,
    loc: GeoPoint,
}

/// Temperatures as stored. Older loaders wrote whole degrees as floats (`8.0`),
/// so any JSON number is accepted and rounded.
#[derive(Debug, Deserialize)]
struct ObservedTemperatures {
    #[serde(default)]
    temp: Option<f64>,
    #[serde(default)]
    max_temp: Option<f64>,
    #[serde(default)]
    min_temp: Option<f64>,
}

fn whole_degrees(value: Option<f64>) -> Option<i32> {
    value.map(|v| v.round_ties_even() as i32)
}

/// Answers "what was the temperature near here on this day".
///
/// Stations are tried closest first and the first one that has an observation
/// for the date wins, even if a slightly farther station has more complete data.
/// There is no widening of the search beyond the neighbour limit; one nearest
/// query plus at most `neighbor_limit` key lookups bounds the latency.
#[derive(Debug, Clone)]
pub struct NearestObservationResolver {
    gateway: StoreGateway,
    neighbor_limit: usize,
}

impl NearestObservationResolver {
    pub fn new(gateway: StoreGateway) -> Self {
        Self {
            gateway,
            neighbor_limit: DEFAULT_NEIGHBOR_LIMIT,
        }
    }

    pub fn with_neighbor_limit(mut self, neighbor_limit: usize) -> Self {
        self.neighbor_limit = neighbor_limit;
        self
    }

    pub fn resolve(&self, point: GeoPoint, date: NaiveDate) -> Result<Option<TemperatureReading>> {
        let point = GeoPoint::new(clamp_coordinate(point.lat), clamp_coordinate(point.long));
        let candidates = self.gateway.find_near(point, self.neighbor_limit)?;

        for candidate in candidates {
            let Some(station) = parse_station(candidate) else {
                continue;
            };

            let filter = observation_filter(&station.usaf, &station.wban, date);
            let Some(observation) = self.gateway.find_by_key(Collection::Observations, &filter)?
            else {
                debug!(usaf = %station.usaf, wban = %station.wban, %date, "no observation, trying next station");
                continue;
            };

            let temps: ObservedTemperatures = match serde_json::from_value(Value::Object(observation)) {
                Ok(temps) => temps,
                Err(e) => {
                    warn!(usaf = %station.usaf, wban = %station.wban, %date, error = %e,
                        "ignoring malformed observation document");
                    continue;
                }
            };

            return Ok(Some(TemperatureReading {
                temp: whole_degrees(temps.temp),
                max_temp: whole_degrees(temps.max_temp),
                min_temp: whole_degrees(temps.min_temp),
                lat: station.loc.lat,
                lon: station.loc.long,
                usaf: station.usaf,
                wban: station.wban,
                station_name: station.station_name,
            }));
        }

        Ok(None)
    }
}

fn parse_station(document: Document) -> Option<StationRef> {
    match serde_json::from_value(Value::Object(document)) {
        Ok(station) => Some(station),
        Err(e) => {
            warn!(error = %e, "ignoring malformed station document");
            None
        }
    }
}
