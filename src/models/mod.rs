pub mod document;
pub mod observation;
pub mod reading;
pub mod station;

pub use document::{Collection, Document, Keyed};
pub use observation::{observation_filter, ObservationRecord};
pub use reading::TemperatureReading;
pub use station::{GeoPoint, Station};
