pub mod batch_ingester;
pub mod nearest_resolver;

pub use batch_ingester::{BatchIngester, DryRunAccounting, IngestMode, IngestSummary};
pub use nearest_resolver::NearestObservationResolver;
