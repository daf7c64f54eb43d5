pub mod gateway;
pub mod memory;
pub mod retry;

pub use gateway::StoreGateway;
pub use memory::MemoryStore;
pub use retry::RetryPolicy;

use crate::error::ProcessingError;
use crate::models::{Collection, Document, GeoPoint};
use thiserror::Error;

/// Field holding the store-assigned document id.
pub const ID_FIELD: &str = "_id";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Connectivity was lost; the same call may succeed later.
    #[error("transient store failure: {0}")]
    Transient(String),

    #[error("store failure: {0}")]
    Fatal(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

impl From<StoreError> for ProcessingError {
    fn from(err: StoreError) -> Self {
        ProcessingError::Store(err.to_string())
    }
}

/// The document store the pipeline persists into.
///
/// Implementations own their connection; one handle is created per process and
/// shared behind an `Arc`.
pub trait DocumentStore: Send + Sync {
    /// First document whose fields equal every field of `filter`.
    fn find_one(&self, collection: Collection, filter: &Document) -> StoreResult<Option<Document>>;

    /// Documents ordered by increasing distance of their `loc` from `point`.
    fn find_near(
        &self,
        collection: Collection,
        point: GeoPoint,
        limit: usize,
    ) -> StoreResult<Vec<Document>>;

    fn insert_many(&self, collection: Collection, documents: Vec<Document>) -> StoreResult<()>;

    /// Replace the document with the same `_id`, or insert it when it has none.
    fn save(&self, collection: Collection, document: Document) -> StoreResult<()>;
}
