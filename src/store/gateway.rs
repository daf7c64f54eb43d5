use crate::error::Result;
use crate::models::{Collection, Document, GeoPoint};
use crate::store::{DocumentStore, RetryPolicy};
use std::sync::Arc;
use tracing::debug;

/// Every store call the pipeline makes, each one wrapped in the same retry policy.
#[derive(Clone)]
pub struct StoreGateway {
    store: Arc<dyn DocumentStore>,
    retry: RetryPolicy,
}

impl StoreGateway {
    pub fn new(store: Arc<dyn DocumentStore>, retry: RetryPolicy) -> Self {
        Self { store, retry }
    }

    pub fn find_by_key(&self, collection: Collection, key: &Document) -> Result<Option<Document>> {
        self.retry
            .run("find_by_key", || self.store.find_one(collection, key))
    }

    /// Stations nearest to `point`, closest first, at most `limit` of them.
    pub fn find_near(&self, point: GeoPoint, limit: usize) -> Result<Vec<Document>> {
        self.retry.run("find_near", || {
            self.store.find_near(Collection::Stations, point, limit)
        })
    }

    /// Insert all documents in one call. An empty batch never reaches the store.
    pub fn bulk_insert(&self, collection: Collection, documents: Vec<Document>) -> Result<usize> {
        if documents.is_empty() {
            return Ok(0);
        }
        let count = documents.len();
        self.retry.run("bulk_insert", || {
            self.store.insert_many(collection, documents.clone())
        })?;
        debug!(%collection, count, "bulk insert complete");
        Ok(count)
    }

    /// Save a document that was previously read and merged in place.
    pub fn merge_and_save(&self, collection: Collection, document: Document) -> Result<()> {
        self.retry.run("merge_and_save", || {
            self.store.save(collection, document.clone())
        })
    }
}

impl std::fmt::Debug for StoreGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreGateway")
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}
