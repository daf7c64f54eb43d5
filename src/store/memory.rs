use crate::error::Result;
use crate::models::document::matches_filter;
use crate::models::{Collection, Document, GeoPoint};
use crate::store::{DocumentStore, StoreError, StoreResult, ID_FIELD};
use crate::utils::coordinates::haversine_distance;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::RwLock;
use tracing::info;

#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    next_id: u64,
    collections: HashMap<Collection, Vec<Document>>,
}

/// In-process document store with great-circle nearest-point lookup on `loc`.
///
/// Contents can be loaded from and written back to a JSON snapshot so that
/// separate runs share one dataset.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Snapshot>,
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Fatal("store lock poisoned".to_string())
}

fn location_of(doc: &Document) -> Option<(f64, f64)> {
    let loc = doc.get("loc")?.as_object()?;
    Some((loc.get("lat")?.as_f64()?, loc.get("long")?.as_f64()?))
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a snapshot written by [`MemoryStore::persist`]; a missing file gives an empty store.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let snapshot: Snapshot = serde_json::from_reader(BufReader::new(File::open(path)?))?;
        info!(
            path = %path.display(),
            stations = snapshot.collections.get(&Collection::Stations).map_or(0, Vec::len),
            observations = snapshot.collections.get(&Collection::Observations).map_or(0, Vec::len),
            "loaded store snapshot"
        );
        Ok(Self {
            inner: RwLock::new(snapshot),
        })
    }

    pub fn persist(&self, path: &Path) -> Result<()> {
        let snapshot = self.inner.read().map_err(poisoned)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(&mut writer, &*snapshot)?;
        writer.flush()?;
        Ok(())
    }

    pub fn count(&self, collection: Collection) -> usize {
        self.inner
            .read()
            .map(|s| s.collections.get(&collection).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    pub fn documents(&self, collection: Collection) -> Vec<Document> {
        self.inner
            .read()
            .map(|s| s.collections.get(&collection).cloned().unwrap_or_default())
            .unwrap_or_default()
    }
}

impl DocumentStore for MemoryStore {
    fn find_one(&self, collection: Collection, filter: &Document) -> StoreResult<Option<Document>> {
        let snapshot = self.inner.read().map_err(poisoned)?;
        Ok(snapshot
            .collections
            .get(&collection)
            .and_then(|docs| docs.iter().find(|doc| matches_filter(doc, filter)))
            .cloned())
    }

    fn find_near(
        &self,
        collection: Collection,
        point: GeoPoint,
        limit: usize,
    ) -> StoreResult<Vec<Document>> {
        let snapshot = self.inner.read().map_err(poisoned)?;
        let Some(docs) = snapshot.collections.get(&collection) else {
            return Ok(Vec::new());
        };

        let mut ranked: Vec<(f64, &Document)> = docs
            .iter()
            .filter_map(|doc| {
                let (lat, long) = location_of(doc)?;
                Some((haversine_distance(point.lat, point.long, lat, long), doc))
            })
            .collect();
        ranked.sort_by(|a, b| a.0.total_cmp(&b.0));

        Ok(ranked
            .into_iter()
            .take(limit)
            .map(|(_, doc)| doc.clone())
            .collect())
    }

    fn insert_many(&self, collection: Collection, documents: Vec<Document>) -> StoreResult<()> {
        let mut snapshot = self.inner.write().map_err(poisoned)?;
        let mut next_id = snapshot.next_id;
        let target = snapshot.collections.entry(collection).or_default();
        for mut doc in documents {
            next_id += 1;
            doc.insert(ID_FIELD.to_string(), Value::from(next_id));
            target.push(doc);
        }
        snapshot.next_id = next_id;
        Ok(())
    }

    fn save(&self, collection: Collection, document: Document) -> StoreResult<()> {
        let Some(id) = document.get(ID_FIELD).cloned() else {
            return self.insert_many(collection, vec![document]);
        };

        let mut snapshot = self.inner.write().map_err(poisoned)?;
        let target = snapshot.collections.entry(collection).or_default();
        match target.iter_mut().find(|doc| doc.get(ID_FIELD) == Some(&id)) {
            Some(existing) => *existing = document,
            None => target.push(document),
        }
        Ok(())
    }
}
