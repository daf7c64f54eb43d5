use crate::error::{ProcessingError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A schemaless document as held by the store.
pub type Document = serde_json::Map<String, Value>;

/// The two logical collections the pipeline writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Stations,
    Observations,
}

impl Collection {
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Stations => "stations",
            Collection::Observations => "observations",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A record that can be persisted and found again by its logical identity.
pub trait Keyed: Serialize {
    const COLLECTION: Collection;

    /// Exact-match filter on the identity fields of this record.
    fn identity(&self) -> Document;

    fn to_document(&self) -> Result<Document> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(ProcessingError::InvalidFormat(format!(
                "{} record did not serialise to an object: {}",
                Self::COLLECTION,
                other
            ))),
        }
    }
}

/// Overlay `update` onto `target`: keys in `update` win, keys absent from it are kept.
pub fn merge_into(target: &mut Document, update: Document) {
    for (key, value) in update {
        target.insert(key, value);
    }
}

/// True when every key of `filter` is present in `doc` with an equal value.
pub fn matches_filter(doc: &Document, filter: &Document) -> bool {
    filter
        .iter()
        .all(|(key, expected)| doc.get(key) == Some(expected))
}

/// Stable string form of an identity filter, usable as a map key.
pub fn identity_key(filter: &Document) -> String {
    let mut parts: Vec<String> = filter
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect();
    parts.sort();
    parts.join("|")
}
