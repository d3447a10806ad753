use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::core::{DbError, Document, Result};
use crate::storage::Collection;

/// The in-memory document store: named collections under one lock.
///
/// The lock is held only for map access; document scans run against
/// copy-on-write snapshots taken while the lock is held, never across an
/// await point.
#[derive(Clone, Default)]
pub struct Store {
    collections: Arc<RwLock<HashMap<String, Collection>>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty collection. A no-op when it already exists.
    pub fn create_collection(&self, ns: &str) -> Result<()> {
        let mut collections = self.collections.write()?;
        collections.entry(ns.to_string()).or_default();
        Ok(())
    }

    /// Append a document, creating the collection on first use.
    pub fn save(&self, ns: &str, doc: Document) -> Result<()> {
        let mut collections = self.collections.write()?;
        collections.entry(ns.to_string()).or_default().save(doc);
        Ok(())
    }

    /// Remove a collection and its documents. Returns whether it existed.
    pub fn drop_collection(&self, ns: &str) -> Result<bool> {
        let mut collections = self.collections.write()?;
        Ok(collections.remove(ns).is_some())
    }

    /// Snapshot a collection's documents for scanning.
    pub fn snapshot(&self, ns: &str) -> Result<Arc<Vec<Document>>> {
        let collections = self.collections.read()?;
        collections
            .get(ns)
            .map(Collection::snapshot)
            .ok_or_else(|| DbError::CollectionNotFound(ns.to_string()))
    }

    pub fn record_count(&self, ns: &str) -> Result<usize> {
        let collections = self.collections.read()?;
        collections
            .get(ns)
            .map(Collection::len)
            .ok_or_else(|| DbError::CollectionNotFound(ns.to_string()))
    }

    pub fn collection_exists(&self, ns: &str) -> Result<bool> {
        Ok(self.collections.read()?.contains_key(ns))
    }
}
