use std::sync::Arc;

use crate::core::Document;

/// A named set of documents.
///
/// Documents live behind an `Arc` that is swapped copy-on-write: readers
/// clone the `Arc` and scan without holding any lock, so a scan can suspend
/// at cancellation checkpoints while writers keep making progress.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    docs: Arc<Vec<Document>>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save(&mut self, doc: Document) {
        let mut next = (*self.docs).clone();
        next.push(doc);
        self.docs = Arc::new(next);
    }

    /// Point-in-time snapshot; later writes do not affect it.
    pub fn snapshot(&self) -> Arc<Vec<Document>> {
        Arc::clone(&self.docs)
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}
