use std::collections::BTreeMap;

use crate::error::KrillError;
use crate::models::{DocumentId, Fields};
use crate::Result;

/// In-memory document store: raw field values per document id.
///
/// Owns the document lifecycle; durability comes from the mutation log and
/// snapshots, not from this structure.
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: BTreeMap<DocumentId, Fields>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore contents from a snapshot mapping.
    pub fn from_documents(documents: BTreeMap<DocumentId, Fields>) -> Self {
        Self { documents }
    }

    pub fn add(&mut self, id: DocumentId, fields: Fields) -> Result<()> {
        if self.documents.contains_key(&id) {
            return Err(KrillError::DuplicateId(id));
        }
        self.documents.insert(id, fields);
        Ok(())
    }

    /// Replace a document's fields, returning the previous fields so the
    /// caller can drop their postings.
    pub fn update(&mut self, id: DocumentId, fields: Fields) -> Result<Fields> {
        if !self.documents.contains_key(&id) {
            return Err(KrillError::NotFound(id));
        }
        Ok(self
            .documents
            .insert(id, fields)
            .unwrap_or_default())
    }

    /// Remove a document, returning its fields for posting cleanup.
    pub fn remove(&mut self, id: DocumentId) -> Result<Fields> {
        self.documents.remove(&id).ok_or(KrillError::NotFound(id))
    }

    pub fn get(&self, id: DocumentId) -> Result<&Fields> {
        self.documents.get(&id).ok_or(KrillError::NotFound(id))
    }

    pub fn contains(&self, id: DocumentId) -> bool {
        self.documents.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DocumentId, &Fields)> {
        self.documents.iter().map(|(id, fields)| (*id, fields))
    }

    /// Clone the full mapping for a snapshot.
    pub fn to_documents(&self) -> BTreeMap<DocumentId, Fields> {
        self.documents.clone()
    }
}
