use serde::{Deserialize, Serialize};

use super::document::DocumentId;
use crate::error::KrillError;

/// One ranked search result.
///
/// The score is the sum of the query tokens' term frequencies in the
/// document; ties rank by ascending document id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub doc_id: DocumentId,
    pub score: u64,
}

impl SearchHit {
    pub fn new(doc_id: DocumentId, score: u64) -> Self {
        Self { doc_id, score }
    }
}

/// Ranked results of one search: a finite, restartable sequence of hits.
///
/// The hit list is materialized once at query time; `iter` may be called
/// any number of times to restart iteration.
#[derive(Clone, Debug, Default)]
pub struct SearchHits {
    hits: Vec<SearchHit>,
}

impl SearchHits {
    pub(crate) fn new(hits: Vec<SearchHit>) -> Self {
        Self { hits }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SearchHit> {
        self.hits.iter()
    }

    /// Document ids in rank order.
    pub fn ids(&self) -> impl Iterator<Item = DocumentId> + '_ {
        self.hits.iter().map(|hit| hit.doc_id)
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Keep only the first `k` hits.
    pub fn truncate(&mut self, k: usize) {
        self.hits.truncate(k);
    }
}

impl IntoIterator for SearchHits {
    type Item = SearchHit;
    type IntoIter = std::vec::IntoIter<SearchHit>;

    fn into_iter(self) -> Self::IntoIter {
        self.hits.into_iter()
    }
}

impl<'a> IntoIterator for &'a SearchHits {
    type Item = &'a SearchHit;
    type IntoIter = std::slice::Iter<'a, SearchHit>;

    fn into_iter(self) -> Self::IntoIter {
        self.hits.iter()
    }
}

/// A per-item failure from a bulk indexing call.
///
/// Bulk operations continue past individual failures; the failed ids and
/// reasons are returned to the caller instead of aborting the batch.
#[derive(Debug)]
pub struct BulkFailure {
    pub doc_id: DocumentId,
    pub error: KrillError,
}
