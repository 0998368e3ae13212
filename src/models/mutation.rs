use serde::{Deserialize, Serialize};

use super::document::{DocumentId, Fields};

/// A single document store mutation.
///
/// One record is appended to the mutation log per successful mutation,
/// before the in-memory index is considered durable-committed. The same
/// type is replayed on startup to rebuild state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Mutation {
    Add { id: DocumentId, fields: Fields },
    Update { id: DocumentId, fields: Fields },
    Delete { id: DocumentId },
}

impl Mutation {
    /// Human-readable operation name (for logging)
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::Add { .. } => "Add",
            Mutation::Update { .. } => "Update",
            Mutation::Delete { .. } => "Delete",
        }
    }

    pub fn doc_id(&self) -> DocumentId {
        match self {
            Mutation::Add { id, .. } | Mutation::Update { id, .. } | Mutation::Delete { id } => *id,
        }
    }
}
