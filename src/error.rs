use thiserror::Error;

use crate::models::DocumentId;

/// Main error type for Krill operations
#[derive(Error, Debug)]
pub enum KrillError {
    #[error("duplicate document id: {0}")]
    DuplicateId(DocumentId),

    #[error("document not found: {0}")]
    NotFound(DocumentId),

    #[error("malformed field '{field}': {reason}")]
    MalformedField { field: String, reason: String },

    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("corrupt mutation log record at offset {offset}")]
    CorruptLog { offset: u64 },

    #[error("snapshot error: incompatible version {actual}, expected <= {expected}")]
    IncompatibleSnapshot { expected: u32, actual: u32 },
}

/// Result type alias for Krill operations
pub type Result<T> = std::result::Result<T, KrillError>;

impl KrillError {
    /// Fatal errors abort an in-flight bulk operation instead of being
    /// collected as a per-item failure.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            KrillError::Storage(_) | KrillError::Serialization(_) | KrillError::CorruptLog { .. }
        )
    }

    pub(crate) fn malformed_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        KrillError::MalformedField {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
