pub mod document;
pub mod mutation;
pub mod search;

pub use document::{fields_from_json, DocumentId, FieldValue, Fields, PostingList};
pub use mutation::Mutation;
pub use search::{BulkFailure, SearchHit, SearchHits};
