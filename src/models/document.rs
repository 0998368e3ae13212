use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::KrillError;
use crate::Result;

/// Unique document identifier, assigned by the caller and stable for the
/// document's lifetime.
pub type DocumentId = u64;

/// Field name to value mapping for one document.
pub type Fields = BTreeMap<String, FieldValue>;

/// A single field value.
///
/// Content items carry arbitrary per-document schemas, so values are a
/// tagged variant rather than a fixed struct. Nested objects are flattened
/// recursively during tokenization; list entries are unioned.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
    Object(Fields),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldValue::List(items.into_iter().map(Into::into).collect())
    }

    pub fn object<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, FieldValue)>,
        S: Into<String>,
    {
        FieldValue::Object(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

/// Convert a JSON object into document fields.
///
/// Strings map to `Text`, arrays of strings to `List`, objects to `Object`.
/// Anything else (numbers, booleans, null, mixed arrays) is rejected as a
/// malformed field.
pub fn fields_from_json(value: serde_json::Value) -> Result<Fields> {
    let serde_json::Value::Object(map) = value else {
        return Err(KrillError::malformed_field("", "expected a JSON object"));
    };
    let mut fields = Fields::new();
    for (name, value) in map {
        let converted = field_value_from_json(&name, value)?;
        fields.insert(name, converted);
    }
    Ok(fields)
}

fn field_value_from_json(field: &str, value: serde_json::Value) -> Result<FieldValue> {
    match value {
        serde_json::Value::String(s) => Ok(FieldValue::Text(s)),
        serde_json::Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    serde_json::Value::String(s) => out.push(s),
                    _ => {
                        return Err(KrillError::malformed_field(
                            field,
                            "list entries must be strings",
                        ))
                    }
                }
            }
            Ok(FieldValue::List(out))
        }
        serde_json::Value::Object(map) => {
            let mut fields = Fields::new();
            for (name, value) in map {
                let converted = field_value_from_json(&name, value)?;
                fields.insert(name, converted);
            }
            Ok(FieldValue::Object(fields))
        }
        _ => Err(KrillError::malformed_field(
            field,
            "value must be a string, list of strings, or object",
        )),
    }
}

/// Inverted index entry: the documents containing one normalized token,
/// ordered by id, with per-document term frequency.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PostingList {
    entries: BTreeMap<DocumentId, u32>,
}

impl PostingList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a document with its term frequency, replacing any previous
    /// frequency for the same id.
    pub fn insert(&mut self, doc_id: DocumentId, frequency: u32) {
        self.entries.insert(doc_id, frequency);
    }

    pub fn remove(&mut self, doc_id: DocumentId) {
        self.entries.remove(&doc_id);
    }

    pub fn contains(&self, doc_id: DocumentId) -> bool {
        self.entries.contains_key(&doc_id)
    }

    pub fn term_frequency(&self, doc_id: DocumentId) -> Option<u32> {
        self.entries.get(&doc_id).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of documents containing this term.
    pub fn document_frequency(&self) -> usize {
        self.entries.len()
    }

    /// Iterate (doc id, term frequency) pairs in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (DocumentId, u32)> + '_ {
        self.entries.iter().map(|(id, tf)| (*id, *tf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_posting_list_operations() {
        let mut posting = PostingList::new();
        assert!(posting.is_empty());

        posting.insert(2, 3);
        posting.insert(1, 5);
        assert_eq!(posting.document_frequency(), 2);
        assert_eq!(posting.term_frequency(1), Some(5));

        // Iteration is ordered by id regardless of insertion order
        let ids: Vec<DocumentId> = posting.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![1, 2]);

        posting.remove(1);
        assert_eq!(posting.document_frequency(), 1);
        assert!(posting.term_frequency(1).is_none());
    }

    #[test]
    fn test_posting_list_insert_replaces_frequency() {
        let mut posting = PostingList::new();
        posting.insert(1, 2);
        posting.insert(1, 7);
        assert_eq!(posting.document_frequency(), 1);
        assert_eq!(posting.term_frequency(1), Some(7));
    }

    #[test]
    fn test_fields_from_json() {
        let fields = fields_from_json(serde_json::json!({
            "title": "batman",
            "nemesis": { "value": "joker" },
            "cohorts": ["riddler", "penguin"],
        }))
        .unwrap();

        assert_eq!(fields.get("title"), Some(&FieldValue::text("batman")));
        assert_eq!(
            fields.get("nemesis"),
            Some(&FieldValue::object([("value", FieldValue::text("joker"))]))
        );
        assert_eq!(
            fields.get("cohorts"),
            Some(&FieldValue::list(["riddler", "penguin"]))
        );
    }

    #[test]
    fn test_fields_from_json_rejects_non_text_values() {
        assert!(fields_from_json(serde_json::json!({ "count": 3 })).is_err());
        assert!(fields_from_json(serde_json::json!({ "flags": [1, 2] })).is_err());
        assert!(fields_from_json(serde_json::json!("not an object")).is_err());
    }
}
