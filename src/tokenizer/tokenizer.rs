use std::collections::{HashMap, HashSet};

use rust_stemmers::{Algorithm, Stemmer};
use stop_words::{get, LANGUAGE};

use crate::config::TokenizerConfig;
use crate::error::KrillError;
use crate::models::{FieldValue, Fields};
use crate::Result;

/// Text tokenizer with optional stemming and stopword removal
pub struct Tokenizer {
    config: TokenizerConfig,
    stemmer: Option<Stemmer>,
    stopwords: HashSet<String>,
}

impl Tokenizer {
    /// Create a new tokenizer from configuration
    pub fn new(config: &TokenizerConfig) -> Self {
        let stemmer = if config.stem {
            Some(Stemmer::create(Algorithm::English))
        } else {
            None
        };

        let stopwords = if config.remove_stopwords {
            get(LANGUAGE::English)
                .into_iter()
                .map(|s| s.to_lowercase())
                .collect()
        } else {
            HashSet::new()
        };

        Self {
            config: config.clone(),
            stemmer,
            stopwords,
        }
    }

    /// Tokenize text into a vector of terms.
    ///
    /// Splits on non-alphanumeric boundaries and discards empty tokens;
    /// lowercasing, length limits, stopwords and stemming follow the
    /// configuration.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|raw| !raw.is_empty())
            .map(|raw| {
                if self.config.lowercase {
                    raw.to_lowercase()
                } else {
                    raw.to_string()
                }
            })
            .filter(|token| {
                token.len() >= self.config.min_token_length
                    && token.len() <= self.config.max_token_length
                    && !self.stopwords.contains(token)
            })
            .map(|token| match &self.stemmer {
                Some(stemmer) => stemmer.stem(&token).to_string(),
                None => token,
            })
            .collect()
    }

    /// Tokenize a query, deduplicating terms while preserving first-seen
    /// order. Duplicate query tokens must not double-count in scores.
    pub fn query_terms(&self, text: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        self.tokenize(text)
            .into_iter()
            .filter(|t| seen.insert(t.clone()))
            .collect()
    }

    /// Compute term frequencies across all of a document's fields.
    ///
    /// Nested objects are flattened recursively, list entries are unioned.
    /// Rejects empty field names and nesting deeper than the configured
    /// maximum as malformed, before any tokens are produced.
    pub fn compute_term_frequencies(&self, fields: &Fields) -> Result<HashMap<String, u32>> {
        let mut freqs = HashMap::new();
        self.walk_fields(fields, 1, &mut freqs)?;
        Ok(freqs)
    }

    fn walk_fields(
        &self,
        fields: &Fields,
        depth: usize,
        freqs: &mut HashMap<String, u32>,
    ) -> Result<()> {
        if depth > self.config.max_field_depth {
            return Err(KrillError::malformed_field(
                "",
                format!("nesting exceeds maximum depth {}", self.config.max_field_depth),
            ));
        }
        for (name, value) in fields {
            if name.is_empty() {
                return Err(KrillError::malformed_field(name, "empty field name"));
            }
            match value {
                FieldValue::Text(text) => self.accumulate(text, freqs),
                FieldValue::List(items) => {
                    for item in items {
                        self.accumulate(item, freqs);
                    }
                }
                FieldValue::Object(nested) => self.walk_fields(nested, depth + 1, freqs)?,
            }
        }
        Ok(())
    }

    fn accumulate(&self, text: &str, freqs: &mut HashMap<String, u32>) {
        for token in self.tokenize(text) {
            *freqs.entry(token).or_insert(0) += 1;
        }
    }
}
