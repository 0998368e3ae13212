use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Index configuration
#[derive(Clone, Debug)]
pub struct IndexConfig {
    pub data_dir: PathBuf,
    /// Sync the mutation log to disk after every append. Turning this off
    /// trades durability of the tail for throughput.
    pub sync_on_append: bool,
    pub tokenizer: TokenizerConfig,
}

impl IndexConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            sync_on_append: true,
            tokenizer: TokenizerConfig::default(),
        }
    }

    pub fn with_tokenizer(mut self, tokenizer: TokenizerConfig) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    pub fn with_sync_on_append(mut self, sync: bool) -> Self {
        self.sync_on_append = sync;
        self
    }

    /// Path of the append-only mutation log.
    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join("mutations.log")
    }

    /// Path of the document store snapshot.
    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join("snapshot.bin")
    }
}

/// Tokenizer configuration
///
/// Defaults match the indexing contract: lowercase, split on
/// non-alphanumeric boundaries, discard empty tokens. Stopword removal and
/// stemming are optional processors, off by default.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenizerConfig {
    pub lowercase: bool,
    pub remove_stopwords: bool,
    pub stem: bool,
    pub min_token_length: usize,
    pub max_token_length: usize,
    /// Maximum nesting depth for object-valued fields; deeper documents
    /// are rejected as malformed.
    pub max_field_depth: usize,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            lowercase: true,
            remove_stopwords: false,
            stem: false,
            min_token_length: 1,
            max_token_length: 64,
            max_field_depth: 16,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configs() {
        let tokenizer = TokenizerConfig::default();
        assert!(tokenizer.lowercase);
        assert!(!tokenizer.remove_stopwords);
        assert!(!tokenizer.stem);
        assert_eq!(tokenizer.min_token_length, 1);

        let config = IndexConfig::new("./data");
        assert!(config.sync_on_append);
        assert_eq!(config.log_path(), PathBuf::from("./data/mutations.log"));
        assert_eq!(config.snapshot_path(), PathBuf::from("./data/snapshot.bin"));
    }

    #[test]
    fn test_config_builder() {
        let config = IndexConfig::new("./data")
            .with_sync_on_append(false)
            .with_tokenizer(TokenizerConfig {
                remove_stopwords: true,
                ..TokenizerConfig::default()
            });

        assert!(!config.sync_on_append);
        assert!(config.tokenizer.remove_stopwords);
    }
}
