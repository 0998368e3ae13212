pub mod config;
pub mod error;
pub mod index;
pub mod models;
pub mod persistence;
pub mod query;
pub mod tokenizer;

pub use config::{IndexConfig, TokenizerConfig};
pub use error::{KrillError, Result};
pub use index::SearchIndex;
pub use models::*;
pub use tokenizer::Tokenizer;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
