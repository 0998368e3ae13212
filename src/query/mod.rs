//! Free-text query evaluation over the inverted index.

mod executor;

pub(crate) use executor::{match_count, rank, score_matches};
