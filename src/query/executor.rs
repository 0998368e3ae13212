use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

use crate::models::{DocumentId, PostingList, SearchHit};

/// Accumulate term-frequency sums for every document matching at least one
/// query term (OR semantics).
pub(crate) fn score_matches(
    postings: &HashMap<String, PostingList>,
    terms: &[String],
) -> HashMap<DocumentId, u64> {
    let mut scores: HashMap<DocumentId, u64> = HashMap::new();
    for term in terms {
        if let Some(list) = postings.get(term) {
            for (doc_id, tf) in list.iter() {
                *scores.entry(doc_id).or_insert(0) += u64::from(tf);
            }
        }
    }
    scores
}

/// Order scored matches by descending score, ties by ascending document id.
pub(crate) fn rank(scores: HashMap<DocumentId, u64>) -> Vec<SearchHit> {
    let mut hits: Vec<SearchHit> = scores
        .into_iter()
        .map(|(doc_id, score)| SearchHit::new(doc_id, score))
        .collect();
    hits.sort_by_key(|hit| (Reverse(hit.score), hit.doc_id));
    hits
}

/// Count matching documents without building the ranked result list.
pub(crate) fn match_count(postings: &HashMap<String, PostingList>, terms: &[String]) -> usize {
    let mut seen: HashSet<DocumentId> = HashSet::new();
    for term in terms {
        if let Some(list) = postings.get(term) {
            seen.extend(list.iter().map(|(doc_id, _)| doc_id));
        }
    }
    seen.len()
}
