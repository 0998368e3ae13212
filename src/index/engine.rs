use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::config::IndexConfig;
use crate::error::KrillError;
use crate::index::doc_store::DocumentStore;
use crate::models::{BulkFailure, DocumentId, Fields, Mutation, PostingList, SearchHits};
use crate::persistence::{MutationLog, StoreSnapshot};
use crate::query;
use crate::tokenizer::Tokenizer;
use crate::Result;

/// Embeddable search index: document store, inverted index, query engine
/// and mutation log behind one owned handle with an explicit lifecycle.
///
/// Single-writer / multiple-reader: each mutation holds the exclusive lock
/// for one operation; queries hold the shared lock. Lock hold time is
/// bounded by one document's token set.
pub struct SearchIndex {
    state: RwLock<IndexState>,
    log: MutationLog,
    tokenizer: Tokenizer,
    config: IndexConfig,
    next_seq: AtomicU64,
}

struct IndexState {
    docs: DocumentStore,
    postings: HashMap<String, PostingList>,
    /// Highest mutation log sequence number applied to this state.
    last_seq: u64,
}

/// Token work computed before a mutation touches any state, so the log
/// append and in-memory apply cannot fail halfway through.
struct PreparedMutation {
    new_freqs: Option<HashMap<String, u32>>,
    old_terms: Option<Vec<String>>,
}

impl SearchIndex {
    /// Open (or create) an index at `config.data_dir`.
    ///
    /// Loads the snapshot if one exists, rebuilds postings by re-tokenizing
    /// the restored documents, then replays mutation log records past the
    /// snapshot's sequence number.
    pub fn open(config: IndexConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir).map_err(KrillError::Storage)?;
        let tokenizer = Tokenizer::new(&config.tokenizer);

        let snapshot = StoreSnapshot::read_from(&config.snapshot_path())?;
        let snapshot_seq = snapshot.as_ref().map(|s| s.last_seq).unwrap_or(0);
        let docs =
            DocumentStore::from_documents(snapshot.map(|s| s.documents).unwrap_or_default());

        let mut state = IndexState {
            docs,
            postings: HashMap::new(),
            last_seq: snapshot_seq,
        };

        {
            let IndexState {
                docs, postings, ..
            } = &mut state;
            for (id, fields) in docs.iter() {
                match tokenizer.compute_term_frequencies(fields) {
                    Ok(freqs) => Self::insert_postings(postings, id, &freqs),
                    Err(e) => {
                        warn!(doc_id = id, error = %e, "skipping postings for unreadable document")
                    }
                }
            }
        }

        let log = MutationLog::open(config.log_path(), config.sync_on_append)?;
        let mut max_seq = snapshot_seq;
        let mut replayed = 0usize;
        for (seq, mutation) in log.replay()? {
            max_seq = max_seq.max(seq);
            if seq <= snapshot_seq {
                continue;
            }
            let applied = Self::prepare(&state, &tokenizer, &mutation)
                .and_then(|prepared| Self::apply(&mut state, &mutation, prepared, seq));
            match applied {
                Ok(()) => replayed += 1,
                Err(e) => warn!(
                    seq,
                    op = mutation.name(),
                    doc_id = mutation.doc_id(),
                    error = %e,
                    "skipping unreplayable log record"
                ),
            }
        }

        info!(
            documents = state.docs.len(),
            terms = state.postings.len(),
            replayed,
            "index opened"
        );

        Ok(Self {
            state: RwLock::new(state),
            log,
            tokenizer,
            config,
            next_seq: AtomicU64::new(max_seq + 1),
        })
    }

    /// Index a new document. Fails with `DuplicateId` if the id exists.
    pub fn add(&self, id: DocumentId, fields: Fields) -> Result<()> {
        let mut state = self.state.write();
        self.commit(&mut state, Mutation::Add { id, fields })
    }

    /// Replace an existing document's fields. Fails with `NotFound` if the
    /// id is absent. Old postings are removed before new ones are inserted.
    pub fn update(&self, id: DocumentId, fields: Fields) -> Result<()> {
        let mut state = self.state.write();
        self.commit(&mut state, Mutation::Update { id, fields })
    }

    /// Remove a document and all of its postings.
    pub fn delete(&self, id: DocumentId) -> Result<()> {
        let mut state = self.state.write();
        self.commit(&mut state, Mutation::Delete { id })
    }

    /// Add or replace a document in one exclusive critical section.
    pub fn upsert(&self, id: DocumentId, fields: Fields) -> Result<()> {
        let mut state = self.state.write();
        let mutation = if state.docs.contains(id) {
            Mutation::Update { id, fields }
        } else {
            Mutation::Add { id, fields }
        };
        self.commit(&mut state, mutation)
    }

    /// Index a batch of documents in caller-supplied order, upserting each.
    ///
    /// Individual failures do not abort the batch; the failed ids and
    /// reasons are returned. Fatal storage errors abort immediately.
    pub fn bulk_index(
        &self,
        items: impl IntoIterator<Item = (DocumentId, Fields)>,
    ) -> Result<Vec<BulkFailure>> {
        self.bulk_index_cancellable(items, &AtomicBool::new(false))
    }

    /// Like [`bulk_index`](Self::bulk_index), checking `cancel` between
    /// items. Items committed before cancellation remain committed; there
    /// is no rollback.
    pub fn bulk_index_cancellable(
        &self,
        items: impl IntoIterator<Item = (DocumentId, Fields)>,
        cancel: &AtomicBool,
    ) -> Result<Vec<BulkFailure>> {
        let mut failures = Vec::new();
        // One exclusive critical section per item, not per batch, so
        // concurrent readers see bounded staleness.
        for (id, fields) in items {
            if cancel.load(Ordering::SeqCst) {
                info!("bulk indexing cancelled between items");
                break;
            }
            match self.upsert(id, fields) {
                Ok(()) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!(doc_id = id, error = %e, "bulk item failed");
                    failures.push(BulkFailure { doc_id: id, error: e });
                }
            }
        }
        Ok(failures)
    }

    /// Fetch a document's stored fields.
    pub fn get(&self, id: DocumentId) -> Result<Fields> {
        self.state.read().docs.get(id).map(|fields| fields.clone())
    }

    pub fn contains(&self, id: DocumentId) -> bool {
        self.state.read().docs.contains(id)
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.state.read().docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().docs.is_empty()
    }

    /// Number of distinct indexed terms.
    pub fn term_count(&self) -> usize {
        self.state.read().postings.len()
    }

    /// Free-text search: OR semantics over the query's tokens, ranked by
    /// descending term-frequency sum, ties by ascending document id.
    pub fn search(&self, query: &str) -> SearchHits {
        let terms = self.tokenizer.query_terms(query);
        let scores = {
            let state = self.state.read();
            query::score_matches(&state.postings, &terms)
        };
        SearchHits::new(query::rank(scores))
    }

    /// Search truncated to the `k` best hits.
    pub fn search_top_k(&self, query: &str, k: usize) -> SearchHits {
        let mut hits = self.search(query);
        hits.truncate(k);
        hits
    }

    /// Number of matching documents, without building the ranked list.
    pub fn count(&self, query: &str) -> usize {
        let terms = self.tokenizer.query_terms(query);
        let state = self.state.read();
        query::match_count(&state.postings, &terms)
    }

    /// Write a snapshot of the document store and truncate the mutation
    /// log. Readers are blocked only for the duration of the write.
    pub fn checkpoint(&self) -> Result<()> {
        let state = self.state.read();
        let snapshot = StoreSnapshot::new(state.docs.to_documents(), state.last_seq);
        snapshot.write_to(&self.config.snapshot_path())?;
        self.log.reset()?;
        info!(
            documents = state.docs.len(),
            last_seq = state.last_seq,
            "checkpoint complete"
        );
        Ok(())
    }

    /// Checkpoint and release the index.
    pub fn close(self) -> Result<()> {
        self.checkpoint()
    }

    fn commit(&self, state: &mut IndexState, mutation: Mutation) -> Result<()> {
        let prepared = Self::prepare(state, &self.tokenizer, &mutation)?;
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        // The log record precedes the in-memory apply: a mutation is
        // durable-committed only once it is on disk.
        self.log.append(seq, &mutation)?;
        Self::apply(state, &mutation, prepared, seq)?;
        debug!(
            seq,
            op = mutation.name(),
            doc_id = mutation.doc_id(),
            "mutation committed"
        );
        Ok(())
    }

    /// Validate a mutation and tokenize everything it needs, before any
    /// state is touched.
    fn prepare(
        state: &IndexState,
        tokenizer: &Tokenizer,
        mutation: &Mutation,
    ) -> Result<PreparedMutation> {
        match mutation {
            Mutation::Add { id, fields } => {
                if state.docs.contains(*id) {
                    return Err(KrillError::DuplicateId(*id));
                }
                Ok(PreparedMutation {
                    new_freqs: Some(tokenizer.compute_term_frequencies(fields)?),
                    old_terms: None,
                })
            }
            Mutation::Update { id, fields } => {
                let old = state.docs.get(*id)?;
                let old_freqs = tokenizer.compute_term_frequencies(old)?;
                Ok(PreparedMutation {
                    new_freqs: Some(tokenizer.compute_term_frequencies(fields)?),
                    old_terms: Some(old_freqs.into_keys().collect()),
                })
            }
            Mutation::Delete { id } => {
                let old = state.docs.get(*id)?;
                let old_freqs = tokenizer.compute_term_frequencies(old)?;
                Ok(PreparedMutation {
                    new_freqs: None,
                    old_terms: Some(old_freqs.into_keys().collect()),
                })
            }
        }
    }

    fn apply(
        state: &mut IndexState,
        mutation: &Mutation,
        prepared: PreparedMutation,
        seq: u64,
    ) -> Result<()> {
        match mutation {
            Mutation::Add { id, fields } => {
                state.docs.add(*id, fields.clone())?;
                if let Some(freqs) = &prepared.new_freqs {
                    Self::insert_postings(&mut state.postings, *id, freqs);
                }
            }
            Mutation::Update { id, fields } => {
                state.docs.update(*id, fields.clone())?;
                if let Some(old_terms) = &prepared.old_terms {
                    Self::remove_postings(&mut state.postings, *id, old_terms);
                }
                if let Some(freqs) = &prepared.new_freqs {
                    Self::insert_postings(&mut state.postings, *id, freqs);
                }
            }
            Mutation::Delete { id } => {
                state.docs.remove(*id)?;
                if let Some(old_terms) = &prepared.old_terms {
                    Self::remove_postings(&mut state.postings, *id, old_terms);
                }
            }
        }
        state.last_seq = seq;
        Ok(())
    }

    fn insert_postings(
        postings: &mut HashMap<String, PostingList>,
        id: DocumentId,
        freqs: &HashMap<String, u32>,
    ) {
        for (term, tf) in freqs {
            postings.entry(term.clone()).or_default().insert(id, *tf);
        }
    }

    fn remove_postings(
        postings: &mut HashMap<String, PostingList>,
        id: DocumentId,
        terms: &[String],
    ) {
        for term in terms {
            if let Some(list) = postings.get_mut(term) {
                list.remove(id);
                // No dangling ids and no empty posting lists
                if list.is_empty() {
                    postings.remove(term);
                }
            }
        }
    }
}
