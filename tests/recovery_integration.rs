//! Crash-recovery tests: mutation log replay, checkpoints and restarts.

use krill::models::fields_from_json;
use krill::{DocumentId, Fields, IndexConfig, SearchIndex};
use tempfile::TempDir;

fn fields(json: serde_json::Value) -> Fields {
    fields_from_json(json).unwrap()
}

fn populate(index: &SearchIndex) {
    index
        .add(
            1,
            fields(serde_json::json!({
                "title": "batman",
                "nemesis": { "value": "joker" },
            })),
        )
        .unwrap();
    index
        .add(2, fields(serde_json::json!({ "title": "robin" })))
        .unwrap();
    index
        .add(
            3,
            fields(serde_json::json!({
                "title": "catwoman",
                "cohorts": ["riddler", "penguin"],
            })),
        )
        .unwrap();
}

fn assert_fully_indexed(index: &SearchIndex) {
    assert_eq!(index.len(), 3);
    assert_eq!(index.search("batman").ids().collect::<Vec<_>>(), vec![1]);
    assert_eq!(index.search("joker").ids().collect::<Vec<_>>(), vec![1]);
    assert_eq!(index.search("robin").ids().collect::<Vec<_>>(), vec![2]);
    assert_eq!(index.search("riddler").ids().collect::<Vec<_>>(), vec![3]);
}

#[test]
fn test_log_replay_rebuilds_state() {
    let tmp = TempDir::new().unwrap();
    let config = IndexConfig::new(tmp.path());

    let term_count = {
        let index = SearchIndex::open(config.clone()).unwrap();
        populate(&index);
        index.term_count()
        // Dropped without close(): recovery must come from the log alone
    };

    let index = SearchIndex::open(config).unwrap();
    assert_fully_indexed(&index);
    // Replay reproduces identical postings, not just identical documents
    assert_eq!(index.term_count(), term_count);
}

#[test]
fn test_replay_preserves_updates_and_deletes() {
    let tmp = TempDir::new().unwrap();
    let config = IndexConfig::new(tmp.path());

    {
        let index = SearchIndex::open(config.clone()).unwrap();
        populate(&index);
        index
            .update(1, fields(serde_json::json!({ "title": "nightwing" })))
            .unwrap();
        index.delete(3).unwrap();
    }

    let index = SearchIndex::open(config).unwrap();
    assert_eq!(index.len(), 2);
    assert!(index.search("batman").is_empty());
    assert!(index.search("joker").is_empty());
    assert!(index.search("catwoman").is_empty());
    assert!(index.search("riddler").is_empty());
    assert_eq!(index.search("nightwing").ids().collect::<Vec<_>>(), vec![1]);
    assert_eq!(index.search("robin").ids().collect::<Vec<_>>(), vec![2]);
}

#[test]
fn test_checkpoint_then_more_mutations() {
    let tmp = TempDir::new().unwrap();
    let config = IndexConfig::new(tmp.path());

    {
        let index = SearchIndex::open(config.clone()).unwrap();
        populate(&index);
        index.checkpoint().unwrap();
        // Mutations after the checkpoint live only in the log
        index
            .add(4, fields(serde_json::json!({ "title": "batgirl" })))
            .unwrap();
        index.delete(2).unwrap();
    }

    let index = SearchIndex::open(config).unwrap();
    assert_eq!(index.len(), 3);
    assert_eq!(index.search("batgirl").ids().collect::<Vec<_>>(), vec![4]);
    assert!(index.search("robin").is_empty());
    assert_eq!(index.search("batman").ids().collect::<Vec<_>>(), vec![1]);
}

#[test]
fn test_close_checkpoints_and_truncates_log() {
    let tmp = TempDir::new().unwrap();
    let config = IndexConfig::new(tmp.path());

    {
        let index = SearchIndex::open(config.clone()).unwrap();
        populate(&index);
        index.close().unwrap();
    }

    // After a clean close, everything lives in the snapshot
    let log_len = std::fs::metadata(config.log_path()).unwrap().len();
    assert_eq!(log_len, 0);
    assert!(config.snapshot_path().exists());

    let index = SearchIndex::open(config).unwrap();
    assert_fully_indexed(&index);
}

#[test]
fn test_restart_roundtrip_is_idempotent() {
    let tmp = TempDir::new().unwrap();
    let config = IndexConfig::new(tmp.path());

    {
        let index = SearchIndex::open(config.clone()).unwrap();
        populate(&index);
    }

    // Several restart cycles without new mutations must not change state
    for _ in 0..3 {
        let index = SearchIndex::open(config.clone()).unwrap();
        assert_fully_indexed(&index);
    }
}

#[test]
fn test_mutations_after_recovery_get_fresh_sequence_numbers() {
    let tmp = TempDir::new().unwrap();
    let config = IndexConfig::new(tmp.path());

    {
        let index = SearchIndex::open(config.clone()).unwrap();
        populate(&index);
    }

    {
        let index = SearchIndex::open(config.clone()).unwrap();
        index
            .add(4, fields(serde_json::json!({ "title": "batgirl" })))
            .unwrap();
        index.delete(1).unwrap();
    }

    let index = SearchIndex::open(config).unwrap();
    assert_eq!(index.len(), 3);
    assert!(index.search("batman").is_empty());
    assert_eq!(index.search("batgirl").ids().collect::<Vec<_>>(), vec![4]);

    let ids: Vec<DocumentId> = index.search("robin catwoman batgirl").ids().collect();
    assert_eq!(ids.len(), 3);
}
