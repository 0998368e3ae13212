use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::KrillError;
use crate::models::{DocumentId, Fields};
use crate::Result;

/// Snapshot version for compatibility checking
pub const SNAPSHOT_VERSION: u32 = 1;

/// Full document store mapping, captured at a checkpoint.
///
/// Postings are not stored; they are rebuilt by re-tokenizing the restored
/// documents on open. `last_seq` is the highest mutation log sequence
/// number folded into the snapshot; replay skips records at or below it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub version: u32,
    pub last_seq: u64,
    pub documents: BTreeMap<DocumentId, Fields>,
}

impl StoreSnapshot {
    pub fn new(documents: BTreeMap<DocumentId, Fields>, last_seq: u64) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            last_seq,
            documents,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(KrillError::Serialization)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data).map_err(KrillError::Serialization)
    }

    pub fn is_compatible(&self) -> bool {
        self.version <= SNAPSHOT_VERSION
    }

    /// Write atomically: serialize to a sibling tmp file, then rename over
    /// the target so a crash never leaves a half-written snapshot.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let bytes = self.to_bytes()?;
        let tmp_path = path.with_extension("tmp");
        {
            let mut file = std::fs::File::create(&tmp_path).map_err(KrillError::Storage)?;
            use std::io::Write;
            file.write_all(&bytes).map_err(KrillError::Storage)?;
            file.sync_all().map_err(KrillError::Storage)?;
        }
        std::fs::rename(&tmp_path, path).map_err(KrillError::Storage)?;
        info!(
            documents = self.documents.len(),
            last_seq = self.last_seq,
            "snapshot written"
        );
        Ok(())
    }

    /// Load a snapshot, or `None` if the file does not exist yet.
    pub fn read_from(path: &Path) -> Result<Option<Self>> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(KrillError::Storage(e)),
        };
        let snapshot = Self::from_bytes(&bytes)?;
        if !snapshot.is_compatible() {
            return Err(KrillError::IncompatibleSnapshot {
                expected: SNAPSHOT_VERSION,
                actual: snapshot.version,
            });
        }
        Ok(Some(snapshot))
    }
}
