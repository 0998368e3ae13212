use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::PathBuf;

use crc32fast::Hasher;
use parking_lot::Mutex;
use tracing::warn;

use crate::models::Mutation;
use crate::Result;
use crate::error::KrillError;

/// Append-only mutation log.
///
/// Record format:
/// - u64 sequence number (little endian)
/// - u32 payload length (little endian)
/// - u32 crc32 of payload
/// - bincode-encoded [`Mutation`]
///
/// A record is appended before the corresponding in-memory mutation is
/// considered durable-committed. On startup the log is replayed in order
/// to rebuild state past the last snapshot.
pub struct MutationLog {
    path: PathBuf,
    file: Mutex<File>,
    sync_on_append: bool,
}

const RECORD_HEADER_LEN: u64 = 8 + 4 + 4;

impl MutationLog {
    pub fn open(path: PathBuf, sync_on_append: bool) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(KrillError::Storage)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)
            .map_err(KrillError::Storage)?;

        Ok(Self {
            path,
            file: Mutex::new(file),
            sync_on_append,
        })
    }

    /// Append one mutation under the given sequence number.
    pub fn append(&self, seq: u64, mutation: &Mutation) -> Result<()> {
        let payload = bincode::serialize(mutation).map_err(KrillError::Serialization)?;

        let mut hasher = Hasher::new();
        hasher.update(&payload);
        let crc32 = hasher.finalize();

        let mut file = self.file.lock();
        file.write_all(&seq.to_le_bytes())
            .map_err(KrillError::Storage)?;
        file.write_all(&(payload.len() as u32).to_le_bytes())
            .map_err(KrillError::Storage)?;
        file.write_all(&crc32.to_le_bytes())
            .map_err(KrillError::Storage)?;
        file.write_all(&payload).map_err(KrillError::Storage)?;
        if self.sync_on_append {
            file.sync_data().map_err(KrillError::Storage)?;
        }
        Ok(())
    }

    /// Read all records in append order, validating checksums.
    ///
    /// A truncated record at the tail (torn write from a crash) is dropped
    /// and the file is trimmed back to the last complete record. A checksum
    /// mismatch on a complete record is a hard error.
    pub fn replay(&self) -> Result<Vec<(u64, Mutation)>> {
        let mut file = self.file.lock();
        let len = file.metadata().map_err(KrillError::Storage)?.len();
        file.seek(SeekFrom::Start(0)).map_err(KrillError::Storage)?;

        let mut records = Vec::new();
        let mut offset = 0u64;

        while offset < len {
            if len - offset < RECORD_HEADER_LEN {
                Self::trim_torn_tail(&mut file, offset, len)?;
                break;
            }

            let mut seq_buf = [0u8; 8];
            file.read_exact(&mut seq_buf).map_err(KrillError::Storage)?;
            let seq = u64::from_le_bytes(seq_buf);

            let mut len_buf = [0u8; 4];
            file.read_exact(&mut len_buf).map_err(KrillError::Storage)?;
            let payload_len = u32::from_le_bytes(len_buf) as u64;

            let mut crc_buf = [0u8; 4];
            file.read_exact(&mut crc_buf).map_err(KrillError::Storage)?;
            let stored_crc = u32::from_le_bytes(crc_buf);

            if len - offset - RECORD_HEADER_LEN < payload_len {
                Self::trim_torn_tail(&mut file, offset, len)?;
                break;
            }

            let mut payload = vec![0u8; payload_len as usize];
            file.read_exact(&mut payload).map_err(KrillError::Storage)?;

            let mut hasher = Hasher::new();
            hasher.update(&payload);
            if hasher.finalize() != stored_crc {
                return Err(KrillError::CorruptLog { offset });
            }

            let mutation: Mutation =
                bincode::deserialize(&payload).map_err(KrillError::Serialization)?;
            records.push((seq, mutation));
            offset += RECORD_HEADER_LEN + payload_len;
        }

        Ok(records)
    }

    fn trim_torn_tail(file: &mut File, good_offset: u64, len: u64) -> Result<()> {
        warn!(
            offset = good_offset,
            dropped = len - good_offset,
            "dropping torn record at mutation log tail"
        );
        file.set_len(good_offset).map_err(KrillError::Storage)?;
        Ok(())
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Truncate the log (after a checkpoint has captured its contents).
    pub fn reset(&self) -> Result<()> {
        let mut file = self.file.lock();
        file.set_len(0).map_err(KrillError::Storage)?;
        file.seek(SeekFrom::Start(0)).map_err(KrillError::Storage)?;
        if self.sync_on_append {
            file.sync_data().map_err(KrillError::Storage)?;
        }
        Ok(())
    }
}
