//! Persistent scan cursor: per network, the last processed block and
//! the retained candidate-account set.
//!
//! One JSON document holds every network's entry, keyed by chain id:
//! `{ "1": { "users": [...], "lastBlock": 13500000 } }`. The file is
//! read once at run start and rewritten once at run end with a
//! write-to-temp-then-rename, never patched in place. Saving one
//! network's entry leaves the other networks' entries untouched.
//!
//! The process is single-instance per network by deployment
//! convention; concurrent writers against the same file would corrupt
//! state and are not defended against.

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::Result;

/// Scan checkpoint for one network.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cursor {
    /// Highest block already scanned; monotonically non-decreasing
    pub last_block: u64,
    /// Candidate accounts carried over to the next run
    pub users: BTreeSet<Address>,
}

/// On-disk shape of one network's entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CursorRecord {
    users: Vec<Address>,
    #[serde(rename = "lastBlock")]
    last_block: u64,
}

impl From<&Cursor> for CursorRecord {
    fn from(cursor: &Cursor) -> Self {
        Self {
            users: cursor.users.iter().copied().collect(),
            last_block: cursor.last_block,
        }
    }
}

impl From<CursorRecord> for Cursor {
    fn from(record: CursorRecord) -> Self {
        Self {
            last_block: record.last_block,
            users: record.users.into_iter().collect(),
        }
    }
}

/// File-backed cursor store.
pub struct CursorStore {
    path: PathBuf,
}

impl CursorStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the cursor for a network. An absent file or absent
    /// network key is the zero cursor, not an error.
    pub fn load(&self, chain_id: u64) -> Result<Cursor> {
        let document = self.read_document()?;
        let cursor = document
            .get(&chain_id.to_string())
            .cloned()
            .map(Cursor::from)
            .unwrap_or_default();

        debug!(
            path = %self.path.display(),
            chain_id,
            last_block = cursor.last_block,
            users = cursor.users.len(),
            "Cursor loaded"
        );
        Ok(cursor)
    }

    /// Persist a network's cursor, preserving every other network's
    /// entry. `last_block` never moves backwards across saves.
    pub fn save(&self, chain_id: u64, cursor: &Cursor) -> Result<()> {
        let mut document = self.read_document()?;
        let key = chain_id.to_string();

        let mut record = CursorRecord::from(cursor);
        if let Some(existing) = document.get(&key) {
            record.last_block = record.last_block.max(existing.last_block);
        }
        document.insert(key, record);

        let serialized = serde_json::to_vec_pretty(&document)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serialized)?;
        fs::rename(&tmp, &self.path)?;

        info!(
            path = %self.path.display(),
            chain_id,
            last_block = cursor.last_block,
            users = cursor.users.len(),
            "Cursor saved"
        );
        Ok(())
    }

    fn read_document(&self) -> Result<BTreeMap<String, CursorRecord>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let raw = fs::read(&self.path)?;
        Ok(serde_json::from_slice(&raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(tag: &str) -> CursorStore {
        let path = std::env::temp_dir().join(format!(
            "marginbot-cursor-{tag}-{}.json",
            std::process::id()
        ));
        let _ = fs::remove_file(&path);
        CursorStore::new(path)
    }

    fn addr(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    #[test]
    fn test_absent_file_is_zero_cursor() {
        let store = temp_store("absent");
        let cursor = store.load(1).unwrap();
        assert_eq!(cursor, Cursor::default());
    }

    #[test]
    fn test_round_trip_preserves_other_networks() {
        let store = temp_store("roundtrip");

        let polygon = Cursor {
            last_block: 999,
            users: [addr(9)].into_iter().collect(),
        };
        store.save(137, &polygon).unwrap();

        let mainnet = Cursor {
            last_block: 12345,
            users: [addr(0xab)].into_iter().collect(),
        };
        store.save(1, &mainnet).unwrap();

        assert_eq!(store.load(1).unwrap(), mainnet);
        // The earlier network entry survived the rewrite
        assert_eq!(store.load(137).unwrap(), polygon);

        let _ = fs::remove_file(store.path());
    }

    #[test]
    fn test_last_block_never_decreases() {
        let store = temp_store("monotonic");

        let ahead = Cursor {
            last_block: 500,
            users: BTreeSet::new(),
        };
        store.save(1, &ahead).unwrap();

        let behind = Cursor {
            last_block: 100,
            users: [addr(1)].into_iter().collect(),
        };
        store.save(1, &behind).unwrap();

        let loaded = store.load(1).unwrap();
        assert_eq!(loaded.last_block, 500);
        // The user set still reflects the latest save
        assert!(loaded.users.contains(&addr(1)));

        let _ = fs::remove_file(store.path());
    }

    #[test]
    fn test_corrupt_file_is_an_error_not_a_clobber() {
        let store = temp_store("corrupt");
        fs::write(store.path(), b"{ not json").unwrap();

        assert!(store.load(1).is_err());
        // Saving must not silently overwrite a file we cannot parse,
        // other networks' entries could be lost.
        let cursor = Cursor {
            last_block: 1,
            users: BTreeSet::new(),
        };
        assert!(store.save(1, &cursor).is_err());

        let _ = fs::remove_file(store.path());
    }
}
