//! Change detection.
//!
//! Every indexed file carries a [`Fingerprint`]. Small files are hashed
//! (xxh3 over content), larger files use a metadata fingerprint
//! (mtime + size) so a refresh never has to read them. A refresh walks the
//! project once, fingerprints what it finds, and diffs against the store:
//! the re-parse cost is O(changed files), not O(project size).

use crate::store::IndexStore;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use xxhash_rust::xxh3::xxh3_64;

/// Files at or below this size get a content hash; metadata alone is too
/// coarse for them (editors can rewrite a small file within mtime
/// granularity).
pub const CONTENT_HASH_MAX_BYTES: u64 = 10 * 1024;

/// Opaque change-detection token for one file.
///
/// Compared only for equality. The encoded form is stable across runs so it
/// can travel through the snapshot export.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Fingerprint a file on disk.
    pub fn of_file(path: &Path) -> io::Result<Self> {
        let meta = fs::metadata(path)?;
        if meta.len() <= CONTENT_HASH_MAX_BYTES {
            let bytes = fs::read(path)?;
            return Ok(Self::of_content(&bytes));
        }
        Self::of_metadata(&meta)
    }

    /// Fingerprint a file whose content the caller already read. Produces
    /// the same value [`Fingerprint::of_file`] would, without re-reading.
    pub fn of_read_file(path: &Path, bytes: &[u8]) -> io::Result<Self> {
        if bytes.len() as u64 <= CONTENT_HASH_MAX_BYTES {
            return Ok(Self::of_content(bytes));
        }
        Self::of_metadata(&fs::metadata(path)?)
    }

    fn of_metadata(meta: &fs::Metadata) -> io::Result<Self> {
        let mtime_ms = meta
            .modified()?
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        Ok(Fingerprint(format!("meta:{}:{}", mtime_ms, meta.len())))
    }

    /// Fingerprint in-memory content. Used when the caller already holds
    /// the bytes (e.g. right after an edit rewrote the file).
    pub fn of_content(bytes: &[u8]) -> Self {
        Fingerprint(format!("xxh3:{:016x}", xxh3_64(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Classification of the on-disk file set against the store.
#[derive(Debug, Default)]
pub struct ChangeSet {
    /// Present on disk, absent from the store. (rel path, abs path)
    pub added: Vec<(String, PathBuf)>,
    /// Present in both, fingerprint differs.
    pub modified: Vec<(String, PathBuf)>,
    /// Present in the store, gone from disk.
    pub removed: Vec<String>,
    /// Fingerprint unchanged; skipped entirely.
    pub unchanged: usize,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.removed.is_empty()
    }
}

/// Diff the current file enumeration against the store's records.
///
/// `current` pairs project-relative paths with absolute ones, as produced by
/// the discovery walk. A file whose fingerprint cannot be computed (e.g.
/// deleted between the walk and the stat) is treated as removed if the store
/// knows it, and skipped otherwise.
pub fn detect_changes(store: &IndexStore, current: &[(String, PathBuf)]) -> ChangeSet {
    let mut set = ChangeSet::default();
    let mut seen = std::collections::HashSet::with_capacity(current.len());

    for (rel, abs) in current {
        seen.insert(rel.as_str());
        let fingerprint = match Fingerprint::of_file(abs) {
            Ok(fp) => fp,
            Err(err) => {
                tracing::debug!("cannot fingerprint {}: {}", rel, err);
                continue;
            }
        };
        match store.get_file(rel) {
            None => set.added.push((rel.clone(), abs.clone())),
            Some(record) if record.fingerprint != fingerprint => {
                set.modified.push((rel.clone(), abs.clone()));
            }
            Some(_) => set.unchanged += 1,
        }
    }

    for path in store.file_paths() {
        if !seen.contains(path.as_str()) {
            set.removed.push(path);
        }
    }
    set.removed.sort();

    set
}
