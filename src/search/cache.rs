//! Search result caching.
//!
//! Entries are keyed by the query signature and remember the fingerprint of
//! every file that contributed to (or was scanned for) the result. A lookup
//! checks that the query's current candidate set is still the recorded one
//! (a newly indexed file changes the set and drops the entry) and then
//! revalidates every fingerprint against disk, so a result is never served
//! past a change to any contributing file, even one the index has not been
//! refreshed for yet.

use crate::change::Fingerprint;
use crate::store::IndexStore;
use crate::types::SearchMatch;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Entry cap; least-recently-used entries are evicted beyond it.
const MAX_ENTRIES: usize = 128;

/// Queries touching more files than this are not cached: revalidation
/// would cost more than the scan it saves.
const MAX_DEPENDENCIES: usize = 512;

struct CacheEntry {
    matches: Vec<SearchMatch>,
    deps: Vec<(String, Fingerprint)>,
    last_access: Instant,
}

#[derive(Debug, Default, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub invalidations: u64,
}

#[derive(Default)]
pub struct QueryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    hits: AtomicU64,
    misses: AtomicU64,
    invalidations: AtomicU64,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return cached matches if the candidate set is unchanged and every
    /// contributing file still fingerprints the same on disk.
    pub fn lookup(
        &self,
        signature: &str,
        store: &IndexStore,
        candidates: &[(String, PathBuf)],
    ) -> Option<Vec<SearchMatch>> {
        let mut entries = self.entries.lock();
        let Some(entry) = entries.get_mut(signature) else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        };

        // a file added (or dropped) since insert changes the candidate set;
        // its absence from the dependency list would otherwise go unnoticed
        let current: HashSet<&str> = candidates.iter().map(|(rel, _)| rel.as_str()).collect();
        let same_files = entry.deps.len() == current.len()
            && entry.deps.iter().all(|(rel, _)| current.contains(rel.as_str()));

        let valid = same_files
            && entry.deps.iter().all(|(rel, cached)| {
                Fingerprint::of_file(&store.absolute_path(rel))
                    .map(|current| current == *cached)
                    .unwrap_or(false)
            });

        if valid {
            entry.last_access = Instant::now();
            self.hits.fetch_add(1, Ordering::Relaxed);
            Some(entry.matches.clone())
        } else {
            entries.remove(signature);
            self.invalidations.fetch_add(1, Ordering::Relaxed);
            self.misses.fetch_add(1, Ordering::Relaxed);
            None
        }
    }

    /// Record a result with its file dependencies.
    pub fn insert(
        &self,
        signature: String,
        matches: Vec<SearchMatch>,
        deps: Vec<(String, Fingerprint)>,
    ) {
        if deps.len() > MAX_DEPENDENCIES {
            return;
        }
        let mut entries = self.entries.lock();
        if entries.len() >= MAX_ENTRIES && !entries.contains_key(&signature) {
            if let Some(oldest) = entries
                .iter()
                .min_by_key(|(_, e)| e.last_access)
                .map(|(k, _)| k.clone())
            {
                entries.remove(&oldest);
            }
        }
        entries.insert(
            signature,
            CacheEntry {
                matches,
                deps,
                last_access: Instant::now(),
            },
        );
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.lock().len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn sample_match() -> SearchMatch {
        SearchMatch {
            file: "a.rs".into(),
            line: 1,
            column: 1,
            content: "fn alpha() {}".into(),
            symbol: None,
            kind: None,
        }
    }

    fn pair(dir: &tempfile::TempDir, rel: &str) -> (String, PathBuf) {
        (rel.to_string(), dir.path().join(rel))
    }

    #[test]
    fn hit_while_unchanged_invalidated_after_write() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.rs"), "fn alpha() {}\n").unwrap();
        let store = IndexStore::new(dir.path().to_path_buf());
        let cache = QueryCache::new();

        let fp = Fingerprint::of_file(&dir.path().join("a.rs")).unwrap();
        cache.insert("q1".into(), vec![sample_match()], vec![("a.rs".into(), fp)]);

        let candidates = vec![pair(&dir, "a.rs")];
        assert!(cache.lookup("q1", &store, &candidates).is_some());

        fs::write(dir.path().join("a.rs"), "fn beta() {}\n").unwrap();
        assert!(cache.lookup("q1", &store, &candidates).is_none());

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.invalidations, 1);
    }

    #[test]
    fn deleted_dependency_invalidates() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.rs"), "x").unwrap();
        let store = IndexStore::new(dir.path().to_path_buf());
        let cache = QueryCache::new();
        let fp = Fingerprint::of_file(&dir.path().join("a.rs")).unwrap();
        cache.insert("q".into(), vec![], vec![("a.rs".into(), fp)]);

        fs::remove_file(dir.path().join("a.rs")).unwrap();
        assert!(cache.lookup("q", &store, &[pair(&dir, "a.rs")]).is_none());
    }

    #[test]
    fn grown_candidate_set_invalidates() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.rs"), "fn alpha() {}\n").unwrap();
        let store = IndexStore::new(dir.path().to_path_buf());
        let cache = QueryCache::new();

        let fp = Fingerprint::of_file(&dir.path().join("a.rs")).unwrap();
        cache.insert("q".into(), vec![sample_match()], vec![("a.rs".into(), fp)]);
        assert!(cache.lookup("q", &store, &[pair(&dir, "a.rs")]).is_some());

        // a second candidate appears; the entry never fingerprinted it and
        // cannot vouch for a result that should now include it
        fs::write(dir.path().join("b.rs"), "fn beta() {}\n").unwrap();
        let grown = vec![pair(&dir, "a.rs"), pair(&dir, "b.rs")];
        assert!(cache.lookup("q", &store, &grown).is_none());
        assert_eq!(cache.stats().invalidations, 1);
    }

    #[test]
    fn oversized_dependency_sets_are_not_cached() {
        let store = IndexStore::new(PathBuf::from("/nonexistent"));
        let cache = QueryCache::new();
        let deps: Vec<(String, Fingerprint)> = (0..MAX_DEPENDENCIES + 1)
            .map(|i| (format!("f{i}.rs"), Fingerprint::of_content(b"x")))
            .collect();
        cache.insert("big".into(), vec![], deps);
        assert!(cache.lookup("big", &store, &[]).is_none());
    }
}
