//! Per-project session: one index, one coarse write lock.
//!
//! A session owns the IndexStore for a single project root and serializes
//! everything that mutates it (refresh, edits, renames) behind one async
//! lock. Searches take the lock too; they are cheap enough that contention
//! is not worth a reader/writer split, and holding the lock guarantees a
//! search never observes a half-applied edit batch. Lock waits are bounded
//! so a stuck caller surfaces as a ConcurrencyConflict instead of a hang.
//!
//! Concurrent work on different projects is just separate sessions.

use crate::builder::{IndexBuilder, IndexReport};
use crate::discovery::FileDiscovery;
use crate::edit::EditEngine;
use crate::error::{EngineError, Result};
use crate::export::{self, IndexSnapshot};
use crate::search::{CacheStats, SearchEngine};
use crate::store::IndexStore;
use crate::types::{EditOperation, EditReport, FileRecord, IndexStats, SearchMatch, SearchQuery};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// How long an operation waits for the session lock before giving up.
const LOCK_WAIT: Duration = Duration::from_secs(30);

pub struct ProjectSession {
    store: Arc<IndexStore>,
    builder: IndexBuilder,
    search: SearchEngine,
    edit: EditEngine,
    lock: Mutex<()>,
}

impl std::fmt::Debug for ProjectSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectSession")
            .field("base_path", &self.store.base_path())
            .finish_non_exhaustive()
    }
}


impl ProjectSession {
    /// Open a session on a project root and build the initial index.
    /// Fails with InvalidPath when the root does not exist or is not a
    /// directory.
    pub async fn open(project_path: &Path) -> Result<(Self, IndexReport)> {
        Self::open_with_discovery(project_path, FileDiscovery::new()).await
    }

    pub async fn open_with_discovery(
        project_path: &Path,
        discovery: FileDiscovery,
    ) -> Result<(Self, IndexReport)> {
        if !project_path.exists() {
            return Err(EngineError::InvalidPath {
                path: project_path.to_path_buf(),
                reason: "path does not exist".into(),
            });
        }
        if !project_path.is_dir() {
            return Err(EngineError::InvalidPath {
                path: project_path.to_path_buf(),
                reason: "path is not a directory".into(),
            });
        }
        let canonical = project_path
            .canonicalize()
            .map_err(|e| EngineError::InvalidPath {
                path: project_path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let store = Arc::new(IndexStore::new(canonical));
        let builder = IndexBuilder::with_discovery(discovery);
        let report = builder.full_rebuild(&store).await?;

        let session = Self {
            search: SearchEngine::new(Arc::clone(&store)),
            edit: EditEngine::new(Arc::clone(&store)),
            builder,
            store,
            lock: Mutex::new(()),
        };
        Ok((session, report))
    }

    /// Discard the index and rebuild from disk. The recovery path when
    /// incremental state is suspected wrong.
    pub async fn rebuild(&self) -> Result<IndexReport> {
        let _guard = self.acquire().await?;
        self.builder.full_rebuild(&self.store).await
    }

    /// Re-index only what changed on disk since the last pass.
    pub async fn refresh(&self) -> Result<IndexReport> {
        let _guard = self.acquire().await?;
        self.builder.refresh(&self.store).await
    }

    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchMatch>> {
        let _guard = self.acquire().await?;
        self.search.search(query).await
    }

    /// Apply an edit batch atomically and refresh the touched index records
    /// before returning.
    pub async fn apply_edits(&self, operations: &[EditOperation]) -> Result<EditReport> {
        let _guard = self.acquire().await?;
        self.edit.apply_edits(operations).await
    }

    pub async fn rename_symbol(&self, old_name: &str, new_name: &str) -> Result<EditReport> {
        let _guard = self.acquire().await?;
        self.edit.rename_symbol(old_name, new_name).await
    }

    /// Indexed record for one file, or FileNotFound if the path is not in
    /// the index.
    pub fn file_summary(&self, path: &str) -> Result<FileRecord> {
        self.store
            .get_file(path)
            .ok_or_else(|| EngineError::FileNotFound(path.to_string()))
    }

    pub fn find_files(&self, pattern: &str) -> Result<Vec<String>> {
        self.store
            .find_files_by_pattern(pattern)
            .map_err(|e| EngineError::InvalidQuery(format!("invalid file glob: {e}")))
    }

    pub fn stats(&self) -> IndexStats {
        self.store.stats()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.search.cache_stats()
    }

    pub fn export_snapshot(&self) -> IndexSnapshot {
        export::export_snapshot(&self.store)
    }

    pub fn base_path(&self) -> &Path {
        self.store.base_path()
    }

    async fn acquire(&self) -> Result<tokio::sync::MutexGuard<'_, ()>> {
        tokio::time::timeout(LOCK_WAIT, self.lock.lock())
            .await
            .map_err(|_| EngineError::ConcurrencyConflict)
    }
}
