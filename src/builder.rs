//! Index construction and incremental refresh.
//!
//! A full rebuild enumerates every eligible file and parses it; a refresh
//! diffs fingerprints first and touches only added/modified/removed files.
//! A parse problem on one file never aborts the batch: the file is recorded
//! with fallback metadata and indexing continues.

use crate::change::{self, ChangeSet, Fingerprint};
use crate::discovery::FileDiscovery;
use crate::error::{EngineError, Result};
use crate::parsing;
use crate::store::IndexStore;
use crate::types::FileRecord;
use std::path::Path;

/// Outcome of a rebuild or refresh.
#[derive(Debug, Default, Clone)]
pub struct IndexReport {
    /// Files currently eligible on disk.
    pub total_files: usize,
    /// Files parsed by a language capability in this pass.
    pub parsed_files: usize,
    /// Files recorded with fallback metadata only.
    pub fallback_files: usize,
    pub added: usize,
    pub modified: usize,
    pub removed: usize,
    /// Files skipped because their fingerprint was unchanged.
    pub skipped_files: usize,
}

pub struct IndexBuilder {
    discovery: FileDiscovery,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self {
            discovery: FileDiscovery::new(),
        }
    }

    pub fn with_discovery(discovery: FileDiscovery) -> Self {
        Self { discovery }
    }

    /// Rebuild the store from scratch. The explicit recovery path when
    /// incremental state is suspected corrupt.
    pub async fn full_rebuild(&self, store: &IndexStore) -> Result<IndexReport> {
        tracing::info!("starting full rebuild of {}", store.base_path().display());
        store.clear();

        let files = self
            .discovery
            .discover(store.base_path())
            .map_err(|e| EngineError::InvalidPath {
                path: store.base_path().to_path_buf(),
                reason: e.to_string(),
            })?;

        let mut report = IndexReport {
            total_files: files.len(),
            ..Default::default()
        };

        for (rel, abs) in &files {
            self.index_file(store, rel, abs, &mut report).await;
            report.added += 1;
        }

        let stats = store.stats();
        tracing::info!(
            "rebuild complete: {} files, {} symbols",
            stats.file_count,
            stats.symbol_count
        );
        Ok(report)
    }

    /// Incremental refresh: re-parse only files whose fingerprint changed,
    /// drop records for files gone from disk.
    pub async fn refresh(&self, store: &IndexStore) -> Result<IndexReport> {
        let files = self
            .discovery
            .discover(store.base_path())
            .map_err(|e| EngineError::InvalidPath {
                path: store.base_path().to_path_buf(),
                reason: e.to_string(),
            })?;

        let changes = change::detect_changes(store, &files);
        let mut report = IndexReport {
            total_files: files.len(),
            skipped_files: changes.unchanged,
            ..Default::default()
        };
        self.apply_changes(store, &changes, &mut report).await;

        tracing::debug!(
            "refresh: {} added, {} modified, {} removed, {} unchanged",
            report.added,
            report.modified,
            report.removed,
            report.skipped_files
        );
        Ok(report)
    }

    /// Refresh exactly the given relative paths, bypassing the project walk.
    /// Used by the edit engine after a successful apply.
    pub async fn refresh_paths(&self, store: &IndexStore, paths: &[String]) -> Result<IndexReport> {
        let mut report = IndexReport::default();
        for rel in paths {
            let abs = store.absolute_path(rel);
            if abs.is_file() {
                self.index_file(store, rel, &abs, &mut report).await;
                report.modified += 1;
            } else {
                store.remove_file(rel);
                report.removed += 1;
            }
        }
        report.total_files = paths.len();
        Ok(report)
    }

    async fn apply_changes(&self, store: &IndexStore, changes: &ChangeSet, report: &mut IndexReport) {
        for (rel, abs) in &changes.added {
            self.index_file(store, rel, abs, report).await;
            report.added += 1;
        }
        for (rel, abs) in &changes.modified {
            self.index_file(store, rel, abs, report).await;
            report.modified += 1;
        }
        for rel in &changes.removed {
            store.remove_file(rel);
            report.removed += 1;
        }
    }

    /// Parse one file and replace its store record. Never fails the batch:
    /// unreadable or unparsable files degrade to fallback metadata.
    async fn index_file(&self, store: &IndexStore, rel: &str, abs: &Path, report: &mut IndexReport) {
        let bytes = match tokio::fs::read(abs).await {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::warn!("cannot read {}: {}; skipping", rel, err);
                store.remove_file(rel);
                return;
            }
        };
        let fingerprint = match Fingerprint::of_read_file(abs, &bytes) {
            Ok(fp) => fp,
            Err(err) => {
                tracing::warn!("cannot fingerprint {}: {}; skipping", rel, err);
                store.remove_file(rel);
                return;
            }
        };
        let line_count = bytecount::count(&bytes, b'\n')
            + usize::from(!bytes.is_empty() && bytes.last() != Some(&b'\n'));
        let language = parsing::language_tag_for_path(abs).to_string();

        let source = match String::from_utf8(bytes) {
            Ok(source) => source,
            Err(_) => {
                // binary or non-UTF-8 file: fallback record, no symbols
                report.fallback_files += 1;
                store.add_file(
                    fallback_record(rel, language, line_count, fingerprint),
                    Vec::new(),
                );
                return;
            }
        };

        match parsing::capability_for_path(abs) {
            Some(capability) => {
                let parsed = capability.parse(&source, rel);
                let record = FileRecord {
                    path: rel.to_string(),
                    language: capability.language_tag().to_string(),
                    line_count,
                    symbol_names: parsed.symbols.iter().map(|s| s.name.clone()).collect(),
                    imports: parsed.imports,
                    exports: parsed.exports,
                    fingerprint,
                };
                store.add_file(record, parsed.symbols);
                report.parsed_files += 1;
            }
            None => {
                report.fallback_files += 1;
                store.add_file(
                    fallback_record(rel, language, line_count, fingerprint),
                    Vec::new(),
                );
            }
        }
    }
}

impl Default for IndexBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Minimal metadata record for files without a language capability.
fn fallback_record(
    rel: &str,
    language: String,
    line_count: usize,
    fingerprint: Fingerprint,
) -> FileRecord {
    FileRecord {
        path: rel.to_string(),
        language,
        line_count,
        symbol_names: Vec::new(),
        imports: Vec::new(),
        exports: Vec::new(),
        fingerprint,
    }
}
