//! Multi-strategy search over the index and the files beneath it.
//!
//! One entry point, [`SearchEngine::search`], dispatches on the query kind:
//!
//! - **text / regex**: ripgrep when available, in-process scan otherwise;
//!   both paths produce the same match shape.
//! - **symbol**: index-first with tiered exact/prefix/substring precedence;
//!   a definition-pattern text scan runs only when the index has no answer,
//!   because index hits carry verified kind and position.
//! - **definition / references / callers**: declaration sites come from the
//!   index; occurrence gathering reuses the text path with word-boundary
//!   patterns, excluding the declaration lines themselves.

pub mod cache;
pub mod ripgrep;
pub mod text;

pub use cache::{CacheStats, QueryCache};

use crate::error::{EngineError, Result};
use crate::store::IndexStore;
use crate::types::{SearchKind, SearchMatch, SearchQuery, SymbolRecord};
use regex::Regex;
use std::path::PathBuf;
use std::sync::Arc;
use text::LineMatcher;

pub struct SearchEngine {
    store: Arc<IndexStore>,
    cache: QueryCache,
}

impl SearchEngine {
    pub fn new(store: Arc<IndexStore>) -> Self {
        Self {
            store,
            cache: QueryCache::new(),
        }
    }

    /// Execute a query. Text-style matches are ordered by (file, line,
    /// column); symbol matches keep their precedence-tier order. Either
    /// way the sequence is deterministic for an unchanged store, and it
    /// is capped at the query limit.
    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchMatch>> {
        if query.pattern.is_empty() {
            return Err(EngineError::InvalidQuery("empty pattern".into()));
        }
        if query.kind == SearchKind::Regex {
            // validate up front so a bad pattern fails the same way on
            // both the external and in-process paths
            Regex::new(&query.pattern)
                .map_err(|e| EngineError::InvalidQuery(format!("invalid regex: {e}")))?;
        }

        let signature = query.signature();
        let candidates = self.candidate_files(query)?;
        if let Some(cached) = self.cache.lookup(&signature, &self.store, &candidates) {
            return Ok(cached);
        }

        let mut matches = match query.kind {
            SearchKind::Text => self.text_search(query, &candidates, true).await?,
            SearchKind::Regex => self.text_search(query, &candidates, false).await?,
            SearchKind::Symbol => self.symbol_search(query, &candidates).await?,
            SearchKind::Definition => self.definition_search(query, &candidates)?,
            SearchKind::References => self.occurrence_search(query, &candidates, false).await?,
            SearchKind::Callers => self.occurrence_search(query, &candidates, true).await?,
        };

        // symbol and definition results arrive in precedence order and
        // must stay that way; position-based strategies sort by location
        if !matches!(query.kind, SearchKind::Symbol | SearchKind::Definition) {
            matches.sort_by(|a, b| {
                a.file
                    .cmp(&b.file)
                    .then(a.line.cmp(&b.line))
                    .then(a.column.cmp(&b.column))
            });
        }
        matches.truncate(query.limit);

        let deps = candidates
            .iter()
            .filter_map(|(rel, _)| {
                self.store
                    .get_file(rel)
                    .map(|record| (rel.clone(), record.fingerprint))
            })
            .collect();
        self.cache.insert(signature, matches.clone(), deps);

        Ok(matches)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Candidate (relative, absolute) files for this query, after the
    /// optional glob filter. An empty store yields an empty candidate set
    /// and therefore an empty result, never an error.
    fn candidate_files(&self, query: &SearchQuery) -> Result<Vec<(String, PathBuf)>> {
        let rels = match &query.file_pattern {
            Some(glob) => self
                .store
                .find_files_by_pattern(glob)
                .map_err(|e| EngineError::InvalidQuery(format!("invalid file glob: {e}")))?,
            None => self.store.file_paths(),
        };
        Ok(rels
            .into_iter()
            .map(|rel| {
                let abs = self.store.absolute_path(&rel);
                (rel, abs)
            })
            .collect())
    }

    async fn text_search(
        &self,
        query: &SearchQuery,
        candidates: &[(String, PathBuf)],
        literal: bool,
    ) -> Result<Vec<SearchMatch>> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        if ripgrep::is_available() {
            match ripgrep::search(self.store.base_path(), query, literal).await {
                Ok(matches) => {
                    // rg walked the whole tree; restrict to indexed candidates
                    let allowed: std::collections::HashSet<&str> =
                        candidates.iter().map(|(rel, _)| rel.as_str()).collect();
                    return Ok(matches
                        .into_iter()
                        .filter(|m| allowed.contains(m.file.as_str()))
                        .collect());
                }
                Err(reason) => {
                    tracing::debug!("external search unavailable ({}), scanning in-process", reason);
                }
            }
        }

        let matcher = if literal {
            LineMatcher::literal(&query.pattern, query.case_sensitive)
        } else {
            LineMatcher::regex(&query.pattern, query.case_sensitive)
                .map_err(|e| EngineError::InvalidQuery(format!("invalid regex: {e}")))?
        };
        Ok(text::scan_files(candidates.to_vec(), Arc::new(matcher), query.limit).await)
    }

    /// Index-first symbol lookup. The textual fallback runs only on zero
    /// index results; it is a heuristic and reports kind as unknown.
    async fn symbol_search(
        &self,
        query: &SearchQuery,
        candidates: &[(String, PathBuf)],
    ) -> Result<Vec<SearchMatch>> {
        let records = self
            .store
            .find_symbols(&query.pattern, query.symbol_mode, query.case_sensitive);
        if !records.is_empty() {
            let matches = records
                .into_iter()
                .filter(|r| candidates.iter().any(|(rel, _)| rel == &r.file))
                .map(symbol_to_match)
                .collect();
            return Ok(matches);
        }

        self.definition_pattern_scan(query, candidates).await
    }

    /// Declaration sites from the index only; the verified answer for
    /// "where is this defined".
    fn definition_search(
        &self,
        query: &SearchQuery,
        candidates: &[(String, PathBuf)],
    ) -> Result<Vec<SearchMatch>> {
        let records = self.store.find_symbols(
            &query.pattern,
            crate::types::SymbolMatchMode::Exact,
            query.case_sensitive,
        );
        Ok(records
            .into_iter()
            .filter(|r| candidates.iter().any(|(rel, _)| rel == &r.file))
            .map(symbol_to_match)
            .collect())
    }

    /// Shared path for references and callers: word-boundary occurrences of
    /// the name across candidate files, minus the declaration lines.
    async fn occurrence_search(
        &self,
        query: &SearchQuery,
        candidates: &[(String, PathBuf)],
        callers_only: bool,
    ) -> Result<Vec<SearchMatch>> {
        let escaped = regex::escape(&query.pattern);
        let pattern = if callers_only {
            format!(r"\b{escaped}\s*\(")
        } else {
            format!(r"\b{escaped}\b")
        };
        let matcher = LineMatcher::regex(&pattern, query.case_sensitive)
            .map_err(|e| EngineError::InvalidQuery(format!("invalid symbol name: {e}")))?;

        let occurrences =
            text::scan_files(candidates.to_vec(), Arc::new(matcher), query.limit).await;

        let definitions = self.store.find_symbols(
            &query.pattern,
            crate::types::SymbolMatchMode::Exact,
            query.case_sensitive,
        );

        Ok(occurrences
            .into_iter()
            .filter(|m| {
                !definitions
                    .iter()
                    .any(|d| d.file == m.file && d.line == m.line)
            })
            .collect())
    }

    /// Best-effort textual fallback for symbols the index has not seen:
    /// language definition keywords followed by the name.
    async fn definition_pattern_scan(
        &self,
        query: &SearchQuery,
        candidates: &[(String, PathBuf)],
    ) -> Result<Vec<SearchMatch>> {
        let escaped = regex::escape(&query.pattern);
        let pattern = format!(
            r"\b(?:def|class|fn|function|struct|enum|trait|interface|type|const|let|var)\s+{escaped}\b"
        );
        let matcher = LineMatcher::regex(&pattern, query.case_sensitive)
            .map_err(|e| EngineError::InvalidQuery(format!("invalid symbol name: {e}")))?;

        let mut matches =
            text::scan_files(candidates.to_vec(), Arc::new(matcher), query.limit).await;
        for m in &mut matches {
            m.symbol = Some(query.pattern.clone());
            m.kind = Some(crate::types::SymbolKind::Unknown);
        }
        Ok(matches)
    }
}

fn symbol_to_match(record: SymbolRecord) -> SearchMatch {
    let content = match &record.signature {
        Some(sig) => format!("{}{}", record.name, sig),
        None => record.name.clone(),
    };
    SearchMatch {
        file: record.file,
        line: record.line,
        column: record.column,
        content,
        symbol: Some(record.name),
        kind: Some(record.kind),
    }
}
