//! In-process line scan, the fallback when no external search tool is
//! available.
//!
//! Candidate files are partitioned across a bounded worker pool; workers
//! only read file contents and never touch the store. Results are merged
//! after all workers complete and ordered by (file, line, column) so the
//! outcome is independent of worker scheduling.

use crate::types::SearchMatch;
use futures::future;
use regex::{Regex, RegexBuilder};
use std::path::PathBuf;
use std::sync::Arc;

/// Upper bound on concurrent scan workers.
pub const MAX_SCAN_WORKERS: usize = 4;

/// Files per worker before another worker is worth spawning.
const FILES_PER_WORKER: usize = 16;

/// How a line is tested for a match.
pub enum LineMatcher {
    Literal { needle: String, case_sensitive: bool },
    Pattern(Regex),
}

impl LineMatcher {
    pub fn literal(needle: &str, case_sensitive: bool) -> Self {
        if case_sensitive {
            Self::Literal {
                needle: needle.to_string(),
                case_sensitive: true,
            }
        } else {
            Self::Literal {
                needle: needle.to_lowercase(),
                case_sensitive: false,
            }
        }
    }

    /// Compile a regex matcher. Returns the regex crate's error for the
    /// caller to surface as an invalid-query failure.
    pub fn regex(pattern: &str, case_sensitive: bool) -> Result<Self, regex::Error> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(!case_sensitive)
            .build()?;
        Ok(Self::Pattern(regex))
    }

    /// Byte offset of the first match within the line, if any.
    fn find(&self, line: &str) -> Option<usize> {
        match self {
            Self::Literal {
                needle,
                case_sensitive: true,
            } => line.find(needle.as_str()),
            Self::Literal {
                needle,
                case_sensitive: false,
            } => line.to_lowercase().find(needle.as_str()),
            Self::Pattern(regex) => regex.find(line).map(|m| m.start()),
        }
    }
}

/// Scan `files` (relative path, absolute path pairs) for lines matching
/// `matcher`. Each worker stops at `limit` matches; the merged result is
/// sorted and truncated by the caller.
pub async fn scan_files(
    files: Vec<(String, PathBuf)>,
    matcher: Arc<LineMatcher>,
    limit: usize,
) -> Vec<SearchMatch> {
    if files.is_empty() {
        return Vec::new();
    }

    let workers = files
        .len()
        .div_ceil(FILES_PER_WORKER)
        .clamp(1, MAX_SCAN_WORKERS);
    let chunk_size = files.len().div_ceil(workers);

    let mut handles = Vec::with_capacity(workers);
    for chunk in files.chunks(chunk_size) {
        let chunk = chunk.to_vec();
        let matcher = Arc::clone(&matcher);
        handles.push(tokio::spawn(async move {
            scan_chunk(chunk, &matcher, limit).await
        }));
    }

    let mut matches = Vec::new();
    for outcome in future::join_all(handles).await {
        match outcome {
            Ok(chunk_matches) => matches.extend(chunk_matches),
            Err(err) => tracing::warn!("scan worker panicked: {}", err),
        }
    }

    matches.sort_by(|a, b| {
        a.file
            .cmp(&b.file)
            .then(a.line.cmp(&b.line))
            .then(a.column.cmp(&b.column))
    });
    matches
}

async fn scan_chunk(
    files: Vec<(String, PathBuf)>,
    matcher: &LineMatcher,
    limit: usize,
) -> Vec<SearchMatch> {
    let mut matches = Vec::new();
    for (rel, abs) in files {
        let Ok(content) = tokio::fs::read_to_string(&abs).await else {
            continue;
        };
        for (idx, line) in content.lines().enumerate() {
            if let Some(offset) = matcher.find(line) {
                matches.push(SearchMatch {
                    file: rel.clone(),
                    line: idx as u32 + 1,
                    column: offset as u32 + 1,
                    content: line.trim().to_string(),
                    symbol: None,
                    kind: None,
                });
                if matches.len() >= limit {
                    return matches;
                }
            }
        }
    }
    matches
}
