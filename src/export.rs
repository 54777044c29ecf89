//! Versioned index snapshots for downstream tooling.
//!
//! The snapshot is a one-way boundary: external tools read it, the engine
//! never loads one back as its index source. The format version bumps on
//! any shape change so consumers can refuse snapshots they do not
//! understand.

use crate::store::IndexStore;
use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

/// Bump on any change to the snapshot shape.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize)]
pub struct SnapshotSymbol {
    pub name: String,
    pub kind: String,
    pub line: u32,
    pub column: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SnapshotDocument {
    pub path: String,
    pub language: String,
    pub line_count: usize,
    pub symbols: Vec<SnapshotSymbol>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exports: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SnapshotMetadata {
    pub format_version: u32,
    pub generated_at_unix: u64,
    pub file_count: usize,
    pub symbol_count: usize,
}

#[derive(Debug, Serialize)]
pub struct IndexSnapshot {
    /// Project identifier: the base path as the user knows it.
    pub project: String,
    pub documents: Vec<SnapshotDocument>,
    pub metadata: SnapshotMetadata,
}

/// Capture the current index as a portable snapshot. Documents and the
/// symbols within them are sorted so identical stores produce identical
/// snapshots.
pub fn export_snapshot(store: &IndexStore) -> IndexSnapshot {
    let stats = store.stats();
    let mut symbols_by_file: std::collections::HashMap<String, Vec<SnapshotSymbol>> =
        std::collections::HashMap::new();
    for record in store.symbol_records() {
        symbols_by_file
            .entry(record.file.clone())
            .or_default()
            .push(SnapshotSymbol {
                name: record.name,
                kind: record.kind.as_str().to_string(),
                line: record.line,
                column: record.column,
                signature: record.signature,
            });
    }

    let documents = store
        .file_records()
        .into_iter()
        .map(|record| {
            let mut symbols = symbols_by_file.remove(&record.path).unwrap_or_default();
            symbols.sort_by(|a, b| a.line.cmp(&b.line).then(a.column.cmp(&b.column)));
            SnapshotDocument {
                path: record.path,
                language: record.language,
                line_count: record.line_count,
                symbols,
                imports: record.imports,
                exports: record.exports,
            }
        })
        .collect();

    let generated_at_unix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    IndexSnapshot {
        project: store.base_path().display().to_string(),
        documents,
        metadata: SnapshotMetadata {
            format_version: SNAPSHOT_FORMAT_VERSION,
            generated_at_unix,
            file_count: stats.file_count,
            symbol_count: stats.symbol_count,
        },
    }
}
