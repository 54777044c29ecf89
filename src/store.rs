//! The in-memory index store.
//!
//! One [`IndexStore`] per project session. Pure storage and lookup: no I/O,
//! no parsing. Mutation keeps the store internally consistent at every step;
//! in particular a replaced file's old symbols are cascade-deleted before the
//! new record is inserted, so the store never holds orphaned symbols.

use crate::types::{FileRecord, IndexStats, SymbolMatchMode, SymbolRecord};
use dashmap::DashMap;
use globset::Glob;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub struct IndexStore {
    base_path: PathBuf,
    /// path -> file record
    files: DashMap<String, FileRecord>,
    /// symbol name -> all records with that name (duplicates allowed)
    symbols: DashMap<String, Vec<SymbolRecord>>,
}

impl IndexStore {
    pub fn new(base_path: PathBuf) -> Self {
        Self {
            base_path,
            files: DashMap::new(),
            symbols: DashMap::new(),
        }
    }

    /// Absolute root of the indexed project. Immutable for the store's life.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Resolve a project-relative path to an absolute one.
    pub fn absolute_path(&self, rel: &str) -> PathBuf {
        self.base_path.join(rel)
    }

    /// Insert or replace a file record along with its symbols.
    ///
    /// Cascade-delete runs first: any symbols still attributed to this path
    /// are dropped before the new record lands, so an interrupted caller can
    /// never observe symbols without their file.
    pub fn add_file(&self, record: FileRecord, symbols: Vec<SymbolRecord>) {
        let path = record.path.clone();
        self.remove_symbols_for(&path);
        self.files.insert(path.clone(), record);
        for symbol in symbols {
            debug_assert_eq!(symbol.file, path);
            self.symbols.entry(symbol.name.clone()).or_default().push(symbol);
        }
    }

    /// Remove a file and cascade its symbols. No-op when the path is absent.
    pub fn remove_file(&self, path: &str) {
        self.files.remove(path);
        self.remove_symbols_for(path);
    }

    fn remove_symbols_for(&self, path: &str) {
        let mut emptied = Vec::new();
        for mut entry in self.symbols.iter_mut() {
            entry.value_mut().retain(|s| s.file != path);
            if entry.value().is_empty() {
                emptied.push(entry.key().clone());
            }
        }
        for name in emptied {
            // Another writer may have re-added under this name; only drop
            // entries that are still empty.
            self.symbols.remove_if(&name, |_, records| records.is_empty());
        }
    }

    pub fn get_file(&self, path: &str) -> Option<FileRecord> {
        self.files.get(path).map(|r| r.clone())
    }

    pub fn contains_file(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    /// All indexed project-relative paths, sorted for determinism.
    pub fn file_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.files.iter().map(|e| e.key().clone()).collect();
        paths.sort();
        paths
    }

    /// All file records, sorted by path.
    pub fn file_records(&self) -> Vec<FileRecord> {
        let mut records: Vec<FileRecord> = self.files.iter().map(|e| e.value().clone()).collect();
        records.sort_by(|a, b| a.path.cmp(&b.path));
        records
    }

    /// Match stored paths against a glob. `*` stays within a path segment,
    /// `**` crosses segments. Case-sensitive.
    pub fn find_files_by_pattern(&self, pattern: &str) -> Result<Vec<String>, globset::Error> {
        let matcher = Glob::new(pattern)?.compile_matcher();
        let mut matched: Vec<String> = self
            .files
            .iter()
            .filter(|e| matcher.is_match(e.key()))
            .map(|e| e.key().clone())
            .collect();
        matched.sort();
        Ok(matched)
    }

    /// Symbol lookup with tiered precedence: exact hits come first, then
    /// prefix hits, then substring hits, each tier sorted by (file, line).
    /// The mode selects how far down the tiers the lookup reaches.
    pub fn find_symbols(
        &self,
        name: &str,
        mode: SymbolMatchMode,
        case_sensitive: bool,
    ) -> Vec<SymbolRecord> {
        let needle = if case_sensitive {
            name.to_string()
        } else {
            name.to_lowercase()
        };

        let mut exact = Vec::new();
        let mut prefix = Vec::new();
        let mut substring = Vec::new();

        for entry in self.symbols.iter() {
            let candidate = if case_sensitive {
                entry.key().clone()
            } else {
                entry.key().to_lowercase()
            };
            let tier = if candidate == needle {
                Some(&mut exact)
            } else if mode != SymbolMatchMode::Exact && candidate.starts_with(&needle) {
                Some(&mut prefix)
            } else if mode == SymbolMatchMode::Substring && candidate.contains(&needle) {
                Some(&mut substring)
            } else {
                None
            };
            if let Some(bucket) = tier {
                bucket.extend(entry.value().iter().cloned());
            }
        }

        for bucket in [&mut exact, &mut prefix, &mut substring] {
            bucket.sort_by(|a, b| a.file.cmp(&b.file).then(a.line.cmp(&b.line)));
        }

        exact.extend(prefix);
        exact.extend(substring);
        exact
    }

    /// All symbol records, sorted by (file, line, name) for determinism.
    pub fn symbol_records(&self) -> Vec<SymbolRecord> {
        let mut records: Vec<SymbolRecord> = self
            .symbols
            .iter()
            .flat_map(|e| e.value().clone())
            .collect();
        records.sort_by(|a, b| {
            a.file
                .cmp(&b.file)
                .then(a.line.cmp(&b.line))
                .then(a.name.cmp(&b.name))
        });
        records
    }

    pub fn stats(&self) -> IndexStats {
        let mut languages: HashMap<String, usize> = HashMap::new();
        for entry in self.files.iter() {
            *languages.entry(entry.value().language.clone()).or_default() += 1;
        }
        let mut languages: Vec<(String, usize)> = languages.into_iter().collect();
        languages.sort();

        IndexStats {
            file_count: self.files.len(),
            symbol_count: self.symbols.iter().map(|e| e.value().len()).sum(),
            languages,
        }
    }

    /// Drop everything. Used by explicit full rebuilds.
    pub fn clear(&self) {
        self.files.clear();
        self.symbols.clear();
    }
}
