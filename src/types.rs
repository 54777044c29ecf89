//! Core data model for the index.
//!
//! Two record types make up the index: [`FileRecord`] (one per indexed file,
//! replaced wholesale on re-index) and [`SymbolRecord`] (one per declaration,
//! always owned by a live file record). Query and edit value types live here
//! too so every layer shares one vocabulary.

use crate::change::Fingerprint;
use serde::{Deserialize, Serialize};

/// Default cap on search results to bound query cost.
pub const DEFAULT_RESULT_LIMIT: usize = 1000;

/// A single indexed file. Keyed by project-relative, slash-normalized path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    /// Project-relative path with `/` separators. Unique key.
    pub path: String,
    /// Detected language tag ("rust", "python", ...; "unknown" allowed).
    pub language: String,
    /// Number of lines in the file.
    pub line_count: usize,
    /// Symbol names declared in this file, in declaration order.
    /// Duplicates allowed where the language permits shadowing.
    pub symbol_names: Vec<String>,
    /// Imported module/symbol references, in source order.
    pub imports: Vec<String>,
    /// Exported symbol references, in source order.
    pub exports: Vec<String>,
    /// Change-detection fingerprint, recomputed on every refresh.
    pub fingerprint: Fingerprint,
}

/// Kind of a declared symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Function,
    Class,
    Method,
    Variable,
    Import,
    Unknown,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Class => "class",
            Self::Method => "method",
            Self::Variable => "variable",
            Self::Import => "import",
            Self::Unknown => "unknown",
        }
    }
}

/// A symbol declaration. Multiple records may share a name (overloads,
/// same name in different files). The `file` back-reference must always
/// resolve to a live [`FileRecord`]; the store enforces the cascade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolRecord {
    pub name: String,
    pub kind: SymbolKind,
    /// Project-relative path of the owning file.
    pub file: String,
    /// 1-based declaration line.
    pub line: u32,
    /// 1-based declaration column.
    pub column: u32,
    /// Parameter list / type, when the parser could extract one.
    pub signature: Option<String>,
}

/// Search strategy selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchKind {
    Text,
    Regex,
    Symbol,
    References,
    Definition,
    Callers,
}

impl SearchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Regex => "regex",
            Self::Symbol => "symbol",
            Self::References => "references",
            Self::Definition => "definition",
            Self::Callers => "callers",
        }
    }
}

/// How a symbol pattern is matched against candidate names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolMatchMode {
    Exact,
    Prefix,
    #[default]
    Substring,
}

/// A search request. One shape for every strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
    pub pattern: String,
    pub kind: SearchKind,
    /// Optional glob restricting candidate files (`*` within a segment,
    /// `**` across segments).
    pub file_pattern: Option<String>,
    pub case_sensitive: bool,
    /// Hard cap on returned matches.
    pub limit: usize,
    /// Matching mode for `kind == Symbol`.
    pub symbol_mode: SymbolMatchMode,
}

impl SearchQuery {
    pub fn new(pattern: impl Into<String>, kind: SearchKind) -> Self {
        Self {
            pattern: pattern.into(),
            kind,
            file_pattern: None,
            case_sensitive: true,
            limit: DEFAULT_RESULT_LIMIT,
            symbol_mode: SymbolMatchMode::default(),
        }
    }

    pub fn with_file_pattern(mut self, glob: impl Into<String>) -> Self {
        self.file_pattern = Some(glob.into());
        self
    }

    pub fn case_insensitive(mut self) -> Self {
        self.case_sensitive = false;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_symbol_mode(mut self, mode: SymbolMatchMode) -> Self {
        self.symbol_mode = mode;
        self
    }

    /// Stable signature for result caching. Two queries with the same
    /// signature are interchangeable.
    pub fn signature(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}|{}",
            self.kind.as_str(),
            self.pattern,
            self.file_pattern.as_deref().unwrap_or(""),
            self.case_sensitive,
            self.limit,
            match self.symbol_mode {
                SymbolMatchMode::Exact => "exact",
                SymbolMatchMode::Prefix => "prefix",
                SymbolMatchMode::Substring => "substring",
            }
        )
    }
}

/// One search hit. Text and symbol strategies produce the same shape;
/// symbol hits additionally carry the resolved name and kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchMatch {
    /// Project-relative path.
    pub file: String,
    /// 1-based line.
    pub line: u32,
    /// 1-based column.
    pub column: u32,
    /// The matching line (text search) or declaration signature/name
    /// (symbol search), trimmed.
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<SymbolKind>,
}

/// One requested content replacement. Transient; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditOperation {
    /// Project-relative path of the target file.
    pub file_path: String,
    /// Exact expected content to replace. Whitespace-normalized matching
    /// is attempted when the exact form is absent.
    pub old_content: String,
    /// Replacement. Empty means: delete the matched span.
    pub new_content: String,
}

/// Per-file outcome within an edit batch.
#[derive(Debug, Clone, Serialize)]
pub struct FileEditResult {
    pub file: String,
    /// Whether the match needed whitespace normalization.
    pub normalized: bool,
}

/// Outcome of an atomic edit batch.
#[derive(Debug, Clone, Serialize)]
pub struct EditReport {
    pub success: bool,
    /// One entry per applied operation, in application order.
    pub results: Vec<FileEditResult>,
    /// Distinct files rewritten on disk.
    pub files_changed: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Index-wide statistics.
#[derive(Debug, Clone, Serialize)]
pub struct IndexStats {
    pub file_count: usize,
    pub symbol_count: usize,
    /// language tag -> file count, sorted by tag for stable output.
    pub languages: Vec<(String, usize)>,
}
