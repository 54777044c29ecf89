//! Symbol extraction from source code.
//!
//! Uses tree-sitter for error-tolerant parsing. Each language implements
//! [`ParserCapability`]; files without a capability fall back to
//! line-count-only metadata so indexing never stalls on an exotic file.

pub mod python;
pub mod rust;
pub mod typescript;

use crate::types::SymbolRecord;
use std::path::Path;
use tree_sitter::{Language, Node, Parser, Tree};

/// Flat extraction result for one file. Partial results are fine; a parse
/// error yields whatever was recognized before it, or nothing.
#[derive(Debug, Default, Clone)]
pub struct ParsedFile {
    pub symbols: Vec<SymbolRecord>,
    pub imports: Vec<String>,
    pub exports: Vec<String>,
}

/// A pluggable per-language parser.
///
/// `parse` must never fail: malformed input degrades to partial or empty
/// results so the index builder's per-file isolation holds.
pub trait ParserCapability: Send + Sync {
    /// Language tag stored on the file record ("rust", "python", ...).
    fn language_tag(&self) -> &'static str;

    /// File extensions this capability handles.
    fn extensions(&self) -> &[&str];

    /// The tree-sitter grammar.
    fn grammar(&self) -> Language;

    /// Extract symbols, imports, and exports from file content.
    /// `rel_path` is the project-relative path recorded on each symbol.
    fn parse(&self, source: &str, rel_path: &str) -> ParsedFile;
}

/// Every registered capability, in routing order.
fn capabilities() -> Vec<Box<dyn ParserCapability>> {
    vec![
        Box::new(rust::RustCapability::new()),
        Box::new(python::PythonCapability::new()),
        Box::new(typescript::TypeScriptCapability::new_typescript()),
        Box::new(typescript::TypeScriptCapability::new_tsx()),
    ]
}

/// Get a capability for a file based on the extensions each capability
/// declares, or None when the file should take the fallback path.
pub fn capability_for_path(path: &Path) -> Option<Box<dyn ParserCapability>> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    capabilities()
        .into_iter()
        .find(|cap| cap.extensions().contains(&ext.as_str()))
}

/// Language tag for a path, independent of whether a capability exists.
/// Unsupported extensions still get a useful tag on their fallback record.
pub fn language_tag_for_path(path: &Path) -> &'static str {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return "unknown";
    };
    match ext.to_lowercase().as_str() {
        "rs" => "rust",
        "py" | "pyi" => "python",
        "ts" | "mts" | "cts" | "tsx" => "typescript",
        "js" | "mjs" | "cjs" | "jsx" => "javascript",
        "go" => "go",
        "java" => "java",
        "c" | "h" => "c",
        "cc" | "cpp" | "hpp" => "cpp",
        "rb" => "ruby",
        "md" => "markdown",
        "json" => "json",
        "toml" => "toml",
        "yaml" | "yml" => "yaml",
        _ => "unknown",
    }
}

/// Parse source with a grammar, absorbing failures into None.
pub(crate) fn parse_tree(grammar: Language, source: &str) -> Option<Tree> {
    let mut parser = Parser::new();
    if parser.set_language(&grammar).is_err() {
        return None;
    }
    parser.parse(source, None)
}

/// UTF-8 text of a node, empty on slicing errors.
pub(crate) fn node_text<'a>(node: Node, bytes: &'a [u8]) -> &'a str {
    std::str::from_utf8(&bytes[node.start_byte()..node.end_byte()]).unwrap_or("")
}

/// 1-based (line, column) of a node's start.
pub(crate) fn node_position(node: Node) -> (u32, u32) {
    let pos = node.start_position();
    (pos.row as u32 + 1, pos.column as u32 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn capability_routing_by_extension() {
        assert!(capability_for_path(&PathBuf::from("a.rs")).is_some());
        assert!(capability_for_path(&PathBuf::from("a.py")).is_some());
        assert!(capability_for_path(&PathBuf::from("a.tsx")).is_some());
        assert!(capability_for_path(&PathBuf::from("a.txt")).is_none());
        assert!(capability_for_path(&PathBuf::from("Makefile")).is_none());
    }

    #[test]
    fn routing_follows_declared_extensions() {
        // each capability must be reachable through every extension it
        // declares, and tsx must land on the tsx grammar, not plain ts
        for cap in capabilities() {
            for ext in cap.extensions() {
                let routed = capability_for_path(&PathBuf::from(format!("file.{ext}")))
                    .unwrap_or_else(|| panic!("no capability routed for .{ext}"));
                assert!(routed.extensions().contains(ext));
            }
        }
        let tsx = capability_for_path(&PathBuf::from("a.tsx")).unwrap();
        assert_eq!(tsx.extensions(), ["tsx"]);
        let ts = capability_for_path(&PathBuf::from("a.ts")).unwrap();
        assert!(!ts.extensions().contains(&"tsx"));
    }

    #[test]
    fn language_tags_cover_fallback_languages() {
        assert_eq!(language_tag_for_path(&PathBuf::from("x.go")), "go");
        assert_eq!(language_tag_for_path(&PathBuf::from("x.weird")), "unknown");
        assert_eq!(language_tag_for_path(&PathBuf::from("x")), "unknown");
    }

    #[test]
    fn malformed_input_produces_partial_results_not_errors() {
        let cap = python::PythonCapability::new();
        let parsed = cap.parse("def ok(): pass\ndef broken(:::\n", "bad.py");
        // tree-sitter is error tolerant; at minimum the valid symbol survives
        assert!(parsed.symbols.iter().any(|s| s.name == "ok"));
    }
}
