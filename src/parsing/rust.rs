//! Rust language capability using tree-sitter.

use super::{ParsedFile, ParserCapability, node_position, node_text, parse_tree};
use crate::types::{SymbolKind, SymbolRecord};
use tree_sitter::{Language, Node};

pub struct RustCapability;

impl RustCapability {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustCapability {
    fn default() -> Self {
        Self::new()
    }
}

impl ParserCapability for RustCapability {
    fn language_tag(&self) -> &'static str {
        "rust"
    }

    fn extensions(&self) -> &[&str] {
        &["rs"]
    }

    fn grammar(&self) -> Language {
        tree_sitter_rust::LANGUAGE.into()
    }

    fn parse(&self, source: &str, rel_path: &str) -> ParsedFile {
        let Some(tree) = parse_tree(self.grammar(), source) else {
            return ParsedFile::default();
        };
        let bytes = source.as_bytes();
        let mut parsed = ParsedFile::default();
        walk(tree.root_node(), bytes, rel_path, false, &mut parsed);
        parsed
    }
}

/// Recursive symbol walk. `in_impl` marks function items as methods when
/// they sit inside an impl or trait body.
fn walk(node: Node, bytes: &[u8], file: &str, in_impl: bool, out: &mut ParsedFile) {
    match node.kind() {
        "function_item" => {
            if let Some(name_node) = node.child_by_field_name("name") {
                let kind = if in_impl {
                    SymbolKind::Method
                } else {
                    SymbolKind::Function
                };
                push_symbol(out, name_node, node, bytes, file, kind, signature_of(node, bytes));
            }
        }
        "struct_item" | "enum_item" | "trait_item" | "union_item" => {
            if let Some(name_node) = node.child_by_field_name("name") {
                push_symbol(out, name_node, node, bytes, file, SymbolKind::Class, None);
                record_export(node, name_node, bytes, out);
            }
        }
        "const_item" | "static_item" => {
            if let Some(name_node) = node.child_by_field_name("name") {
                push_symbol(out, name_node, node, bytes, file, SymbolKind::Variable, None);
            }
        }
        "use_declaration" => {
            if let Some(arg) = node.child_by_field_name("argument") {
                out.imports.push(node_text(arg, bytes).to_string());
            }
        }
        _ => {}
    }

    // function_item export visibility is recorded at the declaration site
    if node.kind() == "function_item" {
        if let Some(name_node) = node.child_by_field_name("name") {
            record_export(node, name_node, bytes, out);
        }
    }

    let next_in_impl = in_impl || matches!(node.kind(), "impl_item" | "trait_item");
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk(child, bytes, file, next_in_impl, out);
    }
}

fn push_symbol(
    out: &mut ParsedFile,
    name_node: Node,
    decl_node: Node,
    bytes: &[u8],
    file: &str,
    kind: SymbolKind,
    signature: Option<String>,
) {
    let name = node_text(name_node, bytes).to_string();
    if name.is_empty() {
        return;
    }
    let (line, column) = node_position(decl_node);
    out.symbols.push(SymbolRecord {
        name,
        kind,
        file: file.to_string(),
        line,
        column,
        signature,
    });
}

fn signature_of(node: Node, bytes: &[u8]) -> Option<String> {
    node.child_by_field_name("parameters")
        .map(|p| node_text(p, bytes).to_string())
}

fn record_export(decl: Node, name_node: Node, bytes: &[u8], out: &mut ParsedFile) {
    let mut cursor = decl.walk();
    let is_pub = decl
        .children(&mut cursor)
        .any(|c| c.kind() == "visibility_modifier");
    if is_pub {
        out.exports.push(node_text(name_node, bytes).to_string());
    }
}
