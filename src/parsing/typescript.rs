//! TypeScript/TSX language capability using tree-sitter.

use super::{ParsedFile, ParserCapability, node_position, node_text, parse_tree};
use crate::types::{SymbolKind, SymbolRecord};
use tree_sitter::{Language, Node};

pub struct TypeScriptCapability {
    grammar: Language,
    extensions: &'static [&'static str],
}

impl TypeScriptCapability {
    pub fn new_typescript() -> Self {
        Self {
            grammar: tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            extensions: &["ts", "mts", "cts"],
        }
    }

    pub fn new_tsx() -> Self {
        Self {
            grammar: tree_sitter_typescript::LANGUAGE_TSX.into(),
            extensions: &["tsx"],
        }
    }
}

impl ParserCapability for TypeScriptCapability {
    fn language_tag(&self) -> &'static str {
        "typescript"
    }

    fn extensions(&self) -> &[&str] {
        self.extensions
    }

    fn grammar(&self) -> Language {
        self.grammar.clone()
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

fn walk(node: Node, bytes: &[u8], file: &str, exported: bool, out: &mut ParsedFile) {
    match node.kind() {
        "function_declaration" | "generator_function_declaration" => {
            if let Some(name_node) = node.child_by_field_name("name") {
                let signature = node
                    .child_by_field_name("parameters")
                    .map(|p| node_text(p, bytes).to_string());
                push_symbol(out, name_node, node, bytes, file, SymbolKind::Function, signature);
                if exported {
                    out.exports.push(node_text(name_node, bytes).to_string());
                }
            }
        }
        "class_declaration"
        | "abstract_class_declaration"
        | "interface_declaration"
        | "enum_declaration"
        | "type_alias_declaration" => {
            if let Some(name_node) = node.child_by_field_name("name") {
                push_symbol(out, name_node, node, bytes, file, SymbolKind::Class, None);
                if exported {
                    out.exports.push(node_text(name_node, bytes).to_string());
                }
            }
        }
        "method_definition" => {
            if let Some(name_node) = node.child_by_field_name("name") {
                let signature = node
                    .child_by_field_name("parameters")
                    .map(|p| node_text(p, bytes).to_string());
                push_symbol(out, name_node, node, bytes, file, SymbolKind::Method, signature);
            }
        }
        "variable_declarator" => {
            if let Some(name_node) = node.child_by_field_name("name") {
                if name_node.kind() == "identifier" {
                    // arrow-function initializers read as functions
                    let kind = match node.child_by_field_name("value") {
                        Some(v) if matches!(v.kind(), "arrow_function" | "function_expression") => {
                            SymbolKind::Function
                        }
                        _ => SymbolKind::Variable,
                    };
                    push_symbol(out, name_node, node, bytes, file, kind, None);
                    if exported {
                        out.exports.push(node_text(name_node, bytes).to_string());
                    }
                }
            }
        }
        "import_statement" => {
            if let Some(source_node) = node.child_by_field_name("source") {
                out.imports
                    .push(node_text(source_node, bytes).trim_matches(['"', '\'']).to_string());
            }
            return;
        }
        "export_statement" => {
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                walk(child, bytes, file, true, out);
            }
            return;
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk(child, bytes, file, exported, out);
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

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> ParsedFile {
        TypeScriptCapability::new_typescript().parse(source, "app.ts")
    }

    #[test]
    fn extracts_functions_classes_methods() {
        let parsed = parse(
            "function greet(name: string) {}\n\
             class Session {\n  close() {}\n}\n\
             const handler = () => {};\n",
        );
        let names: Vec<(&str, SymbolKind)> = parsed
            .symbols
            .iter()
            .map(|s| (s.name.as_str(), s.kind))
            .collect();
        assert_eq!(
            names,
            vec![
                ("greet", SymbolKind::Function),
                ("Session", SymbolKind::Class),
                ("close", SymbolKind::Method),
                ("handler", SymbolKind::Function),
            ]
        );
        assert_eq!(parsed.symbols[0].signature.as_deref(), Some("(name: string)"));
    }

    #[test]
    fn imports_and_exports() {
        let parsed = parse(
            "import { readFile } from 'fs';\n\
             export function api() {}\n\
             export const VERSION = 1;\n",
        );
        assert_eq!(parsed.imports, vec!["fs"]);
        assert_eq!(parsed.exports, vec!["api", "VERSION"]);
    }

    #[test]
    fn interfaces_count_as_classes() {
        let parsed = parse("interface Shape { area(): number; }\n");
        assert_eq!(parsed.symbols[0].name, "Shape");
        assert_eq!(parsed.symbols[0].kind, SymbolKind::Class);
    }
}
