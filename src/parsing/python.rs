//! Python language capability using tree-sitter.

use super::{ParsedFile, ParserCapability, node_position, node_text, parse_tree};
use crate::types::{SymbolKind, SymbolRecord};
use tree_sitter::{Language, Node};

pub struct PythonCapability;

impl PythonCapability {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PythonCapability {
    fn default() -> Self {
        Self::new()
    }
}

impl ParserCapability for PythonCapability {
    fn language_tag(&self) -> &'static str {
        "python"
    }

    fn extensions(&self) -> &[&str] {
        &["py", "pyi"]
    }

    fn grammar(&self) -> Language {
        tree_sitter_python::LANGUAGE.into()
    }

    fn parse(&self, source: &str, rel_path: &str) -> ParsedFile {
        let Some(tree) = parse_tree(self.grammar(), source) else {
            return ParsedFile::default();
        };
        let bytes = source.as_bytes();
        let mut parsed = ParsedFile::default();
        walk(tree.root_node(), bytes, rel_path, false, true, &mut parsed);
        parsed
    }
}

/// Recursive walk. `in_class` turns functions into methods; `at_module`
/// limits variable extraction to module-level assignments so loop locals
/// do not flood the index.
fn walk(node: Node, bytes: &[u8], file: &str, in_class: bool, at_module: bool, out: &mut ParsedFile) {
    match node.kind() {
        "function_definition" => {
            if let Some(name_node) = node.child_by_field_name("name") {
                let kind = if in_class {
                    SymbolKind::Method
                } else {
                    SymbolKind::Function
                };
                let signature = node
                    .child_by_field_name("parameters")
                    .map(|p| node_text(p, bytes).to_string());
                push_symbol(out, name_node, node, bytes, file, kind, signature);
            }
            descend(node, bytes, file, false, false, out);
            return;
        }
        "class_definition" => {
            if let Some(name_node) = node.child_by_field_name("name") {
                push_symbol(out, name_node, node, bytes, file, SymbolKind::Class, None);
            }
            descend(node, bytes, file, true, false, out);
            return;
        }
        "import_statement" | "import_from_statement" => {
            collect_imports(node, bytes, out);
            return;
        }
        "assignment" if at_module => {
            if let Some(left) = node.child_by_field_name("left") {
                if left.kind() == "identifier" {
                    let name = node_text(left, bytes);
                    if name == "__all__" {
                        collect_dunder_all(node, bytes, out);
                    } else {
                        push_symbol(out, left, node, bytes, file, SymbolKind::Variable, None);
                    }
                }
            }
        }
        _ => {}
    }

    descend(node, bytes, file, in_class, at_module, out);
}

fn descend(node: Node, bytes: &[u8], file: &str, in_class: bool, at_module: bool, out: &mut ParsedFile) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk(child, bytes, file, in_class, at_module, out);
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

/// `import a.b, c` and `from a import b, c as d` both contribute dotted
/// module paths; aliased names keep their original target.
fn collect_imports(node: Node, bytes: &[u8], out: &mut ParsedFile) {
    let module_node = node.child_by_field_name("module_name");
    let module = module_node.map(|m| node_text(m, bytes).to_string());

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        // the module path itself appears as a dotted_name child; skip it
        if module_node.is_some_and(|m| m.id() == child.id()) {
            continue;
        }
        match child.kind() {
            "dotted_name" => {
                let text = node_text(child, bytes).to_string();
                match &module {
                    Some(m) => out.imports.push(format!("{}.{}", m, text)),
                    None => out.imports.push(text),
                }
            }
            "aliased_import" => {
                if let Some(name) = child.child_by_field_name("name") {
                    let text = node_text(name, bytes).to_string();
                    match &module {
                        Some(m) => out.imports.push(format!("{}.{}", m, text)),
                        None => out.imports.push(text),
                    }
                }
            }
            "wildcard_import" => {
                if let Some(m) = &module {
                    out.imports.push(format!("{}.*", m));
                }
            }
            _ => {}
        }
    }
}

/// Pull string elements out of `__all__ = ["a", "b"]`.
fn collect_dunder_all(assignment: Node, bytes: &[u8], out: &mut ParsedFile) {
    let Some(right) = assignment.child_by_field_name("right") else {
        return;
    };
    let mut stack = vec![right];
    while let Some(node) = stack.pop() {
        if node.kind() == "string_content" {
            out.exports.push(node_text(node, bytes).to_string());
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            stack.push(child);
        }
    }
    out.exports.sort();
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> ParsedFile {
        PythonCapability::new().parse(source, "mod.py")
    }

    #[test]
    fn extracts_functions_classes_and_methods() {
        let parsed = parse(
            "def foo(a, b):\n    pass\n\nclass Widget:\n    def render(self):\n        pass\n",
        );
        let names: Vec<(&str, SymbolKind)> = parsed
            .symbols
            .iter()
            .map(|s| (s.name.as_str(), s.kind))
            .collect();
        assert_eq!(
            names,
            vec![
                ("foo", SymbolKind::Function),
                ("Widget", SymbolKind::Class),
                ("render", SymbolKind::Method),
            ]
        );
        assert_eq!(parsed.symbols[0].signature.as_deref(), Some("(a, b)"));
        assert_eq!(parsed.symbols[0].line, 1);
    }

    #[test]
    fn module_level_variables_only() {
        let parsed = parse("LIMIT = 10\n\ndef f():\n    local = 1\n");
        let vars: Vec<&str> = parsed
            .symbols
            .iter()
            .filter(|s| s.kind == SymbolKind::Variable)
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(vars, vec!["LIMIT"]);
    }

    #[test]
    fn imports_and_dunder_all() {
        let parsed = parse(
            "import os\nimport os.path\nfrom collections import OrderedDict\n__all__ = [\"f\", \"g\"]\n",
        );
        assert_eq!(
            parsed.imports,
            vec!["os", "os.path", "collections.OrderedDict"]
        );
        assert_eq!(parsed.exports, vec!["f", "g"]);
    }

    #[test]
    fn shadowed_names_keep_both_records() {
        let parsed = parse("def dup():\n    pass\n\ndef dup():\n    pass\n");
        assert_eq!(parsed.symbols.len(), 2);
        assert_eq!(parsed.symbols[0].name, "dup");
        assert_eq!(parsed.symbols[1].name, "dup");
        assert_ne!(parsed.symbols[0].line, parsed.symbols[1].line);
    }
}
