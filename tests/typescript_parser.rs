use scout_index::parsing::{capability_for_path, ParsedFile};
use scout_index::SymbolKind;
use std::path::Path;

fn parse(rel: &str, source: &str) -> ParsedFile {
    let capability = capability_for_path(Path::new(rel)).expect("capability for path");
    capability.parse(source, rel)
}

fn names_of(parsed: &ParsedFile, kind: SymbolKind) -> Vec<&str> {
    parsed
        .symbols
        .iter()
        .filter(|s| s.kind == kind)
        .map(|s| s.name.as_str())
        .collect()
}

#[test]
fn extracts_functions_classes_and_methods() {
    let source = r#"
function greet(name: string): string {
    return `hi ${name}`;
}

class Greeter {
    greet() { return greet("x"); }
}

interface Shape {
    area(): number;
}
"#;
    let parsed = parse("src/alpha.ts", source);

    assert_eq!(names_of(&parsed, SymbolKind::Function), vec!["greet"]);
    assert_eq!(names_of(&parsed, SymbolKind::Class), vec!["Greeter", "Shape"]);
    assert_eq!(names_of(&parsed, SymbolKind::Method), vec!["greet"]);
}

#[test]
fn arrow_function_bindings_count_as_functions() {
    let source = "const handler = (event: Event) => process(event);\nconst LIMIT = 10;\n";
    let parsed = parse("handlers.ts", source);

    assert_eq!(names_of(&parsed, SymbolKind::Function), vec!["handler"]);
    assert_eq!(names_of(&parsed, SymbolKind::Variable), vec!["LIMIT"]);
}

#[test]
fn exports_and_imports_are_collected() {
    let source = r#"
import { useState } from "react";
import fs from 'node:fs';

export function visible() {}
export const config = { a: 1 };
"#;
    let parsed = parse("mod.ts", source);

    assert!(parsed.imports.contains(&"react".to_string()));
    assert!(parsed.imports.contains(&"node:fs".to_string()));
    assert!(parsed.exports.contains(&"visible".to_string()));
    assert!(parsed.exports.contains(&"config".to_string()));
}

#[test]
fn tsx_files_parse_with_the_tsx_grammar() {
    let source = r#"
export function App() {
    return <div className="app">hello</div>;
}
"#;
    let parsed = parse("app.tsx", source);
    assert_eq!(names_of(&parsed, SymbolKind::Function), vec!["App"]);
    assert!(parsed.exports.contains(&"App".to_string()));
}

#[test]
fn positions_are_one_based() {
    let parsed = parse("pos.ts", "function first() {}\nfunction second() {}\n");
    let lines: Vec<u32> = parsed.symbols.iter().map(|s| s.line).collect();
    assert_eq!(lines, vec![1, 2]);
    assert!(parsed.symbols.iter().all(|s| s.column >= 1));
}

#[test]
fn malformed_source_yields_partial_results_not_a_panic() {
    let parsed = parse("broken.ts", "function ok() {}\nclass {{{ nonsense\n");
    assert!(names_of(&parsed, SymbolKind::Function).contains(&"ok"));
}
