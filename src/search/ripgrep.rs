//! External search tool integration.
//!
//! When ripgrep is present on the host, text and regex queries shell out to
//! it (`rg --json`) and parse the structured match events. Absence, failure,
//! or timeout all degrade to the in-process scan with the same result shape,
//! so callers never observe which path ran.

use crate::types::{SearchMatch, SearchQuery};
use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use std::sync::OnceLock;
use std::time::Duration;
use tokio::process::Command;

/// Bound on one external search invocation.
const RIPGREP_TIMEOUT: Duration = Duration::from_secs(10);

static AVAILABLE: OnceLock<bool> = OnceLock::new();

/// Whether ripgrep is on the PATH. Probed once per process.
pub fn is_available() -> bool {
    *AVAILABLE.get_or_init(|| {
        std::process::Command::new("rg")
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    })
}

#[derive(Debug, Deserialize)]
struct RgEvent<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    data: Option<RgData>,
}

#[derive(Debug, Deserialize)]
struct RgData {
    path: Option<RgText>,
    lines: Option<RgText>,
    line_number: Option<u64>,
    #[serde(default)]
    submatches: Vec<RgSubmatch>,
}

#[derive(Debug, Deserialize)]
struct RgText {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RgSubmatch {
    start: usize,
}

/// Run ripgrep for a text or regex query rooted at `base`.
///
/// Err means "external path unusable, use the fallback". It is never
/// surfaced to the caller as a query failure; invalid user regexes are
/// validated before this point.
///
/// All match events are parsed; the caller filters to the indexed
/// candidate set, sorts, and applies the result limit, so matches in
/// files rg sees but the index does not never consume limit slots.
pub async fn search(base: &Path, query: &SearchQuery, literal: bool) -> Result<Vec<SearchMatch>, String> {
    let mut cmd = Command::new("rg");
    cmd.current_dir(base)
        .arg("--json")
        .arg("--no-config")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true);

    if literal {
        cmd.arg("--fixed-strings");
    }
    if !query.case_sensitive {
        cmd.arg("--ignore-case");
    }
    // rg honors .gitignore but not the discovery walk's default excludes;
    // mirror them so unindexed trees are not even read
    for pattern in crate::discovery::default_exclude_patterns() {
        cmd.arg("--glob").arg(format!("!{pattern}"));
    }
    if let Some(glob) = &query.file_pattern {
        cmd.arg("--glob").arg(glob);
    }
    cmd.arg("--").arg(&query.pattern).arg(".");

    let child = cmd.spawn().map_err(|e| format!("spawn rg: {e}"))?;
    let output = tokio::time::timeout(RIPGREP_TIMEOUT, child.wait_with_output())
        .await
        .map_err(|_| "rg timed out".to_string())?
        .map_err(|e| format!("rg io: {e}"))?;

    // rg exits 1 on "no matches", which is a valid empty result
    match output.status.code() {
        Some(0) | Some(1) => {}
        code => return Err(format!("rg exit status {code:?}")),
    }

    let stdout = String::from_utf8(output.stdout).map_err(|e| format!("rg output: {e}"))?;
    Ok(parse_json_lines(&stdout))
}

/// Parse every `rg --json` match event. Unknown or malformed events are
/// skipped. No cap is applied here: truncating in rg's parallel output
/// order would make which matches survive the limit nondeterministic.
fn parse_json_lines(stdout: &str) -> Vec<SearchMatch> {
    let mut matches = Vec::new();
    for line in stdout.lines() {
        let Ok(event) = serde_json::from_str::<RgEvent>(line) else {
            continue;
        };
        if event.kind != "match" {
            continue;
        }
        let Some(data) = event.data else { continue };
        let Some(file) = data.path.and_then(|p| p.text) else {
            continue;
        };
        let Some(line_number) = data.line_number else {
            continue;
        };
        let content = data
            .lines
            .and_then(|l| l.text)
            .unwrap_or_default()
            .trim_end_matches('\n')
            .trim()
            .to_string();
        let column = data.submatches.first().map(|s| s.start + 1).unwrap_or(1);

        matches.push(SearchMatch {
            file: normalize_rg_path(&file),
            line: line_number as u32,
            column: column as u32,
            content,
            symbol: None,
            kind: None,
        });
    }
    matches
}

fn normalize_rg_path(path: &str) -> String {
    let path = path.strip_prefix("./").unwrap_or(path);
    path.replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_match_events() {
        let stdout = concat!(
            r#"{"type":"begin","data":{"path":{"text":"./src/a.rs"}}}"#,
            "\n",
            r#"{"type":"match","data":{"path":{"text":"./src/a.rs"},"lines":{"text":"fn alpha() {}\n"},"line_number":3,"absolute_offset":20,"submatches":[{"match":{"text":"alpha"},"start":3,"end":8}]}}"#,
            "\n",
            r#"{"type":"end","data":{"path":{"text":"./src/a.rs"}}}"#,
            "\n",
        );
        let matches = parse_json_lines(stdout);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].file, "src/a.rs");
        assert_eq!(matches[0].line, 3);
        assert_eq!(matches[0].column, 4);
        assert_eq!(matches[0].content, "fn alpha() {}");
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let matches = parse_json_lines("not json\n{\"type\":\"summary\"}\n");
        assert!(matches.is_empty());
    }

    #[test]
    fn every_match_event_is_parsed() {
        // the result limit is applied by the caller after filtering and
        // sorting; the parser must not drop events on its own
        let event = r#"{"type":"match","data":{"path":{"text":"a"},"lines":{"text":"x"},"line_number":1,"submatches":[]}}"#;
        let stdout = format!("{event}\n{event}\n{event}\n");
        assert_eq!(parse_json_lines(&stdout).len(), 3);
    }
}
