//! Atomic multi-file editing.
//!
//! The filesystem has no multi-file transaction primitive, so the engine
//! runs a two-phase commit of its own: validate every operation against an
//! in-memory plan first, capture full pre-images, and only then write. Any
//! validation failure aborts the batch before a single byte hits disk; any
//! write failure restores every file written so far from its pre-image.
//! Rollback state lives only in memory and only for the duration of one
//! batch. After a successful apply the index records for the touched paths
//! are refreshed before the call returns, so a search issued immediately
//! afterwards observes the new content.

use crate::builder::IndexBuilder;
use crate::error::{content_preview, EngineError, Result};
use crate::store::IndexStore;
use crate::types::{EditOperation, EditReport, FileEditResult};
use regex::Regex;
use std::collections::HashMap;
use std::path::Component;
use std::path::Path;
use std::sync::Arc;

pub struct EditEngine {
    store: Arc<IndexStore>,
    builder: IndexBuilder,
}

/// Planned state of one file during validation.
struct FilePlan {
    pre_image: String,
    content: String,
}

impl EditEngine {
    pub fn new(store: Arc<IndexStore>) -> Self {
        Self {
            store,
            builder: IndexBuilder::new(),
        }
    }

    /// Apply a batch of content replacements atomically.
    ///
    /// Operations are validated in order against the planned content of
    /// each file, so several operations may target the same file and each
    /// sees the effect of the previous ones. Each file is written once,
    /// as a full rewrite. A file whose planned content ends up empty is
    /// deleted rather than left as a zero-byte husk.
    pub async fn apply_edits(&self, operations: &[EditOperation]) -> Result<EditReport> {
        // phase 1: validate everything, mutate nothing
        let mut plans: HashMap<String, FilePlan> = HashMap::new();
        let mut results = Vec::with_capacity(operations.len());

        for op in operations {
            validate_operation(op)?;
            ensure_relative(&op.file_path)?;

            if !plans.contains_key(&op.file_path) {
                let abs = self.store.absolute_path(&op.file_path);
                let content = read_text(&abs, &op.file_path).await?;
                plans.insert(
                    op.file_path.clone(),
                    FilePlan {
                        pre_image: content.clone(),
                        content,
                    },
                );
            }
            let plan = plans
                .get_mut(&op.file_path)
                .ok_or_else(|| EngineError::FileNotFound(op.file_path.clone()))?;

            let normalized = replace_in_plan(plan, op)?;
            results.push(FileEditResult {
                file: op.file_path.clone(),
                normalized,
            });
        }

        // phase 2: write, rolling back everything on the first failure
        let mut order: Vec<&String> = plans.keys().collect();
        order.sort();
        let mut written: Vec<String> = Vec::new();

        for rel in &order {
            let plan = &plans[rel.as_str()];
            let abs = self.store.absolute_path(rel);
            let outcome = if plan.content.is_empty() {
                tokio::fs::remove_file(&abs).await
            } else {
                tokio::fs::write(&abs, &plan.content).await
            };
            if let Err(err) = outcome {
                self.rollback(&plans, &written).await;
                return Err(EngineError::WriteFailure {
                    path: (*rel).clone(),
                    reason: err.to_string(),
                });
            }
            written.push((*rel).clone());
        }

        let files_changed: Vec<String> = order.iter().map(|rel| (*rel).clone()).collect();
        self.builder.refresh_paths(&self.store, &files_changed).await?;

        Ok(EditReport {
            success: true,
            results,
            files_changed,
            error: None,
        })
    }

    /// Rename a symbol project-wide by rewriting every whole-word occurrence
    /// through one atomic edit batch.
    ///
    /// Conflict detection is a flat project-wide name check: if any indexed
    /// symbol already carries the new name the rename is refused. Scopes are
    /// not analyzed, so an unrelated symbol with the same name in a distant
    /// file blocks the rename. Known limitation.
    pub async fn rename_symbol(&self, old_name: &str, new_name: &str) -> Result<EditReport> {
        if !is_identifier(new_name) {
            return Err(EngineError::Validation(format!(
                "'{new_name}' is not a valid identifier"
            )));
        }
        if old_name == new_name {
            return Err(EngineError::Validation(
                "old and new names are identical".into(),
            ));
        }
        if !self
            .store
            .find_symbols(new_name, crate::types::SymbolMatchMode::Exact, true)
            .is_empty()
        {
            return Err(EngineError::Validation(format!(
                "a symbol named '{new_name}' already exists"
            )));
        }
        if self
            .store
            .find_symbols(old_name, crate::types::SymbolMatchMode::Exact, true)
            .is_empty()
        {
            return Err(EngineError::SymbolNotFound(old_name.to_string()));
        }

        let word = Regex::new(&format!(r"\b{}\b", regex::escape(old_name)))
            .map_err(|e| EngineError::Validation(format!("unusable symbol name: {e}")))?;

        let mut operations = Vec::new();
        for rel in self.store.file_paths() {
            let abs = self.store.absolute_path(&rel);
            let Ok(content) = tokio::fs::read_to_string(&abs).await else {
                continue;
            };
            if !word.is_match(&content) {
                continue;
            }
            let rewritten = word.replace_all(&content, new_name).into_owned();
            operations.push(EditOperation {
                file_path: rel,
                old_content: content,
                new_content: rewritten,
            });
        }

        if operations.is_empty() {
            return Err(EngineError::SymbolNotFound(old_name.to_string()));
        }

        let report = self.apply_edits(&operations).await?;
        tracing::info!(
            "renamed '{}' to '{}' across {} files",
            old_name,
            new_name,
            report.files_changed.len()
        );
        Ok(report)
    }

    /// Restore every already-written file from its pre-image. Restore
    /// failures are logged and skipped so the remaining files still get
    /// their originals back.
    async fn rollback(&self, plans: &HashMap<String, FilePlan>, written: &[String]) {
        for rel in written {
            let Some(plan) = plans.get(rel) else { continue };
            let abs = self.store.absolute_path(rel);
            if let Err(err) = tokio::fs::write(&abs, &plan.pre_image).await {
                tracing::error!("rollback of {} failed: {}", rel, err);
            }
        }
    }
}

fn validate_operation(op: &EditOperation) -> Result<()> {
    if op.file_path.is_empty() {
        return Err(EngineError::Validation("empty file path".into()));
    }
    if op.old_content.is_empty() {
        return Err(EngineError::Validation(format!(
            "empty old content for {}",
            op.file_path
        )));
    }
    Ok(())
}

/// Edits address files inside the project only.
fn ensure_relative(rel: &str) -> Result<()> {
    let path = Path::new(rel);
    let escapes = path.is_absolute()
        || path
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)));
    if escapes {
        return Err(EngineError::InvalidPath {
            path: path.to_path_buf(),
            reason: "path must stay within the project root".into(),
        });
    }
    Ok(())
}

async fn read_text(abs: &Path, rel: &str) -> Result<String> {
    let bytes = match tokio::fs::read(abs).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(EngineError::FileNotFound(rel.to_string()));
        }
        Err(err) => return Err(EngineError::Io(err)),
    };
    String::from_utf8(bytes).map_err(|_| {
        EngineError::Validation(format!("{rel} is not valid UTF-8 text"))
    })
}

/// Apply one operation to the planned content. Returns whether the match
/// needed whitespace normalization.
fn replace_in_plan(plan: &mut FilePlan, op: &EditOperation) -> Result<bool> {
    if let Some(start) = plan.content.find(&op.old_content) {
        let end = start + op.old_content.len();
        plan.content.replace_range(start..end, &op.new_content);
        return Ok(false);
    }

    match normalized_window_replace(&plan.content, &op.old_content, &op.new_content) {
        Some(rewritten) => {
            plan.content = rewritten;
            Ok(true)
        }
        None => Err(EngineError::ContentMismatch {
            path: op.file_path.clone(),
            expected: content_preview(&op.old_content),
            found: content_preview(&plan.content),
        }),
    }
}

/// Fallback matching that tolerates tab/space and line-ending differences
/// only. Each line is compared with its whitespace runs collapsed; the
/// first window of lines that matches is replaced wholesale with the new
/// content, preserving everything around it.
fn normalized_window_replace(content: &str, old: &str, new: &str) -> Option<String> {
    let old_lines: Vec<String> = old.lines().map(normalize_line).collect();
    if old_lines.is_empty() {
        return None;
    }
    let content_lines: Vec<&str> = content.lines().collect();
    if content_lines.len() < old_lines.len() {
        return None;
    }

    for start in 0..=content_lines.len() - old_lines.len() {
        let window = &content_lines[start..start + old_lines.len()];
        let matches = window
            .iter()
            .zip(&old_lines)
            .all(|(line, wanted)| normalize_line(line) == *wanted);
        if !matches {
            continue;
        }

        let mut rebuilt: Vec<&str> = Vec::with_capacity(content_lines.len());
        rebuilt.extend_from_slice(&content_lines[..start]);
        rebuilt.extend(new.lines());
        rebuilt.extend_from_slice(&content_lines[start + old_lines.len()..]);

        let mut result = rebuilt.join("\n");
        if content.ends_with('\n') && !result.is_empty() {
            result.push('\n');
        }
        return Some(result);
    }
    None
}

fn normalize_line(line: &str) -> String {
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}
