//! scout - CLI for the Scout code index
//!
//! A thin adapter over the index engine, designed for AI coding assistants.
//!
//! # Usage
//!
//! ```bash
//! # Build the index and report counts
//! scout index --project /path/to/repo
//!
//! # Search
//! scout search --project /path/to/repo "parse_config" --kind symbol
//!
//! # Rename a symbol across the project
//! scout rename --project /path/to/repo old_name new_name
//!
//! # Apply an edit batch from a JSON file
//! scout edit --project /path/to/repo edits.json
//! ```
//!
//! # Design for AI Agents
//!
//! - `--json` flag outputs machine-readable JSON
//! - Errors go to stderr, results to stdout
//! - Exit codes: 0 = success, 1 = error

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use scout_index::export::IndexSnapshot;
use scout_index::{
    EditOperation, EditReport, FileRecord, IndexReport, IndexStats, ProjectSession, SearchKind,
    SearchMatch, SearchQuery, SymbolMatchMode,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "scout")]
#[command(version)]
#[command(about = "Scout - incremental code index and search for AI agents")]
#[command(long_about = r#"
scout indexes a project tree and answers structured queries over it.

It provides:
  - Incremental indexing (only changed files are re-parsed)
  - Text, regex, symbol, definition, references and callers search
  - Atomic multi-file edits with rollback
  - Project-wide symbol rename

Designed for automation: use --json for machine-readable output.
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project directory to index
    #[arg(short, long, global = true, default_value = ".")]
    project: PathBuf,

    /// Output JSON instead of human-readable text
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Text,
    Regex,
    Symbol,
    References,
    Definition,
    Callers,
}

impl From<KindArg> for SearchKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Text => SearchKind::Text,
            KindArg::Regex => SearchKind::Regex,
            KindArg::Symbol => SearchKind::Symbol,
            KindArg::References => SearchKind::References,
            KindArg::Definition => SearchKind::Definition,
            KindArg::Callers => SearchKind::Callers,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Exact,
    Prefix,
    Substring,
}

impl From<ModeArg> for SymbolMatchMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Exact => SymbolMatchMode::Exact,
            ModeArg::Prefix => SymbolMatchMode::Prefix,
            ModeArg::Substring => SymbolMatchMode::Substring,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from scratch and report counts
    Index,

    /// Re-index only files that changed since the last pass
    Refresh,

    /// Search the project
    Search {
        /// Pattern to search for
        pattern: String,

        /// Search strategy
        #[arg(short, long, value_enum, default_value = "text")]
        kind: KindArg,

        /// Restrict to files matching this glob
        #[arg(short, long)]
        glob: Option<String>,

        /// Case-insensitive matching
        #[arg(short = 'i', long)]
        ignore_case: bool,

        /// Maximum results to return
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,

        /// Matching mode for symbol search
        #[arg(long, value_enum, default_value = "substring")]
        mode: ModeArg,
    },

    /// List indexed files matching a glob
    Files {
        /// Glob pattern (`*` within a segment, `**` across segments)
        pattern: String,
    },

    /// Show the indexed record for one file
    Summary {
        /// Project-relative file path
        path: String,
    },

    /// Show index statistics
    Stats,

    /// Rename a symbol across the whole project
    Rename {
        /// Current symbol name
        old_name: String,

        /// New symbol name
        new_name: String,
    },

    /// Apply an edit batch atomically
    Edit {
        /// JSON file holding an array of {file_path, old_content, new_content}
        operations: PathBuf,
    },

    /// Export the index as a versioned JSON snapshot
    Export,
}

#[tokio::main]
async fn main() -> Result<()> {
    // logging to stderr only, stdout stays machine-parseable
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    match run_command(&cli).await {
        Ok(output) => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                print_human_readable(&output);
            }
            Ok(())
        }
        Err(e) => {
            if cli.json {
                let err = serde_json::json!({ "error": e.to_string() });
                eprintln!("{}", serde_json::to_string_pretty(&err)?);
            } else {
                eprintln!("Error: {}", e);
            }
            std::process::exit(1);
        }
    }
}

async fn run_command(cli: &Cli) -> Result<Output> {
    let (session, report) = ProjectSession::open(&cli.project).await?;

    match &cli.command {
        Commands::Index => Ok(Output::Index {
            project: session.base_path().display().to_string(),
            report: report.into(),
        }),

        Commands::Refresh => {
            let report = session.refresh().await?;
            Ok(Output::Refresh {
                report: report.into(),
            })
        }

        Commands::Search {
            pattern,
            kind,
            glob,
            ignore_case,
            limit,
            mode,
        } => {
            let mut query = SearchQuery::new(pattern.clone(), (*kind).into())
                .with_limit(*limit)
                .with_symbol_mode((*mode).into());
            if let Some(glob) = glob {
                query = query.with_file_pattern(glob.clone());
            }
            if *ignore_case {
                query = query.case_insensitive();
            }
            let matches = session.search(&query).await?;
            Ok(Output::Search {
                pattern: pattern.clone(),
                kind: query.kind.as_str().to_string(),
                matches,
            })
        }

        Commands::Files { pattern } => {
            let files = session.find_files(pattern)?;
            Ok(Output::Files {
                pattern: pattern.clone(),
                files,
            })
        }

        Commands::Summary { path } => {
            let record = session.file_summary(path)?;
            Ok(Output::Summary { record })
        }

        Commands::Stats => Ok(Output::Stats {
            stats: session.stats(),
        }),

        Commands::Rename { old_name, new_name } => {
            let report = session.rename_symbol(old_name, new_name).await?;
            Ok(Output::Edit { report })
        }

        Commands::Edit { operations } => {
            let raw = std::fs::read_to_string(operations)
                .with_context(|| format!("cannot read {}", operations.display()))?;
            let ops: Vec<EditOperation> = serde_json::from_str(&raw)
                .with_context(|| format!("invalid edit batch in {}", operations.display()))?;
            let report = session.apply_edits(&ops).await?;
            Ok(Output::Edit { report })
        }

        Commands::Export => Ok(Output::Export {
            snapshot: session.export_snapshot(),
        }),
    }
}

#[derive(serde::Serialize)]
#[serde(tag = "type")]
enum Output {
    Index {
        project: String,
        report: IndexReportOut,
    },
    Refresh {
        report: IndexReportOut,
    },
    Search {
        pattern: String,
        kind: String,
        matches: Vec<SearchMatch>,
    },
    Files {
        pattern: String,
        files: Vec<String>,
    },
    Summary {
        record: FileRecord,
    },
    Stats {
        stats: IndexStats,
    },
    Edit {
        report: EditReport,
    },
    Export {
        snapshot: IndexSnapshot,
    },
}

/// Serializable view of an index pass.
#[derive(serde::Serialize)]
struct IndexReportOut {
    total_files: usize,
    parsed_files: usize,
    fallback_files: usize,
    added: usize,
    modified: usize,
    removed: usize,
    skipped_files: usize,
}

impl From<IndexReport> for IndexReportOut {
    fn from(report: IndexReport) -> Self {
        Self {
            total_files: report.total_files,
            parsed_files: report.parsed_files,
            fallback_files: report.fallback_files,
            added: report.added,
            modified: report.modified,
            removed: report.removed,
            skipped_files: report.skipped_files,
        }
    }
}

fn print_human_readable(output: &Output) {
    match output {
        Output::Index { project, report } => {
            println!(
                "Indexed {} files ({} parsed, {} fallback)",
                report.total_files, report.parsed_files, report.fallback_files
            );
            println!("Project: {}", project);
        }
        Output::Refresh { report } => {
            println!(
                "Refreshed: {} added, {} modified, {} removed, {} unchanged",
                report.added, report.modified, report.removed, report.skipped_files
            );
        }
        Output::Search {
            pattern,
            kind,
            matches,
        } => {
            println!("Search ({}): \"{}\"", kind, pattern);
            println!("Found {} matches:", matches.len());
            for m in matches {
                match &m.symbol {
                    Some(symbol) => println!(
                        "  {}:{}:{} {} [{}]",
                        m.file,
                        m.line,
                        m.column,
                        symbol,
                        m.kind.map(|k| k.as_str()).unwrap_or("unknown")
                    ),
                    None => println!("  {}:{}:{} {}", m.file, m.line, m.column, m.content),
                }
            }
        }
        Output::Files { pattern, files } => {
            println!("Files matching \"{}\":", pattern);
            for file in files {
                println!("  {}", file);
            }
        }
        Output::Summary { record } => {
            println!("{} ({}, {} lines)", record.path, record.language, record.line_count);
            if !record.symbol_names.is_empty() {
                println!("Symbols: {}", record.symbol_names.join(", "));
            }
            if !record.imports.is_empty() {
                println!("Imports: {}", record.imports.join(", "));
            }
            if !record.exports.is_empty() {
                println!("Exports: {}", record.exports.join(", "));
            }
        }
        Output::Stats { stats } => {
            println!("{} files, {} symbols", stats.file_count, stats.symbol_count);
            for (language, count) in &stats.languages {
                println!("  {}: {} files", language, count);
            }
        }
        Output::Edit { report } => {
            if report.success {
                println!("Applied {} operations:", report.results.len());
                for file in &report.files_changed {
                    println!("  {}", file);
                }
            } else {
                println!(
                    "Edit failed: {}",
                    report.error.as_deref().unwrap_or("unknown error")
                );
            }
        }
        Output::Export { snapshot } => {
            println!(
                "Snapshot v{} of {}: {} documents, {} symbols",
                snapshot.metadata.format_version,
                snapshot.project,
                snapshot.metadata.file_count,
                snapshot.metadata.symbol_count
            );
        }
    }
}
