//! Scout Index
//!
//! An incremental code index and search engine for AI coding assistants.
//!
//! # Architecture
//!
//! Four components cooperate around one in-memory [`store::IndexStore`]:
//!
//! 1. **IndexBuilder** parses files with tree-sitter capabilities and
//!    populates the store; refreshes re-parse only files whose fingerprint
//!    changed, so incremental cost is proportional to the change set.
//! 2. **ChangeDetector** classifies the on-disk file set against the
//!    stored fingerprints into added/modified/removed.
//! 3. **SearchEngine** answers text, regex, symbol, definition, references
//!    and callers queries, preferring ripgrep and the symbol index, with
//!    in-process fallbacks and fingerprint-validated result caching.
//! 4. **EditEngine** applies multi-file content edits atomically, with
//!    in-memory pre-images for rollback and synchronous index refresh of
//!    the touched files.
//!
//! A [`session::ProjectSession`] ties these together for one project root
//! and serializes mutation behind a coarse async lock.
//!
//! # Usage
//!
//! ```ignore
//! use scout_index::{ProjectSession, SearchKind, SearchQuery};
//!
//! let (session, report) = ProjectSession::open(Path::new("/path/to/repo")).await?;
//! let matches = session
//!     .search(&SearchQuery::new("parse_config", SearchKind::Symbol))
//!     .await?;
//! ```

pub mod builder;
pub mod change;
pub mod discovery;
pub mod edit;
pub mod error;
pub mod export;
pub mod parsing;
pub mod search;
pub mod session;
pub mod store;
pub mod types;

// Re-exports
pub use builder::{IndexBuilder, IndexReport};
pub use change::{detect_changes, ChangeSet, Fingerprint};
pub use discovery::FileDiscovery;
pub use edit::EditEngine;
pub use error::{EngineError, Result};
pub use export::{export_snapshot, IndexSnapshot, SNAPSHOT_FORMAT_VERSION};
pub use search::{CacheStats, SearchEngine};
pub use session::ProjectSession;
pub use store::IndexStore;
pub use types::*;

/// Engine version.
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
