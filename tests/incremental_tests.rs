//! Incremental indexing behavior: full rebuilds, change-driven refreshes,
//! and the cascade invariant between files and symbols.

use pretty_assertions::assert_eq;
use scout_index::{FileDiscovery, IndexBuilder, IndexStore, SymbolMatchMode};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent");
    }
    fs::write(path, content).expect("write fixture");
}

fn seed_project() -> tempfile::TempDir {
    let temp = tempfile::tempdir().expect("tempdir");
    write(temp.path(), "a.py", "def foo(): pass\n");
    write(temp.path(), "b.py", "foo()\n");
    write(temp.path(), "src/lib.rs", "pub fn alpha() {}\n\nstruct Beta;\n");
    temp
}

fn store_for(temp: &tempfile::TempDir) -> Arc<IndexStore> {
    Arc::new(IndexStore::new(temp.path().to_path_buf()))
}

/// Stable picture of the store contents for equality comparisons.
fn snapshot(store: &IndexStore) -> BTreeMap<String, Vec<(String, String, u32)>> {
    let mut picture = BTreeMap::new();
    for record in store.file_records() {
        let mut symbols: Vec<(String, String, u32)> = store
            .symbol_records()
            .into_iter()
            .filter(|s| s.file == record.path)
            .map(|s| (s.name, s.kind.as_str().to_string(), s.line))
            .collect();
        symbols.sort();
        picture.insert(record.path, symbols);
    }
    picture
}

#[tokio::test]
async fn full_rebuild_indexes_all_eligible_files() {
    let temp = seed_project();
    let store = store_for(&temp);
    let builder = IndexBuilder::new();

    let report = builder.full_rebuild(&store).await.expect("rebuild");
    assert_eq!(report.total_files, 3);
    assert_eq!(report.parsed_files, 3);

    let stats = store.stats();
    assert_eq!(stats.file_count, 3);
    // foo, alpha, Beta
    assert_eq!(stats.symbol_count, 3);
}

#[tokio::test]
async fn rebuild_is_idempotent() {
    let temp = seed_project();
    let store = store_for(&temp);
    let builder = IndexBuilder::new();

    builder.full_rebuild(&store).await.expect("first rebuild");
    let first = snapshot(&store);
    builder.full_rebuild(&store).await.expect("second rebuild");
    let second = snapshot(&store);

    assert_eq!(first, second);
}

#[tokio::test]
async fn refresh_touches_only_changed_files() {
    let temp = seed_project();
    let store = store_for(&temp);
    let builder = IndexBuilder::new();
    builder.full_rebuild(&store).await.expect("rebuild");

    let b_before = store.get_file("b.py").expect("b.py indexed");
    let symbols_before = store.stats().symbol_count;

    // mtime granularity on some filesystems is one second
    std::thread::sleep(std::time::Duration::from_millis(20));
    write(temp.path(), "a.py", "def foo(): pass\ndef bar(): pass\n");

    let report = builder.refresh(&store).await.expect("refresh");
    assert_eq!(report.modified, 1);
    assert_eq!(report.added, 0);
    assert_eq!(report.removed, 0);
    assert_eq!(report.skipped_files, 2);

    assert_eq!(store.stats().symbol_count, symbols_before + 1);

    // untouched files keep their record and fingerprint
    let b_after = store.get_file("b.py").expect("b.py still indexed");
    assert_eq!(b_before.fingerprint, b_after.fingerprint);
}

#[tokio::test]
async fn refresh_drops_deleted_files_and_their_symbols() {
    let temp = seed_project();
    let store = store_for(&temp);
    let builder = IndexBuilder::new();
    builder.full_rebuild(&store).await.expect("rebuild");

    fs::remove_file(temp.path().join("a.py")).expect("delete a.py");
    let report = builder.refresh(&store).await.expect("refresh");
    assert_eq!(report.removed, 1);

    assert!(store.get_file("a.py").is_none());
    // cascade: no symbol may still point at the removed file
    assert!(store.symbol_records().iter().all(|s| s.file != "a.py"));
    assert!(store
        .find_symbols("foo", SymbolMatchMode::Exact, true)
        .is_empty());
}

#[tokio::test]
async fn refresh_picks_up_new_files() {
    let temp = seed_project();
    let store = store_for(&temp);
    let builder = IndexBuilder::new();
    builder.full_rebuild(&store).await.expect("rebuild");

    write(temp.path(), "c.py", "class Gamma: pass\n");
    let report = builder.refresh(&store).await.expect("refresh");
    assert_eq!(report.added, 1);
    assert_eq!(
        store
            .find_symbols("Gamma", SymbolMatchMode::Exact, true)
            .len(),
        1
    );
}

#[tokio::test]
async fn incremental_converges_to_rebuild() {
    let temp = seed_project();
    let store = store_for(&temp);
    let builder = IndexBuilder::new();
    builder.full_rebuild(&store).await.expect("rebuild");

    // a mixed batch of disk mutations
    std::thread::sleep(std::time::Duration::from_millis(20));
    write(temp.path(), "a.py", "def foo(): return 1\n");
    fs::remove_file(temp.path().join("b.py")).expect("delete");
    write(temp.path(), "d.py", "def delta(): pass\n");

    builder.refresh(&store).await.expect("refresh");
    let incremental = snapshot(&store);

    let fresh = store_for(&temp);
    builder.full_rebuild(&fresh).await.expect("fresh rebuild");
    let rebuilt = snapshot(&fresh);

    assert_eq!(incremental, rebuilt);
}

#[tokio::test]
async fn parse_trouble_on_one_file_does_not_abort_the_batch() {
    let temp = seed_project();
    // invalid UTF-8 with a recognized extension
    fs::write(temp.path().join("bad.py"), [0xff, 0xfe, 0x00, 0x41]).expect("write binary");

    let store = store_for(&temp);
    let builder = IndexBuilder::new();
    let report = builder.full_rebuild(&store).await.expect("rebuild");

    assert_eq!(report.total_files, 4);
    assert_eq!(report.fallback_files, 1);
    // the bad file is recorded with metadata only
    let record = store.get_file("bad.py").expect("fallback record");
    assert!(record.symbol_names.is_empty());
    // the rest of the batch is unaffected
    assert_eq!(
        store.find_symbols("foo", SymbolMatchMode::Exact, true).len(),
        1
    );
}

#[tokio::test]
async fn discovery_exclusions_keep_artifacts_out_of_the_index() {
    let temp = seed_project();
    write(temp.path(), "target/debug/gen.rs", "pub fn generated() {}\n");
    write(temp.path(), "node_modules/x/index.js", "module.exports = 1\n");
    write(temp.path(), "__pycache__/a.cpython-312.pyc", "x");

    let store = store_for(&temp);
    let builder = IndexBuilder::with_discovery(FileDiscovery::new());
    builder.full_rebuild(&store).await.expect("rebuild");

    let paths = store.file_paths();
    assert!(paths.iter().all(|p| !p.starts_with("target/")));
    assert!(paths.iter().all(|p| !p.contains("node_modules")));
    assert!(paths.iter().all(|p| !p.contains("__pycache__")));
}
