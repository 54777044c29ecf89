use scout_index::FileDiscovery;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent");
    }
    fs::write(path, content).expect("write fixture");
}

fn fixture() -> tempfile::TempDir {
    let temp = tempfile::tempdir().expect("tempdir");
    write(temp.path(), "src/lib.rs", "pub fn a() {}\n");
    write(temp.path(), "src/extra.rs", "pub fn b() {}\n");
    write(temp.path(), "readme.md", "# hi\n");
    write(temp.path(), "target/generated.rs", "pub fn gen() {}\n");
    write(temp.path(), "node_modules/x/ignored.js", "x\n");
    write(temp.path(), ".git/config", "[core]\n");
    write(temp.path(), ".hidden/hidden.rs", "pub fn h() {}\n");
    temp
}

fn rels(temp: &tempfile::TempDir, discovery: FileDiscovery) -> HashSet<String> {
    discovery
        .discover(temp.path())
        .expect("discover should work")
        .into_iter()
        .map(|(rel, _)| rel)
        .collect()
}

#[test]
fn discovery_excludes_defaults() {
    let temp = fixture();
    let rel = rels(&temp, FileDiscovery::new());

    assert!(rel.contains("src/lib.rs"));
    assert!(rel.contains("src/extra.rs"));
    assert!(rel.contains("readme.md"));
    assert!(!rel.contains("target/generated.rs"));
    assert!(rel.iter().all(|p| !p.contains("node_modules")));
    assert!(rel.iter().all(|p| !p.starts_with(".git/")));
    assert!(rel.iter().all(|p| !p.starts_with(".hidden/")));
}

#[test]
fn discovery_respects_gitignore() {
    let temp = fixture();
    write(temp.path(), ".gitignore", "generated/\n*.log\n");
    write(temp.path(), "generated/out.rs", "pub fn o() {}\n");
    write(temp.path(), "build.log", "noise\n");

    let rel = rels(&temp, FileDiscovery::new());
    assert!(rel.contains("src/lib.rs"));
    assert!(!rel.contains("generated/out.rs"));
    assert!(!rel.contains("build.log"));
}

#[test]
fn custom_excludes_filter_more_files() {
    let temp = fixture();
    let rel = rels(&temp, FileDiscovery::new().with_exclude("**/*.md"));
    assert!(rel.contains("src/lib.rs"));
    assert!(!rel.contains("readme.md"));
}

#[test]
fn includes_override_default_excludes() {
    let temp = fixture();
    let rel = rels(&temp, FileDiscovery::new().with_include("target/**"));
    assert!(rel.contains("target/generated.rs"));
}

#[test]
fn oversized_files_are_skipped() {
    let temp = fixture();
    write(temp.path(), "big.txt", &"x".repeat(64));

    let rel = rels(&temp, FileDiscovery::new().with_max_file_size(16));
    assert!(!rel.contains("big.txt"));
    assert!(rel.contains("src/lib.rs"));
}

#[test]
fn results_are_sorted_and_slash_normalized() {
    let temp = fixture();
    let files = FileDiscovery::new()
        .discover(temp.path())
        .expect("discover");
    let rels: Vec<&str> = files.iter().map(|(rel, _)| rel.as_str()).collect();
    let mut sorted = rels.clone();
    sorted.sort();
    assert_eq!(rels, sorted);
    assert!(rels.iter().all(|r| !r.contains('\\')));
}
