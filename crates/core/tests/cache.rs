mod common;

use std::path::Path;

use neoghidra_core::cache::normalize_path;
use neoghidra_core::AnalysisCache;

use common::sample_result;

#[test]
fn set_then_get_returns_the_result() {
    let mut cache = AnalysisCache::new();
    assert!(cache.get(Path::new("/bin/hello")).is_none());
    cache.set(Path::new("/bin/hello"), sample_result());
    assert_eq!(cache.get(Path::new("/bin/hello")), Some(&sample_result()));
    assert!(cache.contains(Path::new("/bin/hello")));
    assert_eq!(cache.len(), 1);
}

#[test]
fn keys_are_normalized() {
    let mut cache = AnalysisCache::new();
    cache.set(Path::new("/tmp/a/../bin/./hello"), sample_result());
    assert!(cache.get(Path::new("/tmp/bin/hello")).is_some());
}

#[test]
fn relative_paths_resolve_against_cwd() {
    let cwd = std::env::current_dir().unwrap();
    assert_eq!(normalize_path(Path::new("hello")), cwd.join("hello"));
}

#[test]
fn set_replaces_existing_entry() {
    let mut cache = AnalysisCache::new();
    cache.set(Path::new("/bin/hello"), sample_result());
    let mut updated = sample_result();
    updated.program_name = "hello2".into();
    cache.set(Path::new("/bin/hello"), updated);
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.get(Path::new("/bin/hello")).unwrap().program_name, "hello2");
}

#[test]
fn clear_one_leaves_others() {
    let mut cache = AnalysisCache::new();
    cache.set(Path::new("/bin/a"), sample_result());
    cache.set(Path::new("/bin/b"), sample_result());
    cache.clear(Some(Path::new("/bin/a")));
    assert!(cache.get(Path::new("/bin/a")).is_none());
    assert!(cache.get(Path::new("/bin/b")).is_some());
}

#[test]
fn clear_all_empties_cache() {
    let mut cache = AnalysisCache::new();
    cache.set(Path::new("/bin/a"), sample_result());
    cache.set(Path::new("/bin/b"), sample_result());
    cache.clear(None);
    assert!(cache.is_empty());
    // Clearing a path that was never stored is a no-op.
    cache.clear(Some(Path::new("/bin/missing")));
    assert!(cache.is_empty());
}

#[test]
fn entries_are_sorted_and_timestamped() {
    let mut cache = AnalysisCache::new();
    cache.set(Path::new("/bin/zeta"), sample_result());
    cache.set(Path::new("/bin/alpha"), sample_result());
    let entries = cache.entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].path, Path::new("/bin/alpha"));
    assert_eq!(entries[1].path, Path::new("/bin/zeta"));
    assert_eq!(entries[0].program_name, "hello");
    assert!(chrono::DateTime::parse_from_rfc3339(&entries[0].stored_at).is_ok());
}

#[test]
fn get_mut_edits_in_place() {
    let mut cache = AnalysisCache::new();
    cache.set(Path::new("/bin/hello"), sample_result());
    cache.get_mut(Path::new("/bin/hello")).unwrap().symbols.clear();
    assert!(cache.get(Path::new("/bin/hello")).unwrap().symbols.is_empty());
}
