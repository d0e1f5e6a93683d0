//! Hash cache reuse, persistence and staleness

use super::test_utils::{walk_with_timeout, FakeFs};
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;
use treesync::cache::{CachePolicy, HashCache};
use treesync::store::{Store, DETAILS_MAP};
use treesync::tree::{Checksum, FileHash, TreeEntry};
use treesync::walk::TreeWalker;

fn sample_fs() -> FakeFs {
    FakeFs::new("/data")
        .file("a.txt", b"hi")
        .file("sub/b.txt", b"")
        .file("sub/deeper/c.txt", b"ccc")
        .symlink("link")
}

#[test]
fn test_second_walk_is_served_from_cache() {
    let fs = sample_fs();
    let cache = Arc::new(HashCache::in_memory(CachePolicy::Validated));

    let first = walk_with_timeout(
        TreeWalker::new(Arc::clone(&cache)).with_file_system(fs.clone()),
        fs.root(),
    )
    .unwrap();
    assert_eq!(fs.opens(), 3);
    assert_eq!(cache.stats().misses, 3);

    let second = walk_with_timeout(
        TreeWalker::new(Arc::clone(&cache)).with_file_system(fs.clone()),
        fs.root(),
    )
    .unwrap();
    assert_eq!(fs.opens(), 3, "cached files must not be reopened");
    assert_eq!(cache.stats().hits, 3);

    assert_eq!(first.sorted(), second.sorted());
    assert_eq!(first.count(), 7);
    assert_eq!(first.count(), fs.expected_count());
}

#[test]
fn test_hit_and_miss_paths_agree() {
    let fs = sample_fs();

    // warm cache, then a partially warm cache, then a cold cache
    let warm = Arc::new(HashCache::in_memory(CachePolicy::Validated));
    let cold = Arc::new(HashCache::in_memory(CachePolicy::Validated));
    walk_with_timeout(
        TreeWalker::new(Arc::clone(&warm)).with_file_system(fs.clone()),
        fs.root(),
    )
    .unwrap();

    let partial = Arc::new(HashCache::in_memory(CachePolicy::Validated));
    let a_path = fs.root().join("a.txt");
    partial.set(&a_path, &warm.get(&a_path).unwrap().unwrap()).unwrap();

    let walk = |cache: Arc<HashCache>| {
        walk_with_timeout(TreeWalker::new(cache).with_file_system(fs.clone()), fs.root()).unwrap()
    };
    let from_warm = walk(warm);
    let from_partial = walk(Arc::clone(&partial));
    let from_cold = walk(cold);

    assert_eq!(from_warm.sorted(), from_cold.sorted());
    assert_eq!(from_partial.sorted(), from_cold.sorted());
    assert_eq!(partial.stats().hits, 1);
}

#[test]
fn test_cache_survives_store_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let store_path = temp_dir.path().join("store");
    let fs = sample_fs();

    let first = {
        let store = Store::open(&store_path).unwrap();
        let details = store.map::<String, FileHash>(DETAILS_MAP).unwrap();
        let cache = Arc::new(HashCache::new(details, CachePolicy::Validated));
        let walker = TreeWalker::new(cache).with_file_system(fs.clone());
        let tree = walk_with_timeout(walker, fs.root()).unwrap();
        store.close().unwrap();
        tree
    };
    assert_eq!(fs.opens(), 3);

    let store = Store::open(&store_path).unwrap();
    let details = store.map::<String, FileHash>(DETAILS_MAP).unwrap();
    assert_eq!(details.len(), 3);
    let cache = Arc::new(HashCache::new(details, CachePolicy::Validated));
    let second = walk_with_timeout(
        TreeWalker::new(Arc::clone(&cache)).with_file_system(fs.clone()),
        fs.root(),
    )
    .unwrap();

    assert_eq!(fs.opens(), 3);
    assert_eq!(cache.stats().hits, 3);
    assert_eq!(first.sorted(), second.sorted());
}

#[test]
fn test_path_only_policy_keeps_stale_hash() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    let file = root.join("note.txt");
    fs::write(&file, "hi").unwrap();

    let cache = Arc::new(HashCache::in_memory(CachePolicy::PathOnly));
    walk_with_timeout(TreeWalker::new(Arc::clone(&cache)), root).unwrap();

    fs::write(&file, "rewritten").unwrap();
    let tree = walk_with_timeout(TreeWalker::new(Arc::clone(&cache)), root).unwrap();

    let note = tree.find("note.txt").and_then(TreeEntry::as_file).unwrap();
    assert_eq!(note.hash.checksum, Checksum::of_bytes(b"hi"));
    assert_ne!(note.hash.checksum, Checksum::of_bytes(b"rewritten"));
}

#[test]
fn test_validated_policy_refreshes_changed_file() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    let file = root.join("note.txt");
    fs::write(&file, "hi").unwrap();

    let cache = Arc::new(HashCache::in_memory(CachePolicy::Validated));
    walk_with_timeout(TreeWalker::new(Arc::clone(&cache)), root).unwrap();

    fs::write(&file, "rewritten").unwrap();
    let tree = walk_with_timeout(TreeWalker::new(Arc::clone(&cache)), root).unwrap();

    let note = tree.find("note.txt").and_then(TreeEntry::as_file).unwrap();
    assert_eq!(note.hash.checksum, Checksum::of_bytes(b"rewritten"));
    assert_eq!(cache.stats().stale, 1);
    // the refreshed hash replaced the stale record
    let canonical = dunce::canonicalize(&file).unwrap();
    let cached = cache.get(&canonical).unwrap().unwrap();
    assert_eq!(cached.checksum, Checksum::of_bytes(b"rewritten"));
}

#[test]
fn test_validated_policy_detects_same_size_touch() {
    let then = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let later = then + ChronoDuration::seconds(60);
    let cache = Arc::new(HashCache::in_memory(CachePolicy::Validated));

    let before = FakeFs::new("/data").file("a.txt", b"aa").modified_at(then);
    let walker = TreeWalker::new(Arc::clone(&cache)).with_file_system(before.clone());
    walk_with_timeout(walker, before.root()).unwrap();

    let after = FakeFs::new("/data").file("a.txt", b"bb").modified_at(later);
    let walker = TreeWalker::new(Arc::clone(&cache)).with_file_system(after.clone());
    let tree = walk_with_timeout(walker, after.root()).unwrap();

    assert_eq!(after.opens(), 1);
    let a = tree.find("a.txt").and_then(TreeEntry::as_file).unwrap();
    assert_eq!(a.hash.checksum, Checksum::of_bytes(b"bb"));
    assert_eq!(a.hash.last_modified, later);
}

#[test]
fn test_unicode_spellings_are_cached_separately() {
    let composed = "caf\u{e9}.txt";
    let decomposed = "cafe\u{301}.txt";
    let cache = Arc::new(HashCache::in_memory(CachePolicy::Validated));

    let before = FakeFs::new("/data").file(composed, b"AAAA");
    let walker = TreeWalker::new(Arc::clone(&cache)).with_file_system(before.clone());
    walk_with_timeout(walker, before.root()).unwrap();

    // same size and modification time as the cached record
    let after = FakeFs::new("/data")
        .file(composed, b"AAAA")
        .file(decomposed, b"BBBB");
    let walker = TreeWalker::new(Arc::clone(&cache)).with_file_system(after.clone());
    let tree = walk_with_timeout(walker, after.root()).unwrap();

    assert_eq!(after.opens(), 1);
    let first = tree.find(composed).and_then(TreeEntry::as_file).unwrap();
    let second = tree.find(decomposed).and_then(TreeEntry::as_file).unwrap();
    assert_eq!(first.hash.checksum, Checksum::of_bytes(b"AAAA"));
    assert_eq!(second.hash.checksum, Checksum::of_bytes(b"BBBB"));
}
