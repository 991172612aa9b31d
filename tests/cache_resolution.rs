// tests/cache_resolution.rs

mod common;

use common::{FakeTransport, RecordingSink, HASH_X, HASH_Y};
use gitsnap::archive::fixture::TarFixture;
use gitsnap::cache::{CacheIndex, CacheManager, CacheOptions, TarballSource};
use gitsnap::errors::ErrorCode;
use gitsnap::events::CloneEvent;
use gitsnap::git::RemoteRef;
use gitsnap::source::{parse, Repository};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn repo(src: &str) -> Repository {
    parse(src, false, None).expect("valid source")
}

fn options(root: &Path, cache: bool, offline: bool) -> CacheOptions {
    CacheOptions {
        root: root.to_path_buf(),
        cache,
        offline,
        proxy: None,
    }
}

fn archive_url(hash: &str) -> String {
    format!("https://github.com/user/repo/archive/{}.tar.gz", hash)
}

fn tarball(tag: &str) -> Vec<u8> {
    TarFixture::new()
        .dir("repo-x/")
        .file("repo-x/version.txt", tag.as_bytes())
        .gzip()
}

#[test]
fn test_online_download_then_cache_hit() -> anyhow::Result<()> {
    let cache = tempdir()?;
    let transport = FakeTransport::new()
        .with_refs(vec![
            RemoteRef::head(HASH_X),
            RemoteRef::branch("main", HASH_X),
        ])
        .with_archive(archive_url(HASH_X), tarball("x"));
    let sink = RecordingSink::new();
    let manager = CacheManager::new(options(cache.path(), true, false), &transport, &sink);
    let repo = repo("user/repo");

    let first = manager.acquire(&repo)?;
    assert_eq!(first.hash, HASH_X);
    assert_eq!(first.source, TarballSource::Downloaded);
    assert_eq!(first.path, cache.path().join("github/user/repo").join(format!("{}.tar.gz", HASH_X)));
    assert!(first.path.is_file());

    let second = manager.acquire(&repo)?;
    assert_eq!(second.source, TarballSource::Cached);
    assert_eq!(transport.downloads(), 1);

    let index = CacheIndex::load(cache.path().join("github/user/repo"));
    assert_eq!(index.hash_for("HEAD"), Some(HASH_X));
    assert!(index.last_access("HEAD").is_some());
    Ok(())
}

#[test]
fn test_shared_tarball_survives_re_resolution() -> anyhow::Result<()> {
    let cache = tempdir()?;
    let repo_dir = cache.path().join("github/user/repo");
    let sink = RecordingSink::new();

    // a -> X and b -> X
    let before = FakeTransport::new()
        .with_refs(vec![RemoteRef::branch("a", HASH_X), RemoteRef::branch("b", HASH_X)])
        .with_archive(archive_url(HASH_X), tarball("x"));
    let manager = CacheManager::new(options(cache.path(), true, false), &before, &sink);
    manager.acquire(&repo("user/repo#a"))?;
    manager.acquire(&repo("user/repo#b"))?;

    // a moves to Y
    let after = FakeTransport::new()
        .with_refs(vec![RemoteRef::branch("a", HASH_Y), RemoteRef::branch("b", HASH_X)])
        .with_archive(archive_url(HASH_Y), tarball("y"));
    let manager = CacheManager::new(options(cache.path(), true, false), &after, &sink);
    manager.acquire(&repo("user/repo#a"))?;

    assert!(repo_dir.join(format!("{}.tar.gz", HASH_X)).is_file());
    assert!(repo_dir.join(format!("{}.tar.gz", HASH_Y)).is_file());
    assert_eq!(sink.count(|e| matches!(e, CloneEvent::EvictedTarball { .. })), 0);
    Ok(())
}

#[test]
fn test_sole_tarball_is_evicted_on_re_resolution() -> anyhow::Result<()> {
    let cache = tempdir()?;
    let repo_dir = cache.path().join("github/user/repo");
    let sink = RecordingSink::new();

    let before = FakeTransport::new()
        .with_refs(vec![RemoteRef::branch("a", HASH_X)])
        .with_archive(archive_url(HASH_X), tarball("x"));
    CacheManager::new(options(cache.path(), true, false), &before, &sink)
        .acquire(&repo("user/repo#a"))?;

    let after = FakeTransport::new()
        .with_refs(vec![RemoteRef::branch("a", HASH_Y)])
        .with_archive(archive_url(HASH_Y), tarball("y"));
    CacheManager::new(options(cache.path(), true, false), &after, &sink)
        .acquire(&repo("user/repo#a"))?;

    assert!(!repo_dir.join(format!("{}.tar.gz", HASH_X)).exists());
    assert!(repo_dir.join(format!("{}.tar.gz", HASH_Y)).is_file());
    assert_eq!(
        sink.count(|e| matches!(e, CloneEvent::EvictedTarball { hash } if hash == HASH_X)),
        1
    );
    Ok(())
}

#[test]
fn test_offline_unknown_ref_never_touches_the_network() -> anyhow::Result<()> {
    let cache = tempdir()?;
    let transport = FakeTransport::new()
        .with_refs(vec![RemoteRef::branch("main", HASH_X)])
        .with_archive(archive_url(HASH_X), tarball("x"));
    let sink = RecordingSink::new();
    let manager = CacheManager::new(options(cache.path(), true, true), &transport, &sink);

    let err = manager.acquire(&repo("user/repo#main")).unwrap_err();
    assert_eq!(err.code(), ErrorCode::CacheMiss);
    assert_eq!(transport.calls(), 0);
    Ok(())
}

#[test]
fn test_offline_cached_ref_is_served_without_network() -> anyhow::Result<()> {
    let cache = tempdir()?;
    let repo_dir = cache.path().join("github/user/repo");
    fs::create_dir_all(&repo_dir)?;
    fs::write(repo_dir.join("map.json"), format!("{{\"main\": \"{}\"}}", HASH_X))?;
    fs::write(repo_dir.join(format!("{}.tar.gz", HASH_X)), tarball("x"))?;

    let transport = FakeTransport::new();
    let sink = RecordingSink::new();
    let manager = CacheManager::new(options(cache.path(), true, true), &transport, &sink);
    let got = manager.acquire(&repo("user/repo#main"))?;
    assert_eq!(got.hash, HASH_X);
    assert_eq!(got.source, TarballSource::Cached);
    assert_eq!(transport.calls(), 0);
    // offline runs do not write the index
    assert!(!repo_dir.join("access.json").exists());
    Ok(())
}

#[test]
fn test_offline_full_hash_skips_the_index() -> anyhow::Result<()> {
    let cache = tempdir()?;
    let repo_dir = cache.path().join("github/user/repo");
    fs::create_dir_all(&repo_dir)?;
    fs::write(repo_dir.join(format!("{}.tar.gz", HASH_Y)), tarball("y"))?;
    // no map.json at all

    let transport = FakeTransport::new();
    let sink = RecordingSink::new();
    let manager = CacheManager::new(options(cache.path(), true, true), &transport, &sink);
    let got = manager.acquire(&repo(&format!("user/repo#{}", HASH_Y)))?;
    assert_eq!(got.hash, HASH_Y);
    assert_eq!(transport.calls(), 0);
    Ok(())
}

#[test]
fn test_offline_missing_tarball_is_cache_miss() -> anyhow::Result<()> {
    let cache = tempdir()?;
    let transport = FakeTransport::new();
    let sink = RecordingSink::new();
    let manager = CacheManager::new(options(cache.path(), true, true), &transport, &sink);
    let err = manager
        .acquire(&repo(&format!("user/repo#{}", HASH_Y)))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::CacheMiss);
    assert_eq!(transport.calls(), 0);
    Ok(())
}

#[test]
fn test_online_full_hash_skips_ref_listing() -> anyhow::Result<()> {
    let cache = tempdir()?;
    let transport = FakeTransport::new().with_archive(archive_url(HASH_Y), tarball("y"));
    let sink = RecordingSink::new();
    let manager = CacheManager::new(options(cache.path(), true, false), &transport, &sink);
    manager.acquire(&repo(&format!("user/repo#{}", HASH_Y)))?;
    assert_eq!(transport.list_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    assert_eq!(transport.downloads(), 1);
    Ok(())
}

#[test]
fn test_historical_lookup_is_the_last_resort() -> anyhow::Result<()> {
    let cache = tempdir()?;
    let transport = FakeTransport::new()
        .with_refs(vec![RemoteRef::head(HASH_X)])
        .with_historical(HASH_Y)
        .with_archive(archive_url(HASH_Y), tarball("y"));
    let sink = RecordingSink::new();
    let manager = CacheManager::new(options(cache.path(), true, false), &transport, &sink);

    let got = manager.acquire(&repo("user/repo#some-old-tag"))?;
    assert_eq!(got.hash, HASH_Y);
    assert_eq!(
        sink.count(|e| matches!(e, CloneEvent::HistoricalLookup { .. })),
        1
    );
    Ok(())
}

#[test]
fn test_unresolvable_ref_is_missing_ref() -> anyhow::Result<()> {
    let cache = tempdir()?;
    let transport = FakeTransport::new().with_refs(vec![RemoteRef::head(HASH_X)]);
    let sink = RecordingSink::new();
    let manager = CacheManager::new(options(cache.path(), true, false), &transport, &sink);
    let err = manager.acquire(&repo("user/repo#nope")).unwrap_err();
    assert_eq!(err.code(), ErrorCode::MissingRef);
    assert_eq!(transport.downloads(), 0);
    Ok(())
}

#[test]
fn test_failed_listing_falls_back_to_cached_hash() -> anyhow::Result<()> {
    let cache = tempdir()?;
    let repo_dir = cache.path().join("github/user/repo");
    fs::create_dir_all(&repo_dir)?;
    fs::write(repo_dir.join("map.json"), format!("{{\"main\": \"{}\"}}", HASH_X))?;
    fs::write(repo_dir.join(format!("{}.tar.gz", HASH_X)), tarball("x"))?;

    let transport = FakeTransport::new().failing_listing();
    let sink = RecordingSink::new();
    let manager = CacheManager::new(options(cache.path(), true, false), &transport, &sink);
    let got = manager.acquire(&repo("user/repo#main"))?;
    assert_eq!(got.hash, HASH_X);
    assert_eq!(
        sink.count(|e| matches!(e, CloneEvent::CacheFallback { .. })),
        1
    );

    let err = manager.acquire(&repo("user/repo#dev")).unwrap_err();
    assert_eq!(err.code(), ErrorCode::CouldNotFetch);
    Ok(())
}

#[test]
fn test_no_cache_downloads_to_a_scratch_directory() -> anyhow::Result<()> {
    let cache = tempdir()?;
    let repo_dir = cache.path().join("github/user/repo");
    let transport = FakeTransport::new()
        .with_refs(vec![RemoteRef::head(HASH_X)])
        .with_archive(archive_url(HASH_X), tarball("x"));
    let sink = RecordingSink::new();
    let manager = CacheManager::new(options(cache.path(), false, false), &transport, &sink);

    let got = manager.acquire(&repo("user/repo"))?;
    assert!(got.is_temporary());
    assert!(got.path.is_file());
    assert!(!got.path.starts_with(cache.path()));
    let path = got.path.clone();
    drop(got);
    assert!(!path.exists());
    assert!(!repo_dir.join("map.json").exists());
    Ok(())
}

#[test]
fn test_download_failure_is_could_not_download() -> anyhow::Result<()> {
    let cache = tempdir()?;
    let transport = FakeTransport::new().with_refs(vec![RemoteRef::head(HASH_X)]);
    let sink = RecordingSink::new();
    let manager = CacheManager::new(options(cache.path(), true, false), &transport, &sink);
    let err = manager.acquire(&repo("user/repo")).unwrap_err();
    assert_eq!(err.code(), ErrorCode::CouldNotDownload);
    let index = CacheIndex::load(cache.path().join("github/user/repo"));
    assert_eq!(index.hash_for("HEAD"), None);
    Ok(())
}

#[test]
fn test_uppercase_full_hash_is_indexed_in_lowercase() -> anyhow::Result<()> {
    let cache = tempdir()?;
    let repo_dir = cache.path().join("github/user/repo");
    let lower = "abcdef0123".repeat(4);
    let transport = FakeTransport::new().with_archive(archive_url(&lower), tarball("z"));
    let sink = RecordingSink::new();
    let manager = CacheManager::new(options(cache.path(), true, false), &transport, &sink);

    let got = manager.acquire(&repo(&format!("user/repo#{}", lower.to_uppercase())))?;
    assert_eq!(got.hash, lower);
    assert_eq!(got.path, repo_dir.join(format!("{}.tar.gz", lower)));

    let index = CacheIndex::load(&repo_dir);
    assert_eq!(index.refs().collect::<Vec<_>>(), vec![(lower.as_str(), lower.as_str())]);
    Ok(())
}
