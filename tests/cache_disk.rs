//! Filesystem store behavior: durability, corruption handling, eviction.

use patent_render::{fingerprint, CacheAdmin, CacheEntry, CacheStore};
use serde_json::json;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis() as u64
}

fn entry(seed: u8, created_at_ms: u64) -> CacheEntry {
    let digest = fingerprint::derive(&[seed], &json!({ "seed": seed })).unwrap();
    CacheEntry {
        fingerprint: digest.fingerprint,
        created_at_ms,
        input: digest.input,
        result: json!({ "persisted_url": format!("https://store/{seed}.png") }),
    }
}

#[tokio::test]
async fn entries_survive_reopening_the_directory() {
    let dir = tempfile::tempdir().unwrap();
    let digest = fingerprint::derive(b"IMG", &json!({ "title": "x" })).unwrap();

    let store = CacheStore::on_disk(dir.path());
    store
        .put(&digest.fingerprint, digest.input.clone(), &json!({ "v": 1 }))
        .await
        .unwrap();
    drop(store);

    let reopened = CacheStore::on_disk(dir.path());
    let found: CacheEntry = reopened.get(&digest.fingerprint).await.unwrap();
    assert_eq!(found.result, json!({ "v": 1 }));
    assert_eq!(found.input, digest.input);
}

#[tokio::test]
async fn overwrite_keeps_a_single_file_per_fingerprint() {
    let dir = tempfile::tempdir().unwrap();
    let store = CacheStore::on_disk(dir.path());
    let digest = fingerprint::derive(b"IMG", &json!({ "title": "x" })).unwrap();

    store
        .put(&digest.fingerprint, digest.input.clone(), &json!({ "v": 1 }))
        .await
        .unwrap();
    store
        .put(&digest.fingerprint, digest.input.clone(), &json!({ "v": 2 }))
        .await
        .unwrap();

    let json_files = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().and_then(|x| x.to_str()) == Some("json"))
        .count();
    assert_eq!(json_files, 1);
    let found: CacheEntry = store.get(&digest.fingerprint).await.unwrap();
    assert_eq!(found.result, json!({ "v": 2 }));
}

#[tokio::test]
async fn garbage_and_foreign_files_are_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let store = CacheStore::on_disk(dir.path());
    store.insert(&entry(1, now_ms())).await.unwrap();

    // A corrupt entry and an unrelated file share the directory.
    std::fs::write(dir.path().join(format!("{}.json", "ab".repeat(32))), "{ nope").unwrap();
    std::fs::write(dir.path().join("notes.txt"), "not a cache entry").unwrap();

    let stats = store.stats().await;
    assert_eq!(stats.entry_count, 1);

    let corrupt = patent_render::Fingerprint::from("ab".repeat(32));
    assert!(store.get::<serde_json::Value>(&corrupt).await.is_none());
}

#[tokio::test]
async fn age_based_eviction_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let store = CacheStore::on_disk(dir.path());
    let now = now_ms();
    let young = entry(1, now - 100);
    let old = entry(2, now - 5000);
    store.insert(&young).await.unwrap();
    store.insert(&old).await.unwrap();

    assert_eq!(store.clear_older_than(1000).await.unwrap(), 1);
    assert!(store
        .get::<serde_json::Value>(&young.fingerprint)
        .await
        .is_some());
    assert!(store
        .get::<serde_json::Value>(&old.fingerprint)
        .await
        .is_none());
}

#[tokio::test]
async fn admin_reports_track_the_directory_state() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(CacheStore::on_disk(dir.path()));
    let admin = CacheAdmin::new(store.clone());

    let now = now_ms();
    store.insert(&entry(1, now - 50)).await.unwrap();
    store.insert(&entry(2, now - 10)).await.unwrap();

    let report = admin.stats().await;
    assert_eq!(report.entry_count, 2);
    assert!(report.total_size_bytes > 0);
    assert!(report.oldest_entry_ms <= report.newest_entry_ms);

    let err = admin.clear_older_than(-1).await.unwrap_err();
    assert_eq!(err.kind(), "invalid_argument");
    assert_eq!(admin.stats().await.entry_count, 2);

    let cleared = admin.clear_all().await;
    assert_eq!(cleared.deleted_count, 2);
    assert_eq!(admin.stats().await.entry_count, 0);
}
