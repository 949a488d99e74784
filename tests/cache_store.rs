//! Integration tests for the persistent response cache
//!
//! Exercises the read-through and durability guarantees through the public
//! API with a counting in-process fetcher.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use npsites::cache::CacheStore;
use npsites::fetch::{FetchError, Fetcher, Request};
use tempfile::TempDir;

/// Answers every request with `BODY<n>` and counts requests
#[derive(Debug, Clone, Default)]
struct CountingFetcher {
    calls: Arc<AtomicUsize>,
}

impl CountingFetcher {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for CountingFetcher {
    async fn get(&self, _request: &Request) -> Result<String, FetchError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("BODY{n}"))
    }
}

fn read_backing_file(path: &Path) -> HashMap<String, String> {
    let content = fs::read_to_string(path).expect("Should read backing file");
    serde_json::from_str(&content).expect("Backing file should be a JSON object")
}

#[tokio::test]
async fn test_first_run_scenario() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("cache.json");
    let fetcher = CountingFetcher::default();
    let mut store = CacheStore::open(&path, fetcher.clone());

    let body = store.fetch_url("https://a.example/x").await.unwrap();
    assert_eq!(body, "BODY1");

    let on_disk = read_backing_file(&path);
    assert_eq!(on_disk.len(), 1);
    assert_eq!(on_disk["https://a.example/x"], "BODY1");

    let again = store.fetch_url("https://a.example/x").await.unwrap();
    assert_eq!(again, "BODY1");
    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test]
async fn test_hits_are_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let fetcher = CountingFetcher::default();
    let mut store = CacheStore::open(temp_dir.path().join("cache.json"), fetcher.clone());
    store.write("https://a.example/x", "CACHED").unwrap();

    for _ in 0..10 {
        assert_eq!(store.fetch_url("https://a.example/x").await.unwrap(), "CACHED");
    }
    assert_eq!(fetcher.calls(), 0);
}

#[tokio::test]
async fn test_entries_survive_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("cache.json");

    {
        let mut store = CacheStore::open(&path, CountingFetcher::default());
        store.write("https://a.example/x", "persisted").unwrap();
    }

    let fetcher = CountingFetcher::default();
    let mut reopened = CacheStore::open(&path, fetcher.clone());

    assert_eq!(reopened.fetch_url("https://a.example/x").await.unwrap(), "persisted");
    assert_eq!(fetcher.calls(), 0);
}

#[tokio::test]
async fn test_corrupt_backing_file_fails_open() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("cache.json");
    fs::write(&path, "\u{0}garbage{{").unwrap();

    let fetcher = CountingFetcher::default();
    let mut store = CacheStore::open(&path, fetcher.clone());
    assert!(store.is_empty());

    let body = store.fetch_url("https://a.example/x").await.unwrap();
    assert_eq!(body, "BODY1");
    assert_eq!(fetcher.calls(), 1);
    assert_eq!(read_backing_file(&path).len(), 1);
}

#[test]
fn test_sequential_writes_persist_every_entry() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("cache.json");
    let mut store = CacheStore::open(&path, CountingFetcher::default());

    for i in 0..25 {
        store
            .write(&format!("https://a.example/{i}"), &format!("value {i}"))
            .unwrap();
    }

    let on_disk = read_backing_file(&path);
    assert_eq!(on_disk.len(), 25);
    for i in 0..25 {
        assert_eq!(on_disk[&format!("https://a.example/{i}")], format!("value {i}"));
    }
}

#[tokio::test]
async fn test_distinct_queries_fetch_separately() {
    let temp_dir = TempDir::new().unwrap();
    let fetcher = CountingFetcher::default();
    let mut store = CacheStore::open(temp_dir.path().join("cache.json"), fetcher.clone());

    let a = store.fetch_url("https://a.example/x?origin=1").await.unwrap();
    let b = store.fetch_url("https://a.example/x?origin=2").await.unwrap();

    assert_ne!(a, b);
    assert_eq!(fetcher.calls(), 2);
    assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn test_secret_stays_out_of_backing_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("cache.json");
    let mut store = CacheStore::open(&path, CountingFetcher::default());

    let request = Request::new("https://api.example.org/search?origin=49931")
        .with_secret_query("key", "XXX");
    store.fetch_or_get(&request).await.unwrap();

    let on_disk = read_backing_file(&path);
    assert!(on_disk.contains_key("https://api.example.org/search?origin=49931"));
    assert!(on_disk.keys().all(|key| !key.contains("key=XXX")));
}

#[tokio::test]
async fn test_written_key_is_served_verbatim_after_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("cache.json");
    {
        let mut store = CacheStore::open(&path, CountingFetcher::default());
        store.write("https://www.nps.gov", "HOME").unwrap();
    }

    let fetcher = CountingFetcher::default();
    let mut reopened = CacheStore::open(&path, fetcher.clone());

    assert_eq!(reopened.fetch_url("https://www.nps.gov").await.unwrap(), "HOME");
    assert_eq!(fetcher.calls(), 0);
    assert_eq!(read_backing_file(&path).len(), 1);
}
