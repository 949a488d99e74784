//! Read-through response cache backed by a single JSON file
//!
//! Provides a `CacheStore` mapping request keys to raw response bodies. The
//! whole map is rewritten to disk after every insert, through a temporary
//! file that is atomically renamed over the backing path.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::fetch::{FetchError, Fetcher, Request};

/// File name of the backing file inside the XDG cache directory
const CACHE_FILE_NAME: &str = "cache.json";

/// Errors that can occur when persisting the cache
#[derive(Debug, Error)]
pub enum CacheError {
    /// Creating the directory or temporary file failed
    #[error("Cache I/O failed: {0}")]
    Io(#[from] io::Error),

    /// The map could not be serialized
    #[error("Failed to serialize cache: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The temporary file could not be renamed over the backing file
    #[error("Failed to replace cache file: {0}")]
    Persist(#[from] tempfile::PersistError),
}

/// Maps request keys to raw response bodies and persists them to disk
///
/// The store is opened once per process and handed to every retrieval
/// function by `&mut` reference, so fetches and writes happen strictly in
/// call order.
#[derive(Debug)]
pub struct CacheStore<F> {
    /// File the whole map is serialized to
    backing_path: PathBuf,
    /// Cached bodies keyed by request key
    entries: HashMap<String, String>,
    /// Transport used on a cache miss
    fetcher: F,
}

impl<F: Fetcher> CacheStore<F> {
    /// Opens the store, loading `backing_path` if it holds a valid map
    ///
    /// Never fails: a missing, unreadable or corrupt backing file yields an
    /// empty store. The file is not touched until the first write.
    pub fn open(backing_path: impl Into<PathBuf>, fetcher: F) -> Self {
        let backing_path = backing_path.into();
        let entries = load_entries(&backing_path);
        tracing::debug!(
            path = %backing_path.display(),
            entries = entries.len(),
            "opened response cache"
        );

        Self {
            backing_path,
            entries,
            fetcher,
        }
    }

    /// Returns the cached body for `request`, fetching it on a miss
    ///
    /// A hit never touches the network. A miss performs exactly one GET and
    /// one rewrite of the backing file. If the rewrite fails the body is
    /// still kept in memory and returned.
    pub async fn fetch_or_get(&mut self, request: &Request) -> Result<String, FetchError> {
        let key = request.cache_key();

        if let Some(body) = self.entries.get(key) {
            println!("Using cache");
            tracing::debug!(key, "cache hit");
            return Ok(body.clone());
        }

        // Reject unusable targets before announcing a fetch
        request.transport_url()?;

        println!("Fetching");
        tracing::debug!(key, "cache miss");
        let body = self.fetcher.get(request).await?;

        if let Err(e) = self.write(key, &body) {
            tracing::warn!(key, path = %self.backing_path.display(), "failed to persist cache: {e}");
        }

        Ok(body)
    }

    /// Convenience wrapper for URLs that carry no secrets
    ///
    /// `url` is the cache key verbatim, so anything stored with `write(url, ..)`
    /// is a hit here.
    pub async fn fetch_url(&mut self, url: &str) -> Result<String, FetchError> {
        self.fetch_or_get(&Request::new(url)).await
    }
}

/// Returns the XDG-compliant backing file location
///
/// Uses `~/.cache/npsites/cache.json` on Linux. Returns `None` if no home
/// directory can be determined.
pub fn default_cache_path() -> Option<PathBuf> {
    let project_dirs = ProjectDirs::from("", "", "npsites")?;
    Some(project_dirs.cache_dir().join(CACHE_FILE_NAME))
}

impl<F> CacheStore<F> {
    /// Inserts `key -> value` and rewrites the whole map to disk
    ///
    /// The in-memory entry is updated before persisting, so a failed write
    /// never loses a fetched body for the rest of the process.
    pub fn write(&mut self, key: &str, value: &str) -> Result<(), CacheError> {
        self.entries.insert(key.to_string(), value.to_string());
        self.persist()
    }

    /// Path of the backing file
    pub fn backing_path(&self) -> &Path {
        &self.backing_path
    }

    /// Cached body for `key`, without fetching
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The transport this store fetches through
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Serializes the map to a sibling temp file, then renames it into place
    fn persist(&self) -> Result<(), CacheError> {
        let dir = match self.backing_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let json = serde_json::to_string(&self.entries)?;

        let mut temp = NamedTempFile::new_in(dir)?;
        temp.write_all(json.as_bytes())?;
        temp.as_file().sync_all()?;
        temp.persist(&self.backing_path)?;

        Ok(())
    }
}

/// Reads the backing file, falling back to an empty map on any failure
fn load_entries(path: &Path) -> HashMap<String, String> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no cache file yet");
            return HashMap::new();
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), "ignoring unreadable cache file: {e}");
            return HashMap::new();
        }
    };

    match serde_json::from_str(&content) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(path = %path.display(), "ignoring corrupt cache file: {e}");
            HashMap::new()
        }
    }
}
