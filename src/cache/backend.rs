//! Cache backend implementations.

use crate::fingerprint::Fingerprint;
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::RwLock;
use uuid::Uuid;

/// Raw byte-level storage for cache entries. The store layers entry framing,
/// statistics, and eviction on top; backends only move opaque records.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn read(&self, fingerprint: &Fingerprint) -> Result<Option<Vec<u8>>>;
    async fn write(&self, fingerprint: &Fingerprint, data: &[u8]) -> Result<()>;
    async fn remove(&self, fingerprint: &Fingerprint) -> Result<bool>;
    async fn list(&self) -> Result<Vec<Fingerprint>>;
    fn name(&self) -> &'static str;
}

/// Filesystem backend: one `<fingerprint>.json` file per entry under a
/// constructor-injected directory, created lazily on first write.
pub struct DirCache {
    dir: PathBuf,
}

impl DirCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &std::path::Path {
        &self.dir
    }

    /// Fingerprints are lowercase hex; anything else never names an entry on
    /// disk and must not be turned into a path.
    fn entry_path(&self, fingerprint: &Fingerprint) -> Option<PathBuf> {
        let s = fingerprint.as_str();
        if s.is_empty() || !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        Some(self.dir.join(format!("{s}.json")))
    }
}

#[async_trait]
impl CacheBackend for DirCache {
    async fn read(&self, fingerprint: &Fingerprint) -> Result<Option<Vec<u8>>> {
        let Some(path) = self.entry_path(fingerprint) else {
            return Ok(None);
        };
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Some(data)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn write(&self, fingerprint: &Fingerprint, data: &[u8]) -> Result<()> {
        let Some(path) = self.entry_path(fingerprint) else {
            return Err(Error::InvalidArgument(format!(
                "fingerprint {fingerprint:?} is not hex"
            )));
        };
        tokio::fs::create_dir_all(&self.dir).await?;
        // Publish via rename so no reader ever observes a partial entry.
        let tmp = self
            .dir
            .join(format!("{fingerprint}.{}.tmp", Uuid::new_v4().simple()));
        tokio::fs::write(&tmp, data).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn remove(&self, fingerprint: &Fingerprint) -> Result<bool> {
        let Some(path) = self.entry_path(fingerprint) else {
            return Ok(false);
        };
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    async fn list(&self) -> Result<Vec<Fingerprint>> {
        let mut dir = match tokio::fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            // No directory yet means nothing has been cached.
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        let mut out = Vec::new();
        while let Some(item) = dir.next_entry().await? {
            let path = item.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if !stem.is_empty() && stem.chars().all(|c| c.is_ascii_hexdigit()) {
                    out.push(Fingerprint::from(stem));
                }
            }
        }
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "dir"
    }
}

/// In-memory backend for tests and embedders that don't need durability.
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn read(&self, fingerprint: &Fingerprint) -> Result<Option<Vec<u8>>> {
        Ok(self
            .entries
            .read()
            .unwrap()
            .get(fingerprint.as_str())
            .cloned())
    }

    async fn write(&self, fingerprint: &Fingerprint, data: &[u8]) -> Result<()> {
        self.entries
            .write()
            .unwrap()
            .insert(fingerprint.as_str().to_string(), data.to_vec());
        Ok(())
    }

    async fn remove(&self, fingerprint: &Fingerprint) -> Result<bool> {
        Ok(self
            .entries
            .write()
            .unwrap()
            .remove(fingerprint.as_str())
            .is_some())
    }

    async fn list(&self) -> Result<Vec<Fingerprint>> {
        Ok(self
            .entries
            .read()
            .unwrap()
            .keys()
            .map(|k| Fingerprint::from(k.as_str()))
            .collect())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
