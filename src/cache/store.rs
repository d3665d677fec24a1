//! The cache store: entry framing, statistics, and eviction over a backend.

use super::backend::{CacheBackend, DirCache, MemoryCache};
use super::entry::{CacheEntry, CacheStatistics};
use crate::fingerprint::{Fingerprint, InputDigest};
use crate::{Error, Result};
use futures::future::join_all;
use serde::{de::DeserializeOwned, Serialize};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

/// Durable mapping from fingerprint to completed pipeline result.
///
/// The store owns all entry data exclusively. Read-path failures (storage
/// errors, undecodable records) are absorbed and logged: a broken cache must
/// degrade into a miss, never into a caller-visible error. Write failures are
/// surfaced as [`Error::CacheWrite`] so the caller can log and move on.
pub struct CacheStore {
    backend: Box<dyn CacheBackend>,
}

impl CacheStore {
    pub fn new(backend: Box<dyn CacheBackend>) -> Self {
        Self { backend }
    }

    /// Filesystem-backed store rooted at `dir`.
    pub fn on_disk(dir: impl Into<PathBuf>) -> Self {
        Self::new(Box::new(DirCache::new(dir)))
    }

    /// Volatile store, mainly for tests and embedders.
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryCache::new()))
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Lookup by exact fingerprint. Returns `None` on miss; malformed or
    /// unreadable persisted records are logged and reported as absent.
    pub async fn get<T: DeserializeOwned>(
        &self,
        fingerprint: &Fingerprint,
    ) -> Option<CacheEntry<T>> {
        let data = self.read_raw(fingerprint).await?;
        match serde_json::from_slice(&data) {
            Ok(entry) => {
                debug!(%fingerprint, "cache hit");
                Some(entry)
            }
            Err(err) => {
                warn!(%fingerprint, %err, "undecodable cache entry, treating as absent");
                None
            }
        }
    }

    /// Persists a new entry stamped with the current time, overwriting any
    /// existing entry for the fingerprint wholesale.
    pub async fn put<T: Serialize>(
        &self,
        fingerprint: &Fingerprint,
        input: InputDigest,
        result: &T,
    ) -> Result<()> {
        let entry = CacheEntry {
            fingerprint: fingerprint.clone(),
            created_at_ms: now_ms(),
            input,
            result,
        };
        self.insert(&entry).await
    }

    /// Persists a fully-formed entry as-is. [`put`](Self::put) is the normal
    /// path; this one exists for import tooling and tests that need control
    /// over `created_at_ms`.
    pub async fn insert<T: Serialize>(&self, entry: &CacheEntry<T>) -> Result<()> {
        let cache_write = |err: &dyn std::fmt::Display| Error::CacheWrite {
            fingerprint: entry.fingerprint.to_string(),
            message: err.to_string(),
        };
        let data = serde_json::to_vec(entry).map_err(|e| cache_write(&e))?;
        self.backend
            .write(&entry.fingerprint, &data)
            .await
            .map_err(|e| cache_write(&e))?;
        debug!(fingerprint = %entry.fingerprint, bytes = data.len(), "cache entry written");
        Ok(())
    }

    /// Scans every entry and aggregates count, stored size, and timestamp
    /// extremes. Unreadable entries are skipped, not fatal; a failed listing
    /// degrades to the empty statistics.
    pub async fn stats(&self) -> CacheStatistics {
        let fingerprints = match self.backend.list().await {
            Ok(fps) => fps,
            Err(err) => {
                warn!(%err, "cache listing failed, reporting empty statistics");
                return CacheStatistics::default();
            }
        };
        let mut stats = CacheStatistics::default();
        let scanned = join_all(fingerprints.iter().map(|fp| self.read_decoded(fp))).await;
        for (entry, size) in scanned.into_iter().flatten() {
            stats.entry_count += 1;
            stats.total_size_bytes += size;
            stats.oldest_entry_ms = Some(match stats.oldest_entry_ms {
                Some(t) => t.min(entry.created_at_ms),
                None => entry.created_at_ms,
            });
            stats.newest_entry_ms = Some(match stats.newest_entry_ms {
                Some(t) => t.max(entry.created_at_ms),
                None => entry.created_at_ms,
            });
        }
        stats
    }

    /// Deletes every entry; returns how many were deleted.
    pub async fn clear_all(&self) -> u64 {
        let fingerprints = match self.backend.list().await {
            Ok(fps) => fps,
            Err(err) => {
                warn!(%err, "cache listing failed, nothing cleared");
                return 0;
            }
        };
        let mut deleted = 0;
        let removals = join_all(fingerprints.iter().map(|fp| self.backend.remove(fp))).await;
        for (fingerprint, removal) in fingerprints.iter().zip(removals) {
            match removal {
                Ok(true) => deleted += 1,
                Ok(false) => {}
                Err(err) => warn!(%fingerprint, %err, "failed to remove cache entry"),
            }
        }
        deleted
    }

    /// Deletes every entry older than `max_age_ms` milliseconds; returns how
    /// many were deleted. A negative `max_age_ms` fails with
    /// [`Error::InvalidArgument`] before any deletion occurs.
    pub async fn clear_older_than(&self, max_age_ms: i64) -> Result<u64> {
        if max_age_ms < 0 {
            return Err(Error::InvalidArgument(format!(
                "maxAge must be a non-negative integer, got {max_age_ms}"
            )));
        }
        let max_age_ms = max_age_ms as u64;
        let fingerprints = match self.backend.list().await {
            Ok(fps) => fps,
            Err(err) => {
                warn!(%err, "cache listing failed, nothing cleared");
                return Ok(0);
            }
        };
        let now = now_ms();
        let scanned = join_all(
            fingerprints
                .iter()
                .map(|fp| async move { (fp, self.read_decoded(fp).await) }),
        )
        .await;
        let mut deleted = 0;
        for (fingerprint, decoded) in scanned {
            let Some((entry, _)) = decoded else {
                continue;
            };
            if now.saturating_sub(entry.created_at_ms) > max_age_ms {
                match self.backend.remove(fingerprint).await {
                    Ok(true) => deleted += 1,
                    Ok(false) => {}
                    Err(err) => warn!(%fingerprint, %err, "failed to evict cache entry"),
                }
            }
        }
        Ok(deleted)
    }

    async fn read_raw(&self, fingerprint: &Fingerprint) -> Option<Vec<u8>> {
        match self.backend.read(fingerprint).await {
            Ok(data) => data,
            Err(err) => {
                warn!(%fingerprint, %err, "cache read failed, treating as absent");
                None
            }
        }
    }

    async fn read_decoded(
        &self,
        fingerprint: &Fingerprint,
    ) -> Option<(CacheEntry<serde_json::Value>, u64)> {
        let data = self.read_raw(fingerprint).await?;
        match serde_json::from_slice(&data) {
            Ok(entry) => Some((entry, data.len() as u64)),
            Err(err) => {
                warn!(%fingerprint, %err, "skipping undecodable cache entry");
                None
            }
        }
    }
}

pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
