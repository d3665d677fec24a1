//! Persisted cache records and the derived statistics view.

use crate::fingerprint::{Fingerprint, InputDigest};
use serde::{Deserialize, Serialize};

/// One completed pipeline computation, addressed by fingerprint.
///
/// Entries are immutable once written; a later write for the same fingerprint
/// replaces the record wholesale. Each entry is serialized as a single JSON
/// document, so a write is atomic per fingerprint with no cross-entry
/// transactional guarantees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T = serde_json::Value> {
    pub fingerprint: Fingerprint,
    /// Creation wall-clock time in milliseconds since the Unix epoch; the sole
    /// input to age-based eviction.
    pub created_at_ms: u64,
    /// Component digests kept for audit, never consulted on lookup.
    pub input: InputDigest,
    /// Opaque pipeline output payload.
    pub result: T,
}

/// Live view over the store, computed by scanning all current entries.
/// Never cached itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStatistics {
    pub entry_count: u64,
    pub total_size_bytes: u64,
    pub oldest_entry_ms: Option<u64>,
    pub newest_entry_ms: Option<u64>,
}
