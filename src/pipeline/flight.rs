//! In-flight request table.

use crate::fingerprint::Fingerprint;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Grants one owner per fingerprint at a time.
///
/// Callers lease the gate for their fingerprint and lock it. The first holder
/// runs the external stages; everyone queued behind it re-checks the cache
/// once the lock is theirs and only executes independently if the owner's
/// attempt left nothing behind. Unrelated fingerprints never contend.
#[derive(Default)]
pub struct FlightTable {
    inflight: Mutex<HashMap<Fingerprint, Arc<Mutex<()>>>>,
}

impl FlightTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lease(&self, fingerprint: &Fingerprint) -> Arc<Mutex<()>> {
        let mut inflight = self.inflight.lock().await;
        inflight.entry(fingerprint.clone()).or_default().clone()
    }

    /// Returns a lease; the table entry is dropped once no caller holds one.
    pub async fn release(&self, fingerprint: &Fingerprint, gate: Arc<Mutex<()>>) {
        drop(gate);
        let mut inflight = self.inflight.lock().await;
        if let Some(current) = inflight.get(fingerprint) {
            if Arc::strong_count(current) == 1 {
                inflight.remove(fingerprint);
            }
        }
    }

    #[cfg(test)]
    pub async fn tracked(&self) -> usize {
        self.inflight.lock().await.len()
    }
}
