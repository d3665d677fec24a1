//! Administrative contract consumed by the CLI/HTTP glue layer.
//!
//! The glue itself lives outside this crate; these are the typed responses it
//! serves. Parameters are validated here before any storage is touched.

use crate::cache::{CacheStatistics, CacheStore};
use crate::pipeline::{PipelineResult, RunOutcome};
use crate::Result;
use serde::Serialize;
use std::sync::Arc;

/// Statistics report in the shape the administrative surface exposes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheReport {
    pub entry_count: u64,
    pub total_size_bytes: u64,
    /// Two-decimal megabyte rendering of `total_size_bytes`.
    pub total_size_mb: String,
    pub oldest_entry_ms: Option<u64>,
    pub newest_entry_ms: Option<u64>,
}

impl From<CacheStatistics> for CacheReport {
    fn from(stats: CacheStatistics) -> Self {
        Self {
            total_size_mb: format!("{:.2}", stats.total_size_bytes as f64 / 1024.0 / 1024.0),
            entry_count: stats.entry_count,
            total_size_bytes: stats.total_size_bytes,
            oldest_entry_ms: stats.oldest_entry_ms,
            newest_entry_ms: stats.newest_entry_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClearReport {
    pub deleted_count: u64,
}

/// Administrative handle over a shared cache store.
pub struct CacheAdmin {
    store: Arc<CacheStore>,
}

impl CacheAdmin {
    pub fn new(store: Arc<CacheStore>) -> Self {
        Self { store }
    }

    pub async fn stats(&self) -> CacheReport {
        self.store.stats().await.into()
    }

    pub async fn clear_all(&self) -> ClearReport {
        ClearReport {
            deleted_count: self.store.clear_all().await,
        }
    }

    /// Rejects negative input before touching storage.
    pub async fn clear_older_than(&self, max_age_ms: i64) -> Result<ClearReport> {
        Ok(ClearReport {
            deleted_count: self.store.clear_older_than(max_age_ms).await?,
        })
    }
}

/// Envelope for one pipeline invocation: `{success, result}` or
/// `{success: false, error_kind, message}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<PipelineResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_hit: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl PipelineResponse {
    pub fn from_outcome(outcome: &Result<RunOutcome>) -> Self {
        match outcome {
            Ok(out) => Self {
                success: true,
                result: Some(out.result.clone()),
                cache_hit: Some(out.cache_hit),
                error_kind: None,
                message: None,
            },
            Err(err) => Self {
                success: false,
                result: None,
                cache_hit: None,
                error_kind: Some(err.kind()),
                message: Some(err.to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use serde_json::json;

    #[test]
    fn report_renders_megabytes_with_two_decimals() {
        let report = CacheReport::from(CacheStatistics {
            entry_count: 2,
            total_size_bytes: 3 * 1024 * 1024 / 2,
            oldest_entry_ms: Some(1),
            newest_entry_ms: Some(2),
        });
        assert_eq!(report.total_size_mb, "1.50");
    }

    #[test]
    fn failure_envelope_names_the_error_kind() {
        let outcome: Result<RunOutcome> = Err(Error::UpstreamEmptyResult);
        let response = PipelineResponse::from_outcome(&outcome);
        let rendered = serde_json::to_value(&response).unwrap();
        assert_eq!(rendered["success"], json!(false));
        assert_eq!(rendered["error_kind"], json!("upstream_empty_result"));
        assert!(rendered.get("result").is_none());
    }

    #[tokio::test]
    async fn empty_store_reports_zeroes_and_absent_timestamps() {
        let admin = CacheAdmin::new(Arc::new(CacheStore::in_memory()));
        let report = admin.stats().await;
        assert_eq!(report.entry_count, 0);
        assert_eq!(report.total_size_mb, "0.00");
        assert_eq!(report.oldest_entry_ms, None);
        assert_eq!(report.newest_entry_ms, None);
    }
}
