//! Unified error type for the render pipeline and its cache layer.
//!
//! Every failure a caller can observe carries a specific kind; cache-internal
//! failures (read corruption, stats-scan errors) never reach this surface;
//! they are absorbed and logged where they occur.

use thiserror::Error;

/// Error taxonomy for pipeline invocations and administrative operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Metadata could not be converted into a canonical JSON document.
    /// Fatal for the invocation; the caller must fix its input.
    #[error("metadata cannot be canonicalized: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The image-synthesis collaborator answered without a usable asset
    /// reference. Fatal for this invocation, retryable by the caller.
    #[error("image synthesis returned no usable asset reference")]
    UpstreamEmptyResult,

    /// Network-level failure talking to an external collaborator.
    #[error("{collaborator}: transport failure: {message}")]
    UpstreamTransport {
        collaborator: &'static str,
        message: String,
    },

    /// Durable object storage rejected or lost the artifact write.
    #[error("failed to persist artifact under {key}: {message}")]
    Persist { key: String, message: String },

    /// Best-effort cache persistence failed. Never aborts the pipeline; the
    /// freshly computed result is still returned to the caller.
    #[error("cache write for {fingerprint} failed: {message}")]
    CacheWrite {
        fingerprint: String,
        message: String,
    },

    /// Backend-level storage error inside the cache. Absorbed by the store on
    /// the read path; only eviction plumbing sees it directly.
    #[error("cache storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Bad administrative parameter, rejected before any side effect.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// Stable machine-readable kind string, surfaced in administrative
    /// responses alongside the human-readable message.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Serialization(_) => "serialization_error",
            Self::UpstreamEmptyResult => "upstream_empty_result",
            Self::UpstreamTransport { .. } => "upstream_transport_error",
            Self::Persist { .. } => "persist_error",
            Self::CacheWrite { .. } => "cache_write_error",
            Self::Storage(_) => "storage_error",
            Self::InvalidArgument(_) => "invalid_argument",
        }
    }

    /// Whether re-invoking the whole pipeline may succeed without the caller
    /// changing its input.
    pub fn retryable(&self) -> bool {
        match self {
            Self::UpstreamEmptyResult
            | Self::UpstreamTransport { .. }
            | Self::Persist { .. }
            | Self::Storage(_) => true,
            Self::Serialization(_) | Self::CacheWrite { .. } | Self::InvalidArgument(_) => false,
        }
    }

    pub(crate) fn transport(collaborator: &'static str, err: impl std::fmt::Display) -> Self {
        Self::UpstreamTransport {
            collaborator,
            message: err.to_string(),
        }
    }

    pub(crate) fn persist(key: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Persist {
            key: key.into(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_error_names_collaborator() {
        let err = Error::transport("prompt-synthesis", "connection reset");
        let message = err.to_string();
        assert!(message.contains("prompt-synthesis"));
        assert!(message.contains("connection reset"));
    }

    #[test]
    fn persist_error_includes_key() {
        let err = Error::persist("patent-renders/US123-17.png", "503 slow down");
        assert!(err.to_string().contains("patent-renders/US123-17.png"));
        assert_eq!(err.kind(), "persist_error");
        assert!(err.retryable());
    }

    #[test]
    fn invalid_argument_is_not_retryable() {
        let err = Error::InvalidArgument("maxAge must be non-negative".into());
        assert_eq!(err.kind(), "invalid_argument");
        assert!(!err.retryable());
    }
}
