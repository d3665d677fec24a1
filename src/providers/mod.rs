//! External collaborator seams.
//!
//! The pipeline treats each external service as an opaque asynchronous
//! operation behind a trait: prompt synthesis against a language model, image
//! transformation against a generative image service, and durable persistence
//! to object storage. The HTTP adapters here are thin and swappable; tests
//! substitute scripted implementations and assert on call counts.

pub mod fal;
pub mod object_store;
pub mod openai;

pub use fal::FalImageSynthesizer;
pub use object_store::HttpArtifactStore;
pub use openai::OpenAiPromptSynthesizer;

use crate::Result;
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// What the image-synthesis collaborator hands back for one generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedAsset {
    /// Transient URL of the generated asset. Absent or empty means the
    /// provider produced nothing usable.
    pub url: Option<String>,
    /// Provider-side correlation id, when one is given.
    pub request_id: Option<String>,
}

/// Produces a rendering prompt from the request metadata.
#[async_trait]
pub trait PromptSynthesizer: Send + Sync {
    /// Returns the model's raw text. The orchestrator decides how to
    /// interpret it; implementations never fail on malformed model output,
    /// only on transport.
    async fn synthesize(&self, metadata: &Value) -> Result<String>;
}

/// Transforms the source image according to a prompt.
#[async_trait]
pub trait ImageSynthesizer: Send + Sync {
    async fn generate(&self, prompt: &str, image: &Bytes) -> Result<GeneratedAsset>;
    /// Downloads a generated asset from its transient location.
    async fn fetch_asset(&self, url: &str) -> Result<Bytes>;
}

/// Durable object storage for finished artifacts.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Writes `data` under `key` and returns the public URL of the durable
    /// copy.
    async fn persist(&self, key: &str, data: Bytes, content_type: &str) -> Result<String>;
}

pub(crate) fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}
