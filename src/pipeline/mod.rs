//! 流水线编排模块：顺序执行三个外部生成阶段，命中缓存时全部跳过。
//!
//! # Pipeline Orchestrator
//!
//! One invocation moves through a strict state machine:
//!
//! ```text
//! Hashing → CacheLookup ─┬─(hit)──────────────────────────→ Complete
//!                        └─(miss)→ PromptSynthesis
//!                                   → ImageSynthesis
//!                                    → Persisting
//!                                     → CacheWrite → Complete
//! any stage failure ──────────────────────────────────────→ Failed
//! ```
//!
//! A cache hit returns the stored result without touching any external
//! collaborator; that is the entire point of the cache. On a miss, at most
//! one invocation per fingerprint executes the external stages at a time
//! (see [`flight`]); concurrent callers for the same fingerprint wait and
//! then read the owner's freshly cached result.
//!
//! The cache write at the end is best-effort: its failure is logged and the
//! computed result is returned anyway.

mod flight;


use crate::cache::{now_ms, CacheStore};
use crate::fingerprint::{self, Fingerprint, RequestDigest};
use crate::providers::{ArtifactStore, ImageSynthesizer, PromptSynthesizer};
use crate::{Error, Result};
use bytes::Bytes;
use flight::FlightTable;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Artifact keys group under this prefix in the object store.
const ARTIFACT_KEY_PREFIX: &str = "patent-renders";

/// States of one pipeline invocation. `Complete` and `Failed` are terminal;
/// every other state has exactly one successor on the success path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Hashing,
    CacheLookup,
    PromptSynthesis,
    ImageSynthesis,
    Persisting,
    CacheWrite,
    Complete,
    Failed,
}

impl PipelineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hashing => "hashing",
            Self::CacheLookup => "cache-lookup",
            Self::PromptSynthesis => "prompt-synthesis",
            Self::ImageSynthesis => "image-synthesis",
            Self::Persisting => "persisting",
            Self::CacheWrite => "cache-write",
            Self::Complete => "complete",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Output of one completed computation. This is the payload cached under the
/// request fingerprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    /// Normalized rendering prompt: structured JSON, or
    /// `{"prompt_text": …}` when the model strayed from JSON.
    pub prompt: Value,
    /// Transient asset URL reported by the image-synthesis collaborator.
    pub asset_url: String,
    /// Durable URL of the persisted artifact.
    pub persisted_url: String,
    /// Provider-side correlation id of the image-synthesis call, when given.
    pub provider_request_id: Option<String>,
}

/// A terminal success, fresh or served from the cache.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub fingerprint: Fingerprint,
    pub cache_hit: bool,
    pub result: PipelineResult,
}

/// Sequences the three external stages behind the content-addressed cache.
///
/// Collaborators and the cache store are constructor-injected; the pipeline
/// holds no ambient state beyond its in-flight table.
pub struct RenderPipeline {
    prompts: Arc<dyn PromptSynthesizer>,
    images: Arc<dyn ImageSynthesizer>,
    artifacts: Arc<dyn ArtifactStore>,
    store: Arc<CacheStore>,
    flights: FlightTable,
}

impl RenderPipeline {
    pub fn new(
        prompts: Arc<dyn PromptSynthesizer>,
        images: Arc<dyn ImageSynthesizer>,
        artifacts: Arc<dyn ArtifactStore>,
        store: Arc<CacheStore>,
    ) -> Self {
        Self {
            prompts,
            images,
            artifacts,
            store,
            flights: FlightTable::new(),
        }
    }

    /// Runs one request to a terminal state. Blocks the caller until either a
    /// complete [`RunOutcome`] or a specific error cause is available; no
    /// partial results are ever returned.
    pub async fn run(&self, image: Bytes, metadata: &Value) -> Result<RunOutcome> {
        let request_id = Uuid::new_v4();
        let mut state = StateTracker::start(request_id);
        let outcome = self.run_inner(&mut state, image, metadata).await;
        match &outcome {
            Ok(out) => {
                state.advance(PipelineState::Complete);
                info!(
                    %request_id,
                    fingerprint = %out.fingerprint,
                    cache_hit = out.cache_hit,
                    persisted_url = %out.result.persisted_url,
                    "pipeline complete"
                );
            }
            Err(err) => {
                state.advance(PipelineState::Failed);
                warn!(%request_id, kind = err.kind(), %err, "pipeline failed");
            }
        }
        outcome
    }

    async fn run_inner(
        &self,
        state: &mut StateTracker,
        image: Bytes,
        metadata: &Value,
    ) -> Result<RunOutcome> {
        if image.is_empty() {
            return Err(Error::InvalidArgument("image must not be empty".into()));
        }
        let digest = fingerprint::derive(&image, metadata)?;

        state.advance(PipelineState::CacheLookup);
        if let Some(hit) = self.lookup(&digest.fingerprint).await {
            return Ok(hit);
        }

        // One owner per fingerprint runs the paid stages; concurrent callers
        // for the same content queue on the gate and re-check the cache.
        let gate = self.flights.lease(&digest.fingerprint).await;
        let outcome = {
            let _guard = gate.lock().await;
            match self.lookup(&digest.fingerprint).await {
                Some(hit) => Ok(hit),
                None => self.execute(state, &digest, &image, metadata).await,
            }
        };
        self.flights.release(&digest.fingerprint, gate).await;
        outcome
    }

    async fn lookup(&self, fingerprint: &Fingerprint) -> Option<RunOutcome> {
        let entry = self.store.get::<PipelineResult>(fingerprint).await?;
        Some(RunOutcome {
            fingerprint: fingerprint.clone(),
            cache_hit: true,
            result: entry.result,
        })
    }

    async fn execute(
        &self,
        state: &mut StateTracker,
        digest: &RequestDigest,
        image: &Bytes,
        metadata: &Value,
    ) -> Result<RunOutcome> {
        state.advance(PipelineState::PromptSynthesis);
        let raw = self.prompts.synthesize(metadata).await?;
        let prompt = normalize_prompt(&raw);

        state.advance(PipelineState::ImageSynthesis);
        let asset = self.images.generate(&prompt.to_string(), image).await?;
        let asset_url = match asset.url {
            Some(url) if !url.is_empty() => url,
            _ => return Err(Error::UpstreamEmptyResult),
        };

        state.advance(PipelineState::Persisting);
        let key = artifact_key(digest, metadata);
        let data = self
            .images
            .fetch_asset(&asset_url)
            .await
            .map_err(|err| Error::persist(&key, err))?;
        let persisted_url = self.artifacts.persist(&key, data, "image/png").await?;

        state.advance(PipelineState::CacheWrite);
        let result = PipelineResult {
            prompt,
            asset_url,
            persisted_url,
            provider_request_id: asset.request_id,
        };
        if let Err(err) = self
            .store
            .put(&digest.fingerprint, digest.input.clone(), &result)
            .await
        {
            // Best-effort: losing the cache write never fails the invocation.
            warn!(fingerprint = %digest.fingerprint, %err, "cache write failed");
        }

        Ok(RunOutcome {
            fingerprint: digest.fingerprint.clone(),
            cache_hit: false,
            result,
        })
    }
}

/// The model is asked for strict JSON but not trusted to produce it; text
/// that does not parse becomes an opaque prompt payload instead of an error.
fn normalize_prompt(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| json!({ "prompt_text": raw }))
}

/// `patent-renders/<source-id>-<now-ms>.png`. Time-suffixed so regenerations
/// of the same fingerprint never collide; a cache miss means any prior
/// artifact is being superseded.
fn artifact_key(digest: &RequestDigest, metadata: &Value) -> String {
    let source_id = metadata
        .get("patent_id")
        .or_else(|| metadata.get("id"))
        .and_then(Value::as_str)
        .unwrap_or(&digest.fingerprint.as_str()[..12]);
    // Key material only; anything else would escape the artifact prefix.
    let safe: String = source_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect();
    format!("{ARTIFACT_KEY_PREFIX}/{safe}-{}.png", now_ms())
}

struct StateTracker {
    request_id: Uuid,
    state: PipelineState,
}

impl StateTracker {
    fn start(request_id: Uuid) -> Self {
        debug!(%request_id, state = PipelineState::Hashing.as_str(), "pipeline started");
        Self {
            request_id,
            state: PipelineState::Hashing,
        }
    }

    fn advance(&mut self, to: PipelineState) {
        debug!(
            request_id = %self.request_id,
            from = self.state.as_str(),
            to = to.as_str(),
            "pipeline state"
        );
        self.state = to;
    }
}
