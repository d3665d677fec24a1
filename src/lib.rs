//! # patent-render
//!
//! 带缓存的三段式生成流水线：提示词合成、图像生成与持久化归档，按内容指纹避免重复付费调用。
//!
//! Cached generation pipeline for patent render artifacts. An incoming request
//! (image bytes + metadata record) flows through three paid and latency-heavy
//! external stages (prompt synthesis against a language model, image
//! transformation against a generative image service, and persistence to
//! durable object storage) and returns the URL of the derived artifact.
//!
//! ## Core Philosophy
//!
//! - **Content-Addressed**: every request is fingerprinted from its exact image
//!   bytes and canonicalized metadata; identical work is never paid for twice
//! - **Best-Effort Cache**: the cache accelerates the pipeline but never
//!   affects the correctness of a single request; cache failures are absorbed
//!   and logged, not surfaced
//! - **Single-Flight**: concurrent requests for the same fingerprint share one
//!   execution instead of racing the external providers
//! - **Type-Safe**: every failure carries a specific error kind; no partial
//!   results are ever returned
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use patent_render::{CacheStore, RenderPipeline};
//! use patent_render::providers::{FalImageSynthesizer, HttpArtifactStore, OpenAiPromptSynthesizer};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> patent_render::Result<()> {
//!     let store = Arc::new(CacheStore::on_disk(".cache/renders"));
//!     let pipeline = RenderPipeline::new(
//!         Arc::new(OpenAiPromptSynthesizer::new("sk-...")),
//!         Arc::new(FalImageSynthesizer::new("fal-...")),
//!         Arc::new(HttpArtifactStore::new(
//!             "https://artifacts.internal/v1",
//!             "https://renders.example.com",
//!             "token",
//!         )?),
//!         store,
//!     );
//!
//!     let image = bytes::Bytes::from_static(b"...png bytes...");
//!     let meta = serde_json::json!({ "patent_id": "US1234567", "title": "Earphone cover" });
//!     let outcome = pipeline.run(image, &meta).await?;
//!     println!("{}", outcome.result.persisted_url);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`fingerprint`] | Deterministic content fingerprinting of (image, metadata) |
//! | [`cache`] | Durable fingerprint-addressed store with stats and eviction |
//! | [`pipeline`] | Three-stage orchestrator with single-flight de-duplication |
//! | [`providers`] | External collaborator seams and their HTTP adapters |
//! | [`admin`] | Administrative contract consumed by CLI/HTTP glue |

pub mod admin;
pub mod cache;
pub mod error;
pub mod fingerprint;
pub mod pipeline;
pub mod providers;

// Re-export main types for convenience
pub use admin::{CacheAdmin, CacheReport, ClearReport, PipelineResponse};
pub use cache::{CacheBackend, CacheEntry, CacheStatistics, CacheStore, DirCache, MemoryCache};
pub use error::Error;
pub use fingerprint::{Fingerprint, InputDigest, RequestDigest};
pub use pipeline::{PipelineResult, PipelineState, RenderPipeline, RunOutcome};
pub use providers::{ArtifactStore, GeneratedAsset, ImageSynthesizer, PromptSynthesizer};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;
