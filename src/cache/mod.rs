//! 内容寻址缓存模块：以指纹为键持久化流水线结果，避免重复支付外部生成调用。
//!
//! # Content-Addressed Result Cache
//!
//! This module provides the durable fingerprint → result mapping that protects
//! the generation pipeline from repeating paid external work. Every stage of
//! the pipeline is a priced and latency-heavy external call; the cache turns
//! a repeated request into a single read.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`CacheStore`] | Entry framing, statistics, and eviction over a backend |
//! | [`CacheBackend`] | Trait for byte-level entry storage |
//! | [`DirCache`] | One JSON file per fingerprint under a directory |
//! | [`MemoryCache`] | Volatile backend for tests and embedders |
//! | [`CacheEntry`] | Immutable record of one completed computation |
//! | [`CacheStatistics`] | On-demand scan of count, size, timestamp extremes |
//!
//! ## Failure Policy
//!
//! The cache is an optimization, never a correctness dependency. Read-path
//! failures degrade into misses and are logged; only writes surface an error
//! ([`CacheWrite`](crate::Error::CacheWrite)), and callers treat that as
//! best-effort too. Administrative parameters are validated before any
//! deletion takes place.

mod backend;
mod entry;
mod store;

pub use backend::{CacheBackend, DirCache, MemoryCache};
pub use entry::{CacheEntry, CacheStatistics};
pub use store::CacheStore;

pub(crate) use store::now_ms;
