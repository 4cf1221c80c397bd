//! # Diagramsmith: streamed architecture diagrams from repository metadata
//!
//! Diagramsmith drives an external language-model backend through three
//! dependent phases — explanation, component mapping, diagram — over a
//! repository's file tree and README, streaming every fragment of progress
//! to the caller while it works. A single-shot question-answering mode
//! reuses the same repository context.
//!
//! ## Architecture
//!
//! - [`source`] — repository metadata boundary (GitHub REST implementation)
//! - [`cache`] — bounded LRU memoization of context fetches
//! - [`budget`] — token-count admission gate, run once per request
//! - [`model`] — language-model backend boundary (OpenAI-compatible SSE)
//! - [`stage`] — one phase: prompt composition, streaming, accumulation
//! - [`pipeline`] — the three-phase generation state machine
//! - [`qa`] — single-phase question answering
//! - [`rewrite`] — click-directive rewriting into absolute links
//! - [`progress`] — events and sinks, the only externally visible state
//! - [`server`] — axum SSE + JSON endpoints
//! - [`config`] — environment-driven service configuration
//!
//! ## Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use diagramsmith::cache::RepoContextCache;
//! use diagramsmith::model::OpenAiCompatClient;
//! use diagramsmith::pipeline::{GenerationPipeline, GenerationRequest};
//! use diagramsmith::progress::ChannelSink;
//! use diagramsmith::source::GithubSource;
//! use diagramsmith::stage::StageRunner;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let source = Arc::new(GithubSource::new(None)?);
//! let cache = Arc::new(RepoContextCache::new(source, 100));
//! let model = Arc::new(OpenAiCompatClient::new("http://127.0.0.1:1234/v1", "my-model", None)?);
//! let stages = StageRunner::new(model, Duration::from_secs(120));
//! let pipeline = GenerationPipeline::new(cache, stages, Duration::from_millis(100));
//!
//! let (sink, events) = ChannelSink::pair();
//! tokio::spawn(async move {
//!     while let Ok(event) = events.recv_async().await {
//!         println!("{event}");
//!     }
//! });
//!
//! let request = GenerationRequest {
//!     owner: "acme".into(),
//!     repo: "widget".into(),
//!     ..Default::default()
//! };
//! pipeline.run(&request, &sink).await?;
//! # Ok(())
//! # }
//! ```

pub mod budget;
pub mod cache;
pub mod config;
pub mod model;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod qa;
pub mod rewrite;
pub mod server;
pub mod source;
pub mod stage;
