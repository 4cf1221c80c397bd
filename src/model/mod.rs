//! Language-model backend boundary.
//!
//! The pipeline only ever sees [`LanguageModelClient`]: one composed prompt
//! in, a lazy sequence of text fragments out. The production implementation
//! ([`OpenAiCompatClient`]) speaks the OpenAI-compatible chat-completions
//! SSE protocol; tests substitute scripted clients.

mod openai;

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;
use miette::Diagnostic;
use thiserror::Error;

pub use openai::OpenAiCompatClient;

/// Lazy, finite, non-restartable sequence of text fragments from one
/// completion request. Fragments arrive in generation order.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, ModelError>> + Send>>;

/// Client capable of streaming one completion for a fully composed prompt.
#[async_trait]
pub trait LanguageModelClient: Send + Sync {
    /// Start a streaming completion.
    ///
    /// `api_key` is an optional caller-supplied credential that overrides
    /// the client's configured key for this single request.
    async fn stream_complete(
        &self,
        prompt: &str,
        api_key: Option<&str>,
    ) -> Result<FragmentStream, ModelError>;
}

/// Errors surfaced by the model backend.
#[derive(Debug, Error, Diagnostic)]
pub enum ModelError {
    /// HTTP-level failure: connection refused, TLS, non-success status.
    #[error("model backend transport error: {0}")]
    #[diagnostic(code(diagramsmith::model::transport))]
    Transport(#[from] reqwest::Error),

    /// The backend replied but its stream violated the wire protocol.
    #[error("model backend protocol error: {0}")]
    #[diagnostic(
        code(diagramsmith::model::protocol),
        help("The backend sent a frame that is not valid chat-completions SSE.")
    )]
    Protocol(String),
}
