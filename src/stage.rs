//! Single-phase execution against the model backend.
//!
//! A stage composes one prompt, opens one streaming completion, and
//! forwards every fragment to the progress sink in arrival order while
//! accumulating the full text for the next phase. Forwarding happens
//! *before* the next fragment is requested, so a consumer observes exactly
//! the backend's ordering with no batching.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use miette::Diagnostic;
use thiserror::Error;
use tokio::time::timeout;

use crate::model::{LanguageModelClient, ModelError};
use crate::progress::{Phase, ProgressEvent, ProgressSink, SinkError};

/// Errors that terminate a phase (and with it, the pipeline).
#[derive(Debug, Error, Diagnostic)]
pub enum StageError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Model(#[from] ModelError),

    /// The progress consumer went away; remaining work is abandoned.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Sink(#[from] SinkError),

    /// The backend stream produced no fragment within the configured
    /// window. Converts a hung upstream into a bounded failure.
    #[error("{phase} phase timed out waiting for the model backend ({timeout:?})")]
    #[diagnostic(
        code(diagramsmith::stage::timeout),
        help("Raise MODEL_FRAGMENT_TIMEOUT_SECS if the backend is just slow.")
    )]
    Timeout { phase: Phase, timeout: Duration },
}

/// Drives one phase of a pipeline run.
#[derive(Clone)]
pub struct StageRunner {
    client: Arc<dyn LanguageModelClient>,
    fragment_timeout: Duration,
}

impl StageRunner {
    pub fn new(client: Arc<dyn LanguageModelClient>, fragment_timeout: Duration) -> Self {
        Self {
            client,
            fragment_timeout,
        }
    }

    /// Run a phase whose user message is rendered from `context` key/value
    /// pairs (stable slice order, `key: value` blocks).
    pub async fn run(
        &self,
        phase: Phase,
        system_prompt: &str,
        context: &[(&str, &str)],
        api_key: Option<&str>,
        sink: &dyn ProgressSink,
    ) -> Result<String, StageError> {
        self.run_raw(phase, system_prompt, &render_context(context), api_key, sink)
            .await
    }

    /// Run a phase with a preformatted user message.
    pub async fn run_raw(
        &self,
        phase: Phase,
        system_prompt: &str,
        user_message: &str,
        api_key: Option<&str>,
        sink: &dyn ProgressSink,
    ) -> Result<String, StageError> {
        let prompt = format!("{system_prompt}\n\n{user_message}");
        tracing::debug!(%phase, prompt_bytes = prompt.len(), "starting stage");

        let mut fragments = self.client.stream_complete(&prompt, api_key).await?;
        let mut accumulated = String::new();

        loop {
            let next = timeout(self.fragment_timeout, fragments.next())
                .await
                .map_err(|_| StageError::Timeout {
                    phase,
                    timeout: self.fragment_timeout,
                })?;
            match next {
                Some(Ok(fragment)) => {
                    // Forward before polling again: streaming order is a
                    // hard guarantee.
                    sink.emit(ProgressEvent::chunk(phase, fragment.clone()))?;
                    accumulated.push_str(&fragment);
                }
                Some(Err(err)) => return Err(StageError::Model(err)),
                None => break,
            }
        }

        tracing::debug!(%phase, output_bytes = accumulated.len(), "stage complete");
        Ok(accumulated)
    }
}

/// Deterministic `key: value` rendering of stage context.
fn render_context(pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .map(|(key, value)| format!("{key}: {value}"))
        .collect::<Vec<_>>()
        .join("\n\n")
}
