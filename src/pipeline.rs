//! The staged generation pipeline.
//!
//! Drives three dependent model phases (explanation → component mapping →
//! diagram) over a fetched repository context, streaming every fragment to
//! the caller as it arrives. Order of operations and the emitted event
//! sequence are a strict contract:
//!
//! 1. validate the request (no events, no network on violation)
//! 2. fetch context through the cache, emit `started`
//! 3. gate on the estimated token count of tree + README
//! 4. explanation phase (instructions-augmented prompt)
//! 5. mapping phase, with delimited extraction
//! 6. diagram phase (instructions-augmented), fence stripping
//! 7. rewrite click directives against the default branch
//! 8. emit the single `complete` event
//!
//! Every failure path funnels into exactly one `error` event; partial
//! output is never presented as success.

use std::sync::Arc;
use std::time::Duration;

use miette::Diagnostic;
use thiserror::Error;
use tokio::time::sleep;

use crate::budget::{self, GateDecision};
use crate::cache::{RepoContext, RepoContextCache};
use crate::progress::{Phase, ProgressEvent, ProgressSink, SinkError};
use crate::prompts::{
    BAD_INSTRUCTIONS_SENTINEL, COMPONENT_MAPPING_END, COMPONENT_MAPPING_START, SYSTEM_FIRST_PROMPT,
    SYSTEM_SECOND_PROMPT, SYSTEM_THIRD_PROMPT, with_additional_instructions,
};
use crate::rewrite::rewrite_click_paths;
use crate::source::SourceError;
use crate::stage::{StageError, StageRunner};

/// Maximum accepted length for caller-supplied instructions.
pub const MAX_INSTRUCTIONS_LEN: usize = 1000;

/// Repositories that always short-circuit with an error.
pub const RESERVED_REPOS: &[&str] = &[
    "fastapi",
    "streamlit",
    "flask",
    "api-analytics",
    "monkeytype",
];

/// Default pause between a `<phase>_sent` status and the first chunk, so a
/// consuming observer registers the transition before chunk flooding.
pub const DEFAULT_STAGE_PAUSE: Duration = Duration::from_millis(100);

/// One diagram-generation request.
#[derive(Clone, Debug, Default)]
pub struct GenerationRequest {
    pub owner: String,
    pub repo: String,
    pub instructions: String,
    /// Caller-supplied model credential; relaxes the soft token limit.
    pub api_key: Option<String>,
    /// Caller-supplied repository access token.
    pub github_token: Option<String>,
}

impl GenerationRequest {
    /// Check the request shape before any network activity.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.instructions.len() > MAX_INSTRUCTIONS_LEN {
            return Err(PipelineError::InstructionsTooLong);
        }
        if RESERVED_REPOS.contains(&self.repo.as_str()) {
            return Err(PipelineError::ReservedRepo);
        }
        Ok(())
    }
}

/// Final artifacts of a successful run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerationResult {
    pub diagram: String,
    pub explanation: String,
    pub mapping: String,
}

/// Everything that can terminate a generation run.
#[derive(Debug, Error, Diagnostic)]
pub enum PipelineError {
    #[error("Instructions exceed maximum length of 1000 characters")]
    #[diagnostic(code(diagramsmith::pipeline::instructions_too_long))]
    InstructionsTooLong,

    #[error("Example repos cannot be regenerated")]
    #[diagnostic(code(diagramsmith::pipeline::reserved_repo))]
    ReservedRepo,

    #[error(
        "File tree and README combined exceeds token limit (50,000). Current size: {count} tokens. \
         This repository is too large for the default token budget, but you can continue by \
         providing your own API key."
    )]
    #[diagnostic(code(diagramsmith::pipeline::over_soft_limit))]
    OverSoftLimit { count: usize },

    #[error(
        "Repository is too large (>195k tokens) for analysis. The model backend's maximum context \
         length is 200k tokens. Current size: {count} tokens."
    )]
    #[diagnostic(code(diagramsmith::pipeline::over_hard_limit))]
    OverHardLimit { count: usize },

    #[error("Invalid or unclear instructions provided")]
    #[diagnostic(code(diagramsmith::pipeline::bad_instructions))]
    BadInstructions,

    #[error(transparent)]
    #[diagnostic(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Stage(#[from] StageError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Sink(#[from] SinkError),
}

/// Orchestrates the three-phase generation run.
///
/// Holds no per-request state; a single pipeline value serves concurrent
/// requests, sharing only the injected context cache.
pub struct GenerationPipeline {
    cache: Arc<RepoContextCache>,
    stages: StageRunner,
    stage_pause: Duration,
}

impl GenerationPipeline {
    pub fn new(cache: Arc<RepoContextCache>, stages: StageRunner, stage_pause: Duration) -> Self {
        Self {
            cache,
            stages,
            stage_pause,
        }
    }

    /// Run the pipeline, streaming progress into `sink`.
    ///
    /// On failure, exactly one `error` event is emitted (best-effort if the
    /// sink itself is gone) and the error is returned to the caller.
    pub async fn run(
        &self,
        request: &GenerationRequest,
        sink: &dyn ProgressSink,
    ) -> Result<GenerationResult, PipelineError> {
        let outcome = self.execute(request, sink).await;
        if let Err(err) = &outcome {
            tracing::warn!(owner = %request.owner, repo = %request.repo, error = %err,
                "generation pipeline terminated");
            let _ = sink.emit(ProgressEvent::error(err.to_string()));
        }
        outcome
    }

    async fn execute(
        &self,
        request: &GenerationRequest,
        sink: &dyn ProgressSink,
    ) -> Result<GenerationResult, PipelineError> {
        request.validate()?;

        let context = self.fetch_context(request).await?;
        sink.emit(ProgressEvent::status(
            "started",
            "Starting generation process...",
        ))?;
        sleep(self.stage_pause).await;

        self.gate(request, &context)?;

        let explanation = self.run_explanation(request, &context, sink).await?;
        let mapping = self.run_mapping(request, &context, &explanation, sink).await?;
        let diagram = self
            .run_diagram(request, &context, &explanation, &mapping, sink)
            .await?;

        sink.emit(ProgressEvent::complete(
            diagram.clone(),
            explanation.clone(),
            mapping.clone(),
        ))?;

        Ok(GenerationResult {
            diagram,
            explanation,
            mapping,
        })
    }

    async fn fetch_context(
        &self,
        request: &GenerationRequest,
    ) -> Result<Arc<RepoContext>, PipelineError> {
        Ok(self
            .cache
            .get(
                &request.owner,
                &request.repo,
                request.github_token.as_deref(),
            )
            .await?)
    }

    /// Token admission check; expensive calls must never run past a
    /// rejection.
    fn gate(&self, request: &GenerationRequest, context: &RepoContext) -> Result<(), PipelineError> {
        let combined = format!("{}\n{}", context.file_tree, context.readme);
        let count = budget::estimate_tokens(&combined);
        match budget::check(count, request.api_key.is_some()) {
            GateDecision::Proceed => Ok(()),
            GateDecision::RejectOverSoftLimit { count } => {
                Err(PipelineError::OverSoftLimit { count })
            }
            GateDecision::RejectOverHardLimit { count } => {
                Err(PipelineError::OverHardLimit { count })
            }
        }
    }

    async fn announce(&self, phase: Phase, sink: &dyn ProgressSink) -> Result<(), SinkError> {
        sink.emit(ProgressEvent::phase_sent(phase))?;
        sleep(self.stage_pause).await;
        sink.emit(ProgressEvent::phase_started(phase))?;
        Ok(())
    }

    async fn run_explanation(
        &self,
        request: &GenerationRequest,
        context: &RepoContext,
        sink: &dyn ProgressSink,
    ) -> Result<String, PipelineError> {
        self.announce(Phase::Explanation, sink).await?;
        let system_prompt =
            with_additional_instructions(SYSTEM_FIRST_PROMPT, &request.instructions);
        let explanation = self
            .stages
            .run(
                Phase::Explanation,
                &system_prompt,
                &[
                    ("file_tree", &context.file_tree),
                    ("readme", &context.readme),
                    ("instructions", &request.instructions),
                ],
                request.api_key.as_deref(),
                sink,
            )
            .await?;

        if explanation.contains(BAD_INSTRUCTIONS_SENTINEL) {
            return Err(PipelineError::BadInstructions);
        }
        Ok(explanation)
    }

    async fn run_mapping(
        &self,
        request: &GenerationRequest,
        context: &RepoContext,
        explanation: &str,
        sink: &dyn ProgressSink,
    ) -> Result<String, PipelineError> {
        self.announce(Phase::Mapping, sink).await?;
        let full = self
            .stages
            .run(
                Phase::Mapping,
                SYSTEM_SECOND_PROMPT,
                &[
                    ("explanation", explanation),
                    ("file_tree", &context.file_tree),
                ],
                request.api_key.as_deref(),
                sink,
            )
            .await?;
        Ok(extract_component_mapping(&full).to_owned())
    }

    async fn run_diagram(
        &self,
        request: &GenerationRequest,
        context: &RepoContext,
        explanation: &str,
        mapping: &str,
        sink: &dyn ProgressSink,
    ) -> Result<String, PipelineError> {
        self.announce(Phase::Diagram, sink).await?;
        let system_prompt =
            with_additional_instructions(SYSTEM_THIRD_PROMPT, &request.instructions);
        let raw = self
            .stages
            .run(
                Phase::Diagram,
                &system_prompt,
                &[
                    ("explanation", explanation),
                    ("component_mapping", mapping),
                    ("instructions", &request.instructions),
                ],
                request.api_key.as_deref(),
                sink,
            )
            .await?;

        let cleaned = strip_code_fences(&raw);
        if cleaned.contains(BAD_INSTRUCTIONS_SENTINEL) {
            return Err(PipelineError::BadInstructions);
        }

        Ok(rewrite_click_paths(
            &cleaned,
            &request.owner,
            &request.repo,
            &context.default_branch,
        ))
    }
}

/// Slice strictly between the first mapping markers.
///
/// Missing or misordered markers yield an empty extraction; the mapping
/// text is advisory input to the diagram phase, not a parse target, so the
/// degenerate case is tolerated rather than raised.
fn extract_component_mapping(full: &str) -> &str {
    let start = full
        .find(COMPONENT_MAPPING_START)
        .map(|at| at + COMPONENT_MAPPING_START.len());
    let end = full.find(COMPONENT_MAPPING_END);
    match (start, end) {
        (Some(start), Some(end)) if start <= end => &full[start..end],
        _ => "",
    }
}

/// Remove Mermaid code-fence delimiters the model tends to wrap output in.
fn strip_code_fences(diagram: &str) -> String {
    diagram.replace("```mermaid", "").replace("```", "")
}
