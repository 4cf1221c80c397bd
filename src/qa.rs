//! Single-shot question answering over cached repository context.
//!
//! Reuses the same context cache and stage runner as the generation
//! pipeline, but runs exactly one phase: no token gate, no delimited
//! extraction, no rewriting. Fragments are accumulated into the answer and
//! never streamed to the caller.

use std::sync::Arc;

use miette::Diagnostic;
use thiserror::Error;

use crate::cache::RepoContextCache;
use crate::progress::{DiscardSink, Phase};
use crate::prompts::SYSTEM_QA_PROMPT;
use crate::source::SourceError;
use crate::stage::{StageError, StageRunner};

#[derive(Debug, Error, Diagnostic)]
pub enum QaError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Stage(#[from] StageError),
}

pub struct QaPipeline {
    cache: Arc<RepoContextCache>,
    stages: StageRunner,
}

impl QaPipeline {
    pub fn new(cache: Arc<RepoContextCache>, stages: StageRunner) -> Self {
        Self { cache, stages }
    }

    /// Answer a free-form question about a repository.
    pub async fn answer(
        &self,
        owner: &str,
        repo: &str,
        question: &str,
        github_token: Option<&str>,
        api_key: Option<&str>,
    ) -> Result<String, QaError> {
        let context = self.cache.get(owner, repo, github_token).await?;

        let context_block = format!(
            "File Tree:\n{}\n\nREADME:\n{}",
            context.file_tree, context.readme
        );
        let message = format!("Question: {question}\n\nContext: {context_block}");

        let answer = self
            .stages
            .run_raw(Phase::Answer, SYSTEM_QA_PROMPT, &message, api_key, &DiscardSink)
            .await?;
        Ok(answer)
    }
}
