//! Repository metadata boundary.
//!
//! The pipeline needs three pieces of repository metadata: the default
//! branch, a flat file listing, and the README text. [`RepositorySource`]
//! abstracts where those come from; [`GithubSource`] is the REST-backed
//! production implementation and tests substitute static fixtures.

mod github;

use async_trait::async_trait;
use miette::Diagnostic;
use thiserror::Error;

pub use github::GithubSource;

/// Provider of repository metadata. All operations accept an optional
/// caller-supplied access token which takes precedence over any
/// service-level credential.
#[async_trait]
pub trait RepositorySource: Send + Sync {
    /// The repository's default branch, or `None` when the source cannot
    /// report one (caller applies the fallback).
    async fn default_branch(
        &self,
        owner: &str,
        repo: &str,
        token: Option<&str>,
    ) -> Result<Option<String>, SourceError>;

    /// Newline-joined listing of the repository's file paths.
    async fn file_tree(
        &self,
        owner: &str,
        repo: &str,
        token: Option<&str>,
    ) -> Result<String, SourceError>;

    /// The repository README as plain text; empty when the repo has none.
    async fn readme(
        &self,
        owner: &str,
        repo: &str,
        token: Option<&str>,
    ) -> Result<String, SourceError>;
}

/// Errors surfaced by a repository source.
#[derive(Debug, Error, Diagnostic)]
pub enum SourceError {
    #[error("repository source transport error: {0}")]
    #[diagnostic(code(diagramsmith::source::transport))]
    Transport(#[from] reqwest::Error),

    #[error("repository source returned an unexpected payload: {0}")]
    #[diagnostic(code(diagramsmith::source::payload))]
    Payload(String),
}
