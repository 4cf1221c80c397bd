use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;

use super::{RepositorySource, SourceError};

const USER_AGENT: &str = concat!("diagramsmith/", env!("CARGO_PKG_VERSION"));

/// [`RepositorySource`] backed by the GitHub REST v3 API.
///
/// Only public metadata is fetched; a token (service-level default or
/// per-request override) raises rate limits and grants private-repo access.
pub struct GithubSource {
    http: reqwest::Client,
    base_url: String,
    default_token: Option<String>,
}

impl GithubSource {
    pub fn new(default_token: Option<String>) -> Result<Self, SourceError> {
        Self::with_base_url("https://api.github.com", default_token)
    }

    /// Point the source at a different API root (tests use a local mock).
    pub fn with_base_url(
        base_url: impl Into<String>,
        default_token: Option<String>,
    ) -> Result<Self, SourceError> {
        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            default_token,
        })
    }

    fn get(&self, path: &str, token: Option<&str>) -> reqwest::RequestBuilder {
        let url = format!("{}{path}", self.base_url.trim_end_matches('/'));
        let mut request = self.http.get(url);
        if let Some(token) = token.or(self.default_token.as_deref()) {
            request = request.bearer_auth(token);
        }
        request
    }
}

#[async_trait]
impl RepositorySource for GithubSource {
    async fn default_branch(
        &self,
        owner: &str,
        repo: &str,
        token: Option<&str>,
    ) -> Result<Option<String>, SourceError> {
        let response = self.get(&format!("/repos/{owner}/{repo}"), token).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body: Value = response.error_for_status()?.json().await?;
        Ok(body["default_branch"].as_str().map(str::to_owned))
    }

    async fn file_tree(
        &self,
        owner: &str,
        repo: &str,
        token: Option<&str>,
    ) -> Result<String, SourceError> {
        let response = self
            .get(&format!("/repos/{owner}/{repo}/git/trees/HEAD?recursive=1"), token)
            .send()
            .await?
            .error_for_status()?;
        let body: Value = response.json().await?;

        let entries = body["tree"]
            .as_array()
            .ok_or_else(|| SourceError::Payload("tree listing is not an array".into()))?;
        let paths: Vec<&str> = entries
            .iter()
            .filter(|entry| entry["type"].as_str() == Some("blob"))
            .filter_map(|entry| entry["path"].as_str())
            .collect();
        Ok(paths.join("\n"))
    }

    async fn readme(
        &self,
        owner: &str,
        repo: &str,
        token: Option<&str>,
    ) -> Result<String, SourceError> {
        let response = self
            .get(&format!("/repos/{owner}/{repo}/readme"), token)
            .header("Accept", "application/vnd.github.raw+json")
            .send()
            .await?;
        // A repository without a README is not an error.
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(String::new());
        }
        Ok(response.error_for_status()?.text().await?)
    }
}
