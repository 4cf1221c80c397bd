use httpmock::prelude::*;
use serde_json::json;

use diagramsmith::source::{GithubSource, RepositorySource};

#[tokio::test]
async fn default_branch_comes_from_repo_metadata() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/repos/acme/widget");
            then.status(200)
                .json_body(json!({"name": "widget", "default_branch": "develop"}));
        })
        .await;

    let source = GithubSource::with_base_url(server.base_url(), None).unwrap();
    let branch = source.default_branch("acme", "widget", None).await.unwrap();

    assert_eq!(branch.as_deref(), Some("develop"));
    mock.assert_async().await;
}

#[tokio::test]
async fn missing_repo_yields_no_branch() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/repos/acme/ghost");
            then.status(404).json_body(json!({"message": "Not Found"}));
        })
        .await;

    let source = GithubSource::with_base_url(server.base_url(), None).unwrap();
    let branch = source.default_branch("acme", "ghost", None).await.unwrap();
    assert_eq!(branch, None);
}

#[tokio::test]
async fn file_tree_joins_blob_paths() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/repos/acme/widget/git/trees/HEAD")
                .query_param("recursive", "1");
            then.status(200).json_body(json!({
                "tree": [
                    {"path": "src", "type": "tree"},
                    {"path": "src/main.rs", "type": "blob"},
                    {"path": "README.md", "type": "blob"},
                ]
            }));
        })
        .await;

    let source = GithubSource::with_base_url(server.base_url(), None).unwrap();
    let tree = source.file_tree("acme", "widget", None).await.unwrap();
    assert_eq!(tree, "src/main.rs\nREADME.md");
}

#[tokio::test]
async fn missing_readme_is_empty_not_an_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/repos/acme/widget/readme");
            then.status(404).json_body(json!({"message": "Not Found"}));
        })
        .await;

    let source = GithubSource::with_base_url(server.base_url(), None).unwrap();
    let readme = source.readme("acme", "widget", None).await.unwrap();
    assert_eq!(readme, "");
}

#[tokio::test]
async fn readme_is_fetched_raw() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/repos/acme/widget/readme")
                .header("accept", "application/vnd.github.raw+json");
            then.status(200).body("# Widget\n\nA small tool.");
        })
        .await;

    let source = GithubSource::with_base_url(server.base_url(), None).unwrap();
    let readme = source.readme("acme", "widget", None).await.unwrap();
    assert_eq!(readme, "# Widget\n\nA small tool.");
}

#[tokio::test]
async fn caller_token_is_forwarded_as_bearer() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/repos/acme/widget")
                .header("authorization", "Bearer caller-pat");
            then.status(200).json_body(json!({"default_branch": "main"}));
        })
        .await;

    let source = GithubSource::with_base_url(server.base_url(), Some("service-pat".into())).unwrap();
    // Per-request token wins over the service default.
    source
        .default_branch("acme", "widget", Some("caller-pat"))
        .await
        .unwrap();
    mock.assert_async().await;
}
