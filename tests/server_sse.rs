mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{ScriptedModel, StaticSource, pipelines_with};
use diagramsmith::server::{AppState, router};
use futures_util::StreamExt;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::time::timeout;

fn widget_state() -> AppState {
    let model = ScriptedModel::new(&[
        &["The repo ", "is a widget."],
        &["<component_mapping>Main: src/main.go</component_mapping>"],
        &["flowchart TD\n    click A \"src/main.go\""],
    ]);
    let source = StaticSource::new(Some("main"), "src/main.go", "# widget");
    let (generation, qa) = pipelines_with(source, model);
    AppState {
        generation: Arc::new(generation),
        qa: Arc::new(qa),
    }
}

#[tokio::test(flavor = "multi_thread")]
#[ignore]
async fn stream_endpoint_emits_events_until_completion() -> Result<(), Box<dyn std::error::Error>> {
    let app = router(widget_state());
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let server = tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, app.into_make_service()).await {
            tracing::error!("axum server error: {err:?}");
        }
    });

    let client = reqwest::Client::builder().build()?;
    let response = client
        .post(format!("http://{addr}/generate/stream"))
        .json(&json!({"username": "acme", "repo": "widget"}))
        .send()
        .await?;
    assert!(
        response
            .headers()
            .get("content-type")
            .is_some_and(|value| value.to_str().unwrap_or("").starts_with("text/event-stream"))
    );

    let mut body = response.bytes_stream();
    let mut collected = String::new();
    while let Some(chunk) = timeout(Duration::from_secs(5), body.next()).await? {
        collected.push_str(&String::from_utf8_lossy(&chunk?));
        if collected.contains("\"status\":\"complete\"") {
            break;
        }
    }

    assert!(collected.contains("\"status\":\"started\""));
    assert!(collected.contains("explanation_chunk"));
    assert!(collected.contains("https://github.com/acme/widget/blob/main/src/main.go"));

    server.abort();
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
#[ignore]
async fn validation_failure_answers_with_plain_json() -> Result<(), Box<dyn std::error::Error>> {
    let app = router(widget_state());
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let server = tokio::spawn(async move {
        let _ = axum::serve(listener, app.into_make_service()).await;
    });

    let client = reqwest::Client::builder().build()?;
    let body: Value = client
        .post(format!("http://{addr}/generate/stream"))
        .json(&json!({"username": "acme", "repo": "fastapi"}))
        .send()
        .await?
        .json()
        .await?;

    assert_eq!(body["error"], "Example repos cannot be regenerated");

    let body: Value = client
        .post(format!("http://{addr}/ask"))
        .json(&json!({"username": "acme", "repo": "widget", "instructions": "What is this?"}))
        .send()
        .await?
        .json()
        .await?;
    assert!(body["answer"].is_string() || body["error"].is_string());

    server.abort();
    Ok(())
}
