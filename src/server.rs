//! HTTP surface: one SSE generation endpoint, one JSON Q&A endpoint.
//!
//! The streaming handler bridges a pipeline task to the response through a
//! flume channel: the pipeline emits into a [`ChannelSink`] while the SSE
//! body drains the receiver. When the client disconnects, the receiver is
//! dropped, the next emit fails, and the pipeline abandons its remaining
//! phases instead of calling the backend for a dead consumer.

use std::convert::Infallible;
use std::sync::Arc;

use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router, extract::State};
use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::pipeline::{GenerationPipeline, GenerationRequest};
use crate::progress::ChannelSink;
use crate::qa::QaPipeline;

#[derive(Clone)]
pub struct AppState {
    pub generation: Arc<GenerationPipeline>,
    pub qa: Arc<QaPipeline>,
}

/// Request body shared by both endpoints.
#[derive(Clone, Debug, Deserialize)]
pub struct ApiRequest {
    pub username: String,
    pub repo: String,
    #[serde(default)]
    pub instructions: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub github_pat: Option<String>,
}

impl ApiRequest {
    fn into_generation_request(self) -> GenerationRequest {
        GenerationRequest {
            owner: self.username,
            repo: self.repo,
            instructions: self.instructions,
            api_key: self.api_key,
            github_token: self.github_pat,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/generate/stream", post(generate_stream))
        .route("/ask", post(ask))
        .with_state(state)
}

async fn generate_stream(State(state): State<AppState>, Json(body): Json<ApiRequest>) -> Response {
    let request = body.into_generation_request();

    // Validation failures answer synchronously, without opening a stream.
    if let Err(err) = request.validate() {
        return Json(json!({"error": err.to_string()})).into_response();
    }

    let request_id = Uuid::new_v4();
    tracing::info!(%request_id, owner = %request.owner, repo = %request.repo,
        "starting generation stream");

    let (sink, events) = ChannelSink::pair();
    let pipeline = state.generation.clone();
    tokio::spawn(async move {
        // Terminal events were already emitted by the pipeline; the error
        // here is only for the server log.
        if let Err(err) = pipeline.run(&request, &sink).await {
            tracing::warn!(%request_id, error = %err, "generation stream ended with error");
        }
    });

    let stream = events
        .into_stream()
        .map(|event| Ok::<_, Infallible>(SseEvent::default().data(event.to_json_string())));
    Sse::new(stream).keep_alive(KeepAlive::default()).into_response()
}

async fn ask(State(state): State<AppState>, Json(body): Json<ApiRequest>) -> Json<serde_json::Value> {
    let answer = state
        .qa
        .answer(
            &body.username,
            &body.repo,
            &body.instructions,
            body.github_pat.as_deref(),
            body.api_key.as_deref(),
        )
        .await;

    match answer {
        Ok(answer) => Json(json!({"answer": answer})),
        Err(err) => {
            tracing::warn!(owner = %body.username, repo = %body.repo, error = %err,
                "question answering failed");
            Json(json!({"error": err.to_string()}))
        }
    }
}
