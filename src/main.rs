use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt};

use diagramsmith::cache::RepoContextCache;
use diagramsmith::config::ServiceConfig;
use diagramsmith::model::{LanguageModelClient, OpenAiCompatClient};
use diagramsmith::pipeline::GenerationPipeline;
use diagramsmith::qa::QaPipeline;
use diagramsmith::server::{self, AppState};
use diagramsmith::source::GithubSource;
use diagramsmith::stage::StageRunner;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    let config = ServiceConfig::from_env();

    let source = Arc::new(GithubSource::new(config.github_token.clone())?);
    let cache = Arc::new(RepoContextCache::new(source, config.cache_capacity));
    let model: Arc<dyn LanguageModelClient> = Arc::new(OpenAiCompatClient::new(
        &config.model_base_url,
        &config.model_name,
        config.model_api_key.clone(),
    )?);
    let stages = StageRunner::new(model, config.fragment_timeout);

    let state = AppState {
        generation: Arc::new(GenerationPipeline::new(
            cache.clone(),
            stages.clone(),
            config.stage_pause,
        )),
        qa: Arc::new(QaPipeline::new(cache, stages)),
    };

    let router = server::router(state);
    let listener = TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, model = %config.model_name, "diagramsmith listening");
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to install shutdown handler");
    }
    tracing::info!("shutting down");
}
