#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use diagramsmith::cache::RepoContextCache;
use diagramsmith::model::{FragmentStream, LanguageModelClient, ModelError};
use diagramsmith::pipeline::GenerationPipeline;
use diagramsmith::progress::{ProgressEvent, ProgressSink, SinkError};
use diagramsmith::qa::QaPipeline;
use diagramsmith::source::{RepositorySource, SourceError};
use diagramsmith::stage::StageRunner;

/// Model client that replays one scripted fragment sequence per call and
/// records every prompt it was given.
#[derive(Default)]
pub struct ScriptedModel {
    scripts: Mutex<VecDeque<Vec<String>>>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl ScriptedModel {
    pub fn new(scripts: &[&[&str]]) -> Arc<Self> {
        Arc::new(Self {
            scripts: Mutex::new(
                scripts
                    .iter()
                    .map(|script| script.iter().map(|s| (*s).to_owned()).collect())
                    .collect(),
            ),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl LanguageModelClient for ScriptedModel {
    async fn stream_complete(
        &self,
        prompt: &str,
        _api_key: Option<&str>,
    ) -> Result<FragmentStream, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().push(prompt.to_owned());
        let script = self.scripts.lock().pop_front().unwrap_or_default();
        Ok(Box::pin(futures_util::stream::iter(
            script.into_iter().map(Ok),
        )))
    }
}

/// Model client whose stream fails after an optional prefix of fragments.
pub struct FailingModel {
    pub prefix: Vec<String>,
}

#[async_trait]
impl LanguageModelClient for FailingModel {
    async fn stream_complete(
        &self,
        _prompt: &str,
        _api_key: Option<&str>,
    ) -> Result<FragmentStream, ModelError> {
        let items: Vec<Result<String, ModelError>> = self
            .prefix
            .iter()
            .cloned()
            .map(Ok)
            .chain(std::iter::once(Err(ModelError::Protocol(
                "backend hung up".into(),
            ))))
            .collect();
        Ok(Box::pin(futures_util::stream::iter(items)))
    }
}

/// Repository source answering from fixed strings, counting fetches.
pub struct StaticSource {
    pub branch: Option<String>,
    pub tree: String,
    pub readme: String,
    fetches: AtomicUsize,
}

impl StaticSource {
    pub fn new(branch: Option<&str>, tree: &str, readme: &str) -> Arc<Self> {
        Arc::new(Self {
            branch: branch.map(str::to_owned),
            tree: tree.to_owned(),
            readme: readme.to_owned(),
            fetches: AtomicUsize::new(0),
        })
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RepositorySource for StaticSource {
    async fn default_branch(
        &self,
        _owner: &str,
        _repo: &str,
        _token: Option<&str>,
    ) -> Result<Option<String>, SourceError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.branch.clone())
    }

    async fn file_tree(
        &self,
        _owner: &str,
        _repo: &str,
        _token: Option<&str>,
    ) -> Result<String, SourceError> {
        Ok(self.tree.clone())
    }

    async fn readme(
        &self,
        _owner: &str,
        _repo: &str,
        _token: Option<&str>,
    ) -> Result<String, SourceError> {
        Ok(self.readme.clone())
    }
}

/// Sink that accepts a fixed number of events, then reports the consumer
/// as disconnected.
pub struct ClosingSink {
    remaining: AtomicUsize,
    seen: Mutex<Vec<ProgressEvent>>,
}

impl ClosingSink {
    pub fn after(events: usize) -> Self {
        Self {
            remaining: AtomicUsize::new(events),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn seen(&self) -> Vec<ProgressEvent> {
        self.seen.lock().clone()
    }
}

impl ProgressSink for ClosingSink {
    fn emit(&self, event: ProgressEvent) -> Result<(), SinkError> {
        let remaining = self.remaining.load(Ordering::SeqCst);
        if remaining == 0 {
            return Err(SinkError::Disconnected);
        }
        self.remaining.store(remaining - 1, Ordering::SeqCst);
        self.seen.lock().push(event);
        Ok(())
    }
}

/// Fast-paced pipeline wired to the given fakes.
pub fn pipeline_with(
    source: Arc<StaticSource>,
    model: Arc<dyn LanguageModelClient>,
) -> GenerationPipeline {
    let cache = Arc::new(RepoContextCache::new(source, 100));
    let stages = StageRunner::new(model, Duration::from_secs(5));
    GenerationPipeline::new(cache, stages, Duration::from_millis(1))
}

/// Generation + QA pair sharing one cache, as the server wires them.
pub fn pipelines_with(
    source: Arc<StaticSource>,
    model: Arc<dyn LanguageModelClient>,
) -> (GenerationPipeline, QaPipeline) {
    let cache = Arc::new(RepoContextCache::new(source, 100));
    let stages = StageRunner::new(model, Duration::from_secs(5));
    (
        GenerationPipeline::new(cache.clone(), stages.clone(), Duration::from_millis(1)),
        QaPipeline::new(cache, stages),
    )
}
