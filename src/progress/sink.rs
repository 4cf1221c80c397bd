use std::sync::Arc;

use miette::Diagnostic;
use parking_lot::Mutex;
use thiserror::Error;

use super::event::ProgressEvent;

/// Abstraction over a consumer of [`ProgressEvent`]s.
///
/// Sinks must be cheap to call from the pipeline's hot path: `emit` is
/// synchronous and non-blocking. A sink signals a dropped consumer through
/// [`SinkError::Disconnected`], which the pipeline treats as a request to
/// abandon all remaining work.
pub trait ProgressSink: Send + Sync {
    /// Deliver one event. Events must be observed in emission order.
    fn emit(&self, event: ProgressEvent) -> Result<(), SinkError>;
}

/// Errors that can occur when emitting a progress event.
#[derive(Debug, Error, Diagnostic)]
pub enum SinkError {
    /// The consuming side is gone (e.g. the HTTP client disconnected).
    #[error("progress consumer disconnected")]
    #[diagnostic(
        code(diagramsmith::progress::disconnected),
        help("The caller stopped listening; remaining pipeline phases are abandoned.")
    )]
    Disconnected,
}

/// Channel-backed sink for streaming to async consumers (e.g. SSE responses).
///
/// Events are forwarded over an unbounded `flume` channel; the receiving
/// side is typically turned into a response stream. Once the receiver is
/// dropped, every emit fails with [`SinkError::Disconnected`].
pub struct ChannelSink {
    tx: flume::Sender<ProgressEvent>,
}

impl ChannelSink {
    pub fn new(tx: flume::Sender<ProgressEvent>) -> Self {
        Self { tx }
    }

    /// Convenience constructor returning the sink together with its receiver.
    pub fn pair() -> (Self, flume::Receiver<ProgressEvent>) {
        let (tx, rx) = flume::unbounded();
        (Self::new(tx), rx)
    }
}

impl ProgressSink for ChannelSink {
    fn emit(&self, event: ProgressEvent) -> Result<(), SinkError> {
        self.tx.send(event).map_err(|_| SinkError::Disconnected)
    }
}

/// In-memory sink for tests and snapshots.
#[derive(Clone, Default)]
pub struct MemorySink {
    entries: Arc<Mutex<Vec<ProgressEvent>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all captured events, in emission order.
    pub fn snapshot(&self) -> Vec<ProgressEvent> {
        self.entries.lock().clone()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl ProgressSink for MemorySink {
    fn emit(&self, event: ProgressEvent) -> Result<(), SinkError> {
        self.entries.lock().push(event);
        Ok(())
    }
}

/// Sink that drops every event.
///
/// Used by the QA pipeline, which accumulates the answer itself and has no
/// streaming consumer.
#[derive(Clone, Copy, Debug, Default)]
pub struct DiscardSink;

impl ProgressSink for DiscardSink {
    fn emit(&self, _event: ProgressEvent) -> Result<(), SinkError> {
        Ok(())
    }
}
