//! Progress reporting for pipeline runs.
//!
//! A pipeline communicates with the outside world exclusively through
//! [`ProgressEvent`] values pushed into a [`ProgressSink`]. The sink
//! implementations mirror the usual deployment shapes: a channel feeding an
//! SSE response, an in-memory buffer for tests, and a discard sink for
//! callers that only want the accumulated result.

mod event;
mod sink;

pub use event::{Phase, ProgressEvent};
pub use sink::{ChannelSink, DiscardSink, MemorySink, ProgressSink, SinkError};
