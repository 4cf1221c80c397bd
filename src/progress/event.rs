use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// One phase of the generation pipeline.
///
/// Phases run strictly in declaration order; each phase's accumulated output
/// feeds the next one. [`Phase::Answer`] is the single phase used by the
/// question-answering pipeline.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Phase {
    Explanation,
    Mapping,
    Diagram,
    Answer,
}

impl Phase {
    /// Stable wire label, used as the status code prefix for chunk events.
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Explanation => "explanation",
            Phase::Mapping => "mapping",
            Phase::Diagram => "diagram",
            Phase::Answer => "answer",
        }
    }

    /// Status message emitted right before the backend request is sent.
    pub fn sent_message(&self) -> &'static str {
        match self {
            Phase::Explanation => "Sending explanation request to the model backend...",
            Phase::Mapping => "Sending component mapping request to the model backend...",
            Phase::Diagram => "Sending diagram generation request to the model backend...",
            Phase::Answer => "Sending question to the model backend...",
        }
    }

    /// Status message emitted while the phase is streaming.
    pub fn working_message(&self) -> &'static str {
        match self {
            Phase::Explanation => "Analyzing repository structure...",
            Phase::Mapping => "Creating component mapping...",
            Phase::Diagram => "Generating diagram...",
            Phase::Answer => "Answering question...",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Externally observable pipeline state, delivered in strict temporal order.
///
/// The wire encoding (see [`ProgressEvent::to_json_value`]) is a flat JSON
/// object per event:
///
/// ```json
/// {"status": "started", "message": "Starting generation process..."}
/// {"status": "explanation_chunk", "chunk": "The repo..."}
/// {"status": "complete", "diagram": "...", "explanation": "...", "mapping": "..."}
/// {"error": "Invalid or unclear instructions provided"}
/// ```
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Phase/status transition with a human-readable message.
    Status { status: String, message: String },
    /// One incremental text fragment from the model backend.
    Chunk { phase: Phase, chunk: String },
    /// Terminal success event carrying the final artifacts.
    Complete {
        diagram: String,
        explanation: String,
        mapping: String,
    },
    /// Terminal failure event. Exactly one is emitted per failed run.
    Error { message: String },
}

impl ProgressEvent {
    pub fn status(status: impl Into<String>, message: impl Into<String>) -> Self {
        ProgressEvent::Status {
            status: status.into(),
            message: message.into(),
        }
    }

    /// The `<phase>_sent` status announcing an imminent backend request.
    pub fn phase_sent(phase: Phase) -> Self {
        Self::status(format!("{}_sent", phase.label()), phase.sent_message())
    }

    /// The `<phase>` status announcing that streaming has begun.
    pub fn phase_started(phase: Phase) -> Self {
        Self::status(phase.label(), phase.working_message())
    }

    pub fn chunk(phase: Phase, chunk: impl Into<String>) -> Self {
        ProgressEvent::Chunk {
            phase,
            chunk: chunk.into(),
        }
    }

    pub fn complete(
        diagram: impl Into<String>,
        explanation: impl Into<String>,
        mapping: impl Into<String>,
    ) -> Self {
        ProgressEvent::Complete {
            diagram: diagram.into(),
            explanation: explanation.into(),
            mapping: mapping.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ProgressEvent::Error {
            message: message.into(),
        }
    }

    /// True for the two terminal variants after which no further events follow.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProgressEvent::Complete { .. } | ProgressEvent::Error { .. }
        )
    }

    /// Convert the event to its wire payload.
    ///
    /// # Example
    ///
    /// ```
    /// use diagramsmith::progress::{Phase, ProgressEvent};
    ///
    /// let event = ProgressEvent::chunk(Phase::Explanation, "hello");
    /// let json = event.to_json_value();
    /// assert_eq!(json["status"], "explanation_chunk");
    /// assert_eq!(json["chunk"], "hello");
    /// ```
    pub fn to_json_value(&self) -> Value {
        match self {
            ProgressEvent::Status { status, message } => json!({
                "status": status,
                "message": message,
            }),
            ProgressEvent::Chunk { phase, chunk } => json!({
                "status": format!("{}_chunk", phase.label()),
                "chunk": chunk,
            }),
            ProgressEvent::Complete {
                diagram,
                explanation,
                mapping,
            } => json!({
                "status": "complete",
                "diagram": diagram,
                "explanation": explanation,
                "mapping": mapping,
            }),
            ProgressEvent::Error { message } => json!({
                "error": message,
            }),
        }
    }

    /// Compact JSON string form of the wire payload.
    pub fn to_json_string(&self) -> String {
        self.to_json_value().to_string()
    }
}

// Display is used by log lines, not the wire; keep it one-line and terse.
impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressEvent::Status { status, message } => write!(f, "[{status}] {message}"),
            ProgressEvent::Chunk { phase, chunk } => {
                write!(f, "[{phase}] {} bytes", chunk.len())
            }
            ProgressEvent::Complete { .. } => write!(f, "[complete]"),
            ProgressEvent::Error { message } => write!(f, "[error] {message}"),
        }
    }
}
