//! Output event protocol shared by the pipeline and its consumers.

use serde::{Deserialize, Serialize};

/// Process stream a raw output chunk was written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stream {
    Stdout,
    Stderr,
}

impl Stream {
    /// Both streams, in file-descriptor order.
    pub const ALL: [Stream; 2] = [Stream::Stdout, Stream::Stderr];

    /// Index usable for per-stream state arrays.
    pub fn index(self) -> usize {
        match self {
            Stream::Stdout => 0,
            Stream::Stderr => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stream::Stdout => "stdout",
            Stream::Stderr => "stderr",
        }
    }
}

impl std::fmt::Display for Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observable moment of a pipeline run.
///
/// A run produces exactly one `Start`, then any number of `Stdout`/`Stderr`
/// events in the order the running modules produced them, then exactly one
/// `End`. Serialized as `{"Kind": "stdout", "Body": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "Kind", content = "Body", rename_all = "lowercase")]
pub enum OutputEvent {
    Start,
    Stdout(String),
    Stderr(String),
    /// Terminal event. `None` means the program exited cleanly.
    End(Option<String>),
}

impl OutputEvent {
    /// Build a text event for the given stream.
    pub fn text(stream: Stream, body: impl Into<String>) -> Self {
        match stream {
            Stream::Stdout => OutputEvent::Stdout(body.into()),
            Stream::Stderr => OutputEvent::Stderr(body.into()),
        }
    }

    /// Lowercase kind tag (`start`, `stdout`, `stderr`, `end`).
    pub fn kind(&self) -> &'static str {
        match self {
            OutputEvent::Start => "start",
            OutputEvent::Stdout(_) => "stdout",
            OutputEvent::Stderr(_) => "stderr",
            OutputEvent::End(_) => "end",
        }
    }

    /// Text body, if the event carries one.
    pub fn body(&self) -> Option<&str> {
        match self {
            OutputEvent::Start => None,
            OutputEvent::Stdout(body) | OutputEvent::Stderr(body) => Some(body),
            OutputEvent::End(summary) => summary.as_deref(),
        }
    }

    pub fn is_end(&self) -> bool {
        matches!(self, OutputEvent::End(_))
    }
}
