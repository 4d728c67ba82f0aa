//! Output multiplexer: raw stream chunks in, ordered [`OutputEvent`]s out.
//!
//! The multiplexer enforces the event protocol of one run: `Start` once,
//! then text events in arrival order, then `End` once. Byte chunks are
//! decoded as UTF-8 per stream; a multi-byte sequence split across two
//! chunks is held back until the rest arrives.
//!
//! Every decoded chunk is shaped before it is sent, so `Stdout`/`Stderr`
//! bodies are safe for direct markup insertion. A body is one of:
//! - `IMAGE:<base64 png>`: passed through untouched
//! - [`CLEAR_MARKER`] followed by escaped text: clear the screen, then show
//!   the text (only the text after the last form feed of the chunk survives)
//! - escaped text
//!
//! [`Payload::of`] reads a body back into those cases.

use gowasm_types::{OutputEvent, Stream};
use parking_lot::Mutex;
use tracing::warn;

use crate::error::PlaygroundError;
use crate::runtime::ChunkSink;
use crate::sink::EventSink;

/// Prefix marking a base64 PNG payload.
pub const IMAGE_MARKER: &str = "IMAGE:";
/// Form feed: clears the screen.
pub const CLEAR_MARKER: char = '\x0c';

/// Escape `&`, `<` and `>`, in that order.
pub fn escape_markup(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Inverse of [`escape_markup`], for plain-text consumers.
pub fn unescape_markup(markup: &str) -> String {
    markup
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Shape one decoded chunk into an event body.
///
/// The image check runs on the raw text, before clear handling and
/// escaping.
pub fn shape_chunk(text: &str) -> String {
    if text.starts_with(IMAGE_MARKER) {
        return text.to_string();
    }
    match text.rsplit_once(CLEAR_MARKER) {
        Some((_, after)) => format!("{}{}", CLEAR_MARKER, escape_markup(after)),
        None => escape_markup(text),
    }
}

/// A shaped `Stdout`/`Stderr` body, read back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload<'a> {
    /// Base64 PNG data (marker stripped).
    Image(&'a str),
    /// Escaped text, optionally preceded by a screen clear.
    Text { clear: bool, markup: &'a str },
}

impl<'a> Payload<'a> {
    pub fn of(body: &'a str) -> Self {
        if let Some(data) = body.strip_prefix(IMAGE_MARKER) {
            return Payload::Image(data);
        }
        match body.strip_prefix(CLEAR_MARKER) {
            Some(markup) => Payload::Text {
                clear: true,
                markup,
            },
            None => Payload::Text {
                clear: false,
                markup: body,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Streaming,
    Ended,
}

struct State {
    phase: Phase,
    pending: [Vec<u8>; 2],
}

/// Turns the chunks of one run into events for an [`EventSink`].
pub struct OutputMultiplexer<S: EventSink> {
    sink: S,
    state: Mutex<State>,
}

/// Decode `chunk` appended to `pending`, leaving an incomplete trailing
/// sequence in `pending`. Invalid bytes become U+FFFD.
fn decode_chunk(pending: &mut Vec<u8>, chunk: &[u8]) -> String {
    pending.extend_from_slice(chunk);
    let mut text = String::new();
    let mut rest: &[u8] = &pending[..];
    loop {
        match std::str::from_utf8(rest) {
            Ok(valid) => {
                text.push_str(valid);
                rest = &[];
                break;
            }
            Err(err) => {
                let (valid, after) = rest.split_at(err.valid_up_to());
                text.push_str(&String::from_utf8_lossy(valid));
                match err.error_len() {
                    Some(len) => {
                        text.push(char::REPLACEMENT_CHARACTER);
                        rest = &after[len..];
                    }
                    None => {
                        rest = after;
                        break;
                    }
                }
            }
        }
    }
    *pending = rest.to_vec();
    text
}

impl<S: EventSink> OutputMultiplexer<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            state: Mutex::new(State {
                phase: Phase::Idle,
                pending: [Vec::new(), Vec::new()],
            }),
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// True once `End` has been delivered.
    pub fn is_ended(&self) -> bool {
        self.state.lock().phase == Phase::Ended
    }

    /// Deliver `Start`. Valid exactly once, before anything else.
    pub fn emit_start(&self) -> Result<(), PlaygroundError> {
        let mut state = self.state.lock();
        match state.phase {
            Phase::Idle => {
                state.phase = Phase::Streaming;
                self.sink.send(OutputEvent::Start);
                Ok(())
            }
            Phase::Streaming => Err(PlaygroundError::lifecycle("start emitted twice")),
            Phase::Ended => Err(PlaygroundError::lifecycle("start emitted after end")),
        }
    }

    /// Deliver the decodable part of a raw chunk.
    pub fn emit(&self, chunk: &[u8], stream: Stream) -> Result<(), PlaygroundError> {
        let mut state = self.state.lock();
        match state.phase {
            Phase::Streaming => {}
            Phase::Idle => return Err(PlaygroundError::lifecycle("output emitted before start")),
            Phase::Ended => return Err(PlaygroundError::lifecycle("output emitted after end")),
        }
        let text = decode_chunk(&mut state.pending[stream.index()], chunk);
        if !text.is_empty() {
            self.sink.send(OutputEvent::text(stream, shape_chunk(&text)));
        }
        Ok(())
    }

    /// Deliver `End`, flushing any held-back bytes first. Valid exactly once,
    /// after `Start`.
    pub fn emit_end(&self, summary: Option<String>) -> Result<(), PlaygroundError> {
        let mut state = self.state.lock();
        match state.phase {
            Phase::Streaming => {}
            Phase::Idle => return Err(PlaygroundError::lifecycle("end emitted before start")),
            Phase::Ended => return Err(PlaygroundError::lifecycle("end emitted twice")),
        }
        for stream in Stream::ALL {
            let pending = std::mem::take(&mut state.pending[stream.index()]);
            if !pending.is_empty() {
                let text = String::from_utf8_lossy(&pending);
                self.sink.send(OutputEvent::text(stream, shape_chunk(&text)));
            }
        }
        state.phase = Phase::Ended;
        self.sink.send(OutputEvent::End(summary));
        Ok(())
    }
}

impl<S: EventSink> ChunkSink for OutputMultiplexer<S> {
    fn write(&self, stream: Stream, chunk: &[u8]) {
        if let Err(err) = self.emit(chunk, stream) {
            warn!(%stream, len = chunk.len(), error = %err, "dropping output chunk");
        }
    }
}
