//! Renderer contract: what a markup surface does with each event.
//!
//! `Stdout`/`Stderr` bodies arrive already shaped by the multiplexer
//! (escaped, with in-band image and clear markers), so they are inserted
//! as they are. The `End` summary is plain text and is shaped here.

use gowasm_types::OutputEvent;
use parking_lot::Mutex;

use crate::mux::{shape_chunk, Payload};
use crate::sink::EventSink;

const IMAGE_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// CSS class of a rendered span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanClass {
    Stdout,
    Stderr,
    System,
}

impl SpanClass {
    pub fn as_str(self) -> &'static str {
        match self {
            SpanClass::Stdout => "stdout",
            SpanClass::Stderr => "stderr",
            SpanClass::System => "system",
        }
    }
}

/// One operation on the output surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayOp {
    /// Drop everything shown so far.
    Clear,
    /// Append escaped text.
    Span { class: SpanClass, markup: String },
    /// Append an inline image.
    Image { src: String },
}

/// Operations that render `event`.
pub fn display_ops(event: &OutputEvent) -> Vec<DisplayOp> {
    match event {
        OutputEvent::Start => vec![DisplayOp::Clear],
        OutputEvent::Stdout(body) => payload_ops(SpanClass::Stdout, body),
        OutputEvent::Stderr(body) => payload_ops(SpanClass::Stderr, body),
        OutputEvent::End(summary) => {
            let text = match summary {
                Some(summary) => format!("\nProgram exited: {}", summary),
                None => "\nProgram exited.".to_string(),
            };
            payload_ops(SpanClass::System, &shape_chunk(&text))
        }
    }
}

fn payload_ops(class: SpanClass, body: &str) -> Vec<DisplayOp> {
    match Payload::of(body) {
        Payload::Image(data) => vec![DisplayOp::Image {
            src: format!("{}{}", IMAGE_DATA_URL_PREFIX, data),
        }],
        Payload::Text { clear, markup } => {
            let span = DisplayOp::Span {
                class,
                markup: markup.to_string(),
            };
            if clear {
                vec![DisplayOp::Clear, span]
            } else {
                vec![span]
            }
        }
    }
}

/// Markup buffer standing in for the output element of a page.
#[derive(Debug, Default)]
pub struct HtmlTranscript {
    markup: Mutex<String>,
}

impl HtmlTranscript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&self, op: &DisplayOp) {
        let mut markup = self.markup.lock();
        match op {
            DisplayOp::Clear => markup.clear(),
            DisplayOp::Span { class, markup: text } => {
                markup.push_str(&format!(
                    "<span class=\"{}\">{}</span>",
                    class.as_str(),
                    text
                ));
            }
            DisplayOp::Image { src } => {
                markup.push_str(&format!("<img src=\"{}\">", src));
            }
        }
    }

    /// Current markup.
    pub fn markup(&self) -> String {
        self.markup.lock().clone()
    }
}

impl EventSink for HtmlTranscript {
    fn send(&self, event: OutputEvent) {
        for op in display_ops(&event) {
            self.apply(&op);
        }
    }
}
