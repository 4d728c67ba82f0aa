//! Output sinks and formatting for the gowasm-playground CLI

use std::io::Write;

use gowasm_core::{unescape_markup, EventSink, OutputEvent, Payload, RunReport, CLEAR_MARKER};
use tracing::warn;

/// Streams program output straight to the terminal: stdout events to
/// stdout, everything else to stderr.
pub struct TerminalSink;

/// Plain text for a shaped body. A clear becomes a form feed; image
/// bodies are printed as they arrived.
pub fn terminal_text(body: &str) -> String {
    match Payload::of(body) {
        Payload::Image(_) => body.to_string(),
        Payload::Text { clear: true, markup } => {
            format!("{}{}", CLEAR_MARKER, unescape_markup(markup))
        }
        Payload::Text { clear: false, markup } => unescape_markup(markup),
    }
}

impl EventSink for TerminalSink {
    fn send(&self, event: OutputEvent) {
        let result = match &event {
            OutputEvent::Start => Ok(()),
            OutputEvent::Stdout(body) => {
                let mut out = std::io::stdout().lock();
                out.write_all(terminal_text(body).as_bytes())
                    .and_then(|_| out.flush())
            }
            OutputEvent::Stderr(body) => std::io::stderr()
                .lock()
                .write_all(terminal_text(body).as_bytes()),
            OutputEvent::End(summary) => {
                let line = match summary {
                    Some(summary) => format!("\nProgram exited: {}\n", summary),
                    None => "\nProgram exited.\n".to_string(),
                };
                std::io::stderr().lock().write_all(line.as_bytes())
            }
        };
        if let Err(err) = result {
            warn!(error = %err, kind = event.kind(), "failed to write output");
        }
    }
}

/// One JSON object per event on stdout.
pub struct JsonLinesSink;

impl EventSink for JsonLinesSink {
    fn send(&self, event: OutputEvent) {
        match serde_json::to_string(&event) {
            Ok(line) => {
                let mut out = std::io::stdout().lock();
                if let Err(err) = writeln!(out, "{}", line).and_then(|_| out.flush()) {
                    warn!(error = %err, "failed to write event");
                }
            }
            Err(err) => warn!(error = %err, "failed to encode event"),
        }
    }
}

/// Per-step timings for `--verbose`.
pub fn format_step_report(report: &RunReport) -> String {
    let mut out = String::new();
    for step in &report.steps {
        let status = match (step.exit_code, &step.error) {
            (_, Some(error)) => format!("error: {}", error),
            (Some(code), None) => format!("exit {}", code),
            (None, None) => "not run".to_string(),
        };
        out.push_str(&format!(
            "  {:<8} {:<24} {} ms\n",
            step.step.as_str(),
            status,
            step.elapsed_ms
        ));
    }
    out.push_str(&format!("  total    {} ms", report.elapsed_ms));
    out
}
