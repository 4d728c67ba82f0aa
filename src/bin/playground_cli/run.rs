//! Run command - compile, link and run a Go source file

use anyhow::Result;
use clap::Parser;
use tracing::info;

use super::output::{format_step_report, JsonLinesSink, TerminalSink};
use super::{read_source, write_back};
use gowasm_core::{EventSink, FormatOutcome, HtmlTranscript, Playground, RunReport};
use gowasm_playground::PlaygroundConfig;

#[derive(Parser, Debug)]
pub struct RunCmd {
    /// Go source file, or `-` for stdin
    pub file: String,

    /// Emit output events as JSON Lines instead of raw program output
    #[arg(long, conflicts_with = "html")]
    pub json: bool,

    /// Print the rendered HTML transcript when the run ends
    #[arg(long)]
    pub html: bool,

    /// Rewrite FILE with the formatted source
    #[arg(long)]
    pub write_formatted: bool,
}

impl RunCmd {
    /// Returns the process exit code: the program's, or 1 when a module
    /// could not run.
    pub async fn execute(&self, config: &PlaygroundConfig, verbose: bool) -> Result<i32> {
        let source = read_source(&self.file)?;
        let playground = config.initialize().await?;

        let (report, formatted) = if self.json {
            run(&playground, &source, JsonLinesSink).await
        } else if self.html {
            let transcript = HtmlTranscript::new();
            let result = run(&playground, &source, &transcript).await;
            println!("{}", transcript.markup());
            result
        } else {
            run(&playground, &source, TerminalSink).await
        };

        if self.write_formatted {
            if let FormatOutcome::Formatted(text) = &formatted {
                if write_back(&self.file, &source, text)? {
                    info!(file = %self.file, "rewrote source in canonical form");
                }
            }
        }

        if verbose {
            eprintln!("{}", format_step_report(&report));
            eprintln!("{}", playground.metrics().snapshot().format_report());
        }

        Ok(report.outcome.process_exit_code())
    }
}

async fn run<S: EventSink>(
    playground: &Playground,
    source: &str,
    sink: S,
) -> (RunReport, FormatOutcome) {
    playground.run_and_format(source, sink).await
}
