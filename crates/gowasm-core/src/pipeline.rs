//! Pipeline orchestrator: format, compile, link, run.
//!
//! A [`Playground`] can only be obtained from a successful initialization,
//! so every operation on it runs against a fully loaded toolchain.
//!
//! Within one run the steps are strictly sequential and a nonzero exit
//! short-circuits the rest. Whatever happens after `Start` has been
//! emitted, exactly one `End` follows; no error escapes a run.

use std::sync::Arc;
use std::time::Instant;

use gowasm_transport::AssetSource;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::PlaygroundError;
use crate::executor::{ExecutionRequest, Executor};
use crate::layout::{self, Tool};
use crate::metrics::PipelineMetrics;
use crate::mux::OutputMultiplexer;
use crate::runtime::{ChunkSink, DiscardChunks, ModuleImage, ModuleRuntime};
use crate::sink::EventSink;
use crate::toolchain::Toolchain;
use crate::vfs::{FileStore, MemoryFs};

/// A pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Compile,
    Link,
    Run,
    Format,
}

impl StepKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StepKind::Compile => "compile",
            StepKind::Link => "link",
            StepKind::Run => "run",
            StepKind::Format => "format",
        }
    }
}

/// One attempted step of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepReport {
    pub step: StepKind,
    pub argv: Vec<String>,
    /// `None` when the module never reached an exit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    pub elapsed_ms: u128,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunOutcome {
    /// Compile, link and the program all exited 0.
    Succeeded,
    /// A step exited nonzero; later steps were skipped.
    StepFailed { step: StepKind, exit_code: i32 },
    /// A module could not run at all, or an artifact was missing.
    Infrastructure { step: StepKind, message: String },
}

impl RunOutcome {
    /// Summary carried by the `End` event.
    pub fn summary(&self) -> Option<String> {
        match self {
            RunOutcome::Succeeded => None,
            RunOutcome::StepFailed { exit_code, .. } => Some(format!("status {}.", exit_code)),
            RunOutcome::Infrastructure { message, .. } => Some(format!("wasm error: {}", message)),
        }
    }

    /// Exit code a host process should report for this run.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            RunOutcome::Succeeded => 0,
            RunOutcome::StepFailed { exit_code, .. } => *exit_code,
            RunOutcome::Infrastructure { .. } => 1,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Succeeded)
    }
}

/// Everything observed during one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub steps: Vec<StepReport>,
    pub outcome: RunOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub elapsed_ms: u128,
}

impl RunReport {
    pub fn step(&self, kind: StepKind) -> Option<&StepReport> {
        self.steps.iter().find(|s| s.step == kind)
    }
}

/// Result of a format pass. Failures are not errors: the source is simply
/// left as it was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatOutcome {
    Formatted(String),
    Unchanged,
}

impl FormatOutcome {
    pub fn canonical_text(&self) -> Option<&str> {
        match self {
            FormatOutcome::Formatted(text) => Some(text),
            FormatOutcome::Unchanged => None,
        }
    }

    pub fn into_canonical_text(self) -> Option<String> {
        match self {
            FormatOutcome::Formatted(text) => Some(text),
            FormatOutcome::Unchanged => None,
        }
    }
}

type StepError = (StepKind, PlaygroundError);

/// Initialized playground: loaded toolchain, store, executor.
pub struct Playground {
    toolchain: Arc<Toolchain>,
    executor: Executor,
    metrics: PipelineMetrics,
}

impl Playground {
    /// Load every asset into a fresh in-memory store.
    pub async fn initialize(
        source: &dyn AssetSource,
        runtime: Arc<dyn ModuleRuntime>,
    ) -> Result<Self, PlaygroundError> {
        Self::initialize_with_store(source, runtime, Arc::new(MemoryFs::new())).await
    }

    /// Load every asset into `fs`.
    pub async fn initialize_with_store(
        source: &dyn AssetSource,
        runtime: Arc<dyn ModuleRuntime>,
        fs: Arc<dyn FileStore>,
    ) -> Result<Self, PlaygroundError> {
        let toolchain = Toolchain::load(source, fs.as_ref()).await?;
        Ok(Self {
            toolchain: Arc::new(toolchain),
            executor: Executor::new(runtime, fs),
            metrics: PipelineMetrics::new(),
        })
    }

    pub fn toolchain(&self) -> &Toolchain {
        &self.toolchain
    }

    pub fn store(&self) -> &Arc<dyn FileStore> {
        self.executor.store()
    }

    pub fn metrics(&self) -> &PipelineMetrics {
        &self.metrics
    }

    /// Compile, link and run `source`, streaming events to `sink`.
    pub async fn run<S: EventSink>(&self, source: &str, sink: S) -> RunReport {
        self.write_source(source);
        self.run_written(sink).await
    }

    /// Format `source` with the formatter module.
    ///
    /// Returns the rewritten text when the formatter exits 0. A nonzero
    /// exit or a failure to run leaves nothing to report; formatter output
    /// is discarded.
    pub async fn format(&self, source: &str) -> FormatOutcome {
        self.write_source(source);
        let request = ExecutionRequest::new(
            self.toolchain.image(Tool::Gofmt).clone(),
            layout::format_args(),
        );

        let outcome = match self.executor.execute(request, &DiscardChunks).await {
            Ok(result) if result.success() => match self.store().read(layout::SOURCE_PATH) {
                Ok(bytes) => FormatOutcome::Formatted(String::from_utf8_lossy(&bytes).into_owned()),
                Err(err) => {
                    warn!(error = %err, "formatted source missing");
                    FormatOutcome::Unchanged
                }
            },
            Ok(result) => {
                debug!(exit_code = result.exit_code, "formatter rejected source");
                FormatOutcome::Unchanged
            }
            Err(err) => {
                warn!(error = %err, "formatter failed to run");
                FormatOutcome::Unchanged
            }
        };
        self.metrics
            .record_format(matches!(outcome, FormatOutcome::Formatted(_)));
        outcome
    }

    /// Run `source` and format it concurrently.
    ///
    /// Ordering: the run's write of the source and the compile step's
    /// filesystem snapshot both happen before the format pass writes
    /// anything, because the run future is polled first and reaches the
    /// compile instance without suspending. The formatter's rewrite is
    /// committed when it exits and is never seen by that compile.
    pub async fn run_and_format<S: EventSink>(
        &self,
        source: &str,
        sink: S,
    ) -> (RunReport, FormatOutcome) {
        self.write_source(source);
        let run = self.run_written(sink);
        let format = self.format(source);
        futures::future::join(run, format).await
    }

    fn write_source(&self, source: &str) {
        self.store()
            .write(layout::SOURCE_PATH, source.as_bytes().to_vec());
    }

    async fn run_written<S: EventSink>(&self, sink: S) -> RunReport {
        let started = Instant::now();
        self.metrics.record_run_started();

        let mux = OutputMultiplexer::new(sink);
        if let Err(err) = mux.emit_start() {
            warn!(error = %err, "run started on a used multiplexer");
        }

        let mut steps = Vec::new();
        let outcome = match self.drive(&mux, &mut steps).await {
            Ok(outcome) => outcome,
            Err((step, err)) => RunOutcome::Infrastructure {
                step,
                message: err.to_string(),
            },
        };

        match &outcome {
            RunOutcome::Succeeded => self.metrics.record_run_succeeded(),
            RunOutcome::StepFailed { step, exit_code } => {
                debug!(step = step.as_str(), exit_code, "step failed");
                self.metrics.record_step_failure();
            }
            RunOutcome::Infrastructure { step, message } => {
                warn!(step = step.as_str(), %message, "run aborted");
                self.metrics.record_infra_failure();
            }
        }

        let summary = outcome.summary();
        if let Err(err) = mux.emit_end(summary.clone()) {
            warn!(error = %err, "end already emitted");
        }

        RunReport {
            steps,
            outcome,
            summary,
            elapsed_ms: started.elapsed().as_millis(),
        }
    }

    async fn drive(
        &self,
        output: &dyn ChunkSink,
        steps: &mut Vec<StepReport>,
    ) -> Result<RunOutcome, StepError> {
        for (kind, tool, args) in [
            (StepKind::Compile, Tool::Compile, layout::compile_args()),
            (StepKind::Link, Tool::Link, layout::link_args()),
        ] {
            let image = self.toolchain.image(tool).clone();
            let exit_code = self.step(kind, image, args, output, steps).await?;
            if exit_code != 0 {
                return Ok(RunOutcome::StepFailed {
                    step: kind,
                    exit_code,
                });
            }
        }

        let program = match self.store().read(layout::OUTPUT_PATH) {
            Ok(bytes) => bytes,
            Err(err) => {
                steps.push(StepReport {
                    step: StepKind::Run,
                    argv: vec![layout::PROGRAM_NAME.to_string()],
                    exit_code: None,
                    elapsed_ms: 0,
                    error: Some(err.to_string()),
                });
                return Err((StepKind::Run, err.into()));
            }
        };
        let image = ModuleImage::new(layout::PROGRAM_NAME, program);
        let exit_code = self
            .step(StepKind::Run, image, Vec::new(), output, steps)
            .await?;

        Ok(if exit_code == 0 {
            RunOutcome::Succeeded
        } else {
            RunOutcome::StepFailed {
                step: StepKind::Run,
                exit_code,
            }
        })
    }

    async fn step(
        &self,
        kind: StepKind,
        image: ModuleImage,
        args: Vec<String>,
        output: &dyn ChunkSink,
        steps: &mut Vec<StepReport>,
    ) -> Result<i32, StepError> {
        let request = ExecutionRequest::new(image, args);
        let argv = request.argv.clone();
        let started = Instant::now();

        match self.executor.execute(request, output).await {
            Ok(result) => {
                steps.push(StepReport {
                    step: kind,
                    argv,
                    exit_code: Some(result.exit_code),
                    elapsed_ms: result.elapsed_ms,
                    error: None,
                });
                Ok(result.exit_code)
            }
            Err(err) => {
                steps.push(StepReport {
                    step: kind,
                    argv,
                    exit_code: None,
                    elapsed_ms: started.elapsed().as_millis(),
                    error: Some(err.to_string()),
                });
                Err((kind, err))
            }
        }
    }
}
