//! Go playground pipeline over sandboxed WebAssembly toolchain modules.
//!
//! The crate wires together:
//! - [`vfs`]: the shared in-memory filesystem every module instance sees
//! - [`executor`]: runs one module instance with copy-in/copy-out file isolation
//! - [`mux`]: turns raw stdout/stderr chunks into the output event protocol
//! - [`pipeline`]: the format, compile, link and run orchestration
//!
//! Executing WebAssembly is delegated to a [`runtime::ModuleRuntime`];
//! [`command_runtime::CommandRuntime`] drives an external WASI runner.

pub mod command_runtime;
pub mod error;
pub mod executor;
pub mod layout;
pub mod metrics;
pub mod module_check;
pub mod mux;
pub mod pipeline;
pub mod render;
pub mod runtime;
pub mod sink;
pub mod toolchain;
pub mod vfs;

pub use command_runtime::{CommandRuntime, RunnerCommand};
pub use error::{PlaygroundError, VfsError};
pub use executor::{ExecutionRequest, ExecutionResult, Executor};
pub use metrics::{MetricsSnapshot, PipelineMetrics};
pub use module_check::check_module;
pub use mux::{
    escape_markup, shape_chunk, unescape_markup, OutputMultiplexer, Payload, CLEAR_MARKER,
    IMAGE_MARKER,
};
pub use pipeline::{FormatOutcome, Playground, RunOutcome, RunReport, StepKind, StepReport};
pub use render::{display_ops, DisplayOp, HtmlTranscript, SpanClass};
pub use runtime::{ChunkSink, DiscardChunks, InstanceExit, ModuleImage, ModuleRuntime};
pub use sink::{ChannelSink, EventLog, EventSink, FnSink};
pub use toolchain::Toolchain;
pub use vfs::{FileStore, FsSnapshot, MemoryFs};

pub use gowasm_types::{OutputEvent, Stream};
