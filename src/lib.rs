//! gowasm-playground
//!
//! Formats, compiles, links and runs single-file Go programs with the Go
//! toolchain built as WebAssembly modules:
//!
//! - [`gowasm_core`]: filesystem, executor, output protocol and pipeline
//! - [`gowasm_transport`]: where toolchain assets are loaded from
//! - [`gowasm_types`]: event wire types and environment helpers
//! - [`config`]: settings shared by the CLI and embedders

pub mod config;

pub use config::{PlaygroundConfig, RunnerConfig};
pub use gowasm_core;
pub use gowasm_transport;
pub use gowasm_types;
