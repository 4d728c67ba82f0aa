//! Sandboxed module executor.
//!
//! One [`Executor::execute`] call models one OS process: a fresh instance is
//! created through the [`ModuleRuntime`], sees the filesystem as it was at
//! dispatch, streams output as it runs, and commits the files it changed
//! when it exits.

use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use crate::error::PlaygroundError;
use crate::runtime::{ChunkSink, ModuleImage, ModuleRuntime};
use crate::vfs::FileStore;

/// One module invocation. Built fresh per step.
#[derive(Debug, Clone)]
pub struct ExecutionRequest {
    pub image: ModuleImage,
    /// Full argv; `argv[0]` is the module name.
    pub argv: Vec<String>,
}

impl ExecutionRequest {
    /// Request with `argv[0]` set to the module name followed by `args`.
    pub fn new(image: ModuleImage, args: Vec<String>) -> Self {
        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push(image.name().to_string());
        argv.extend(args);
        Self { image, argv }
    }

    pub fn args(&self) -> &[String] {
        self.argv.get(1..).unwrap_or(&[])
    }
}

/// Observed at completion; side effects happened during execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionResult {
    pub exit_code: i32,
    pub elapsed_ms: u128,
}

impl ExecutionResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs module instances against a shared store.
#[derive(Clone)]
pub struct Executor {
    runtime: Arc<dyn ModuleRuntime>,
    fs: Arc<dyn FileStore>,
}

impl Executor {
    pub fn new(runtime: Arc<dyn ModuleRuntime>, fs: Arc<dyn FileStore>) -> Self {
        Self { runtime, fs }
    }

    pub fn store(&self) -> &Arc<dyn FileStore> {
        &self.fs
    }

    /// Run one module to completion.
    ///
    /// The filesystem snapshot is taken before the first suspension point,
    /// so anything written to the store after this future is first polled
    /// is invisible to the instance. Files are committed only on a normal
    /// exit (zero or nonzero).
    pub async fn execute(
        &self,
        request: ExecutionRequest,
        output: &dyn ChunkSink,
    ) -> Result<ExecutionResult, PlaygroundError> {
        let snapshot = self.fs.snapshot();
        let started = Instant::now();
        debug!(
            module = request.image.name(),
            args = ?request.args(),
            files = snapshot.len(),
            "executing module"
        );

        let exit = self
            .runtime
            .run_module(&request.image, &request.argv, &snapshot, output)
            .await?;

        let changed = snapshot.changes(exit.files);
        debug!(
            module = request.image.name(),
            exit_code = exit.exit_code,
            changed = changed.len(),
            "module exited"
        );
        self.fs.commit(changed);

        Ok(ExecutionResult {
            exit_code: exit.exit_code,
            elapsed_ms: started.elapsed().as_millis(),
        })
    }
}
