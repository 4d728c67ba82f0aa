//! [`ModuleRuntime`] backed by an external WASI runner process.
//!
//! Each instance gets its own scratch directory: the filesystem snapshot is
//! materialized under `<scratch>/root`, the module binary is written next
//! to it, and the runner is started with that root mounted as `/`. When the
//! runner exits the root is read back so the executor can commit changes.
//!
//! Module binaries are inspected with [`check_module`] before the runner is
//! spawned, so a binary the runner cannot load fails as an instantiation
//! error rather than as a runner exit status.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use gowasm_types::Stream;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::debug;

use crate::error::PlaygroundError;
use crate::module_check::check_module;
use crate::runtime::{ChunkSink, InstanceExit, ModuleImage, ModuleRuntime};
use crate::vfs::FsSnapshot;

/// Placeholder replaced by the materialized filesystem root.
pub const ROOT_PLACEHOLDER: &str = "{root}";
/// Placeholder replaced by the module binary path.
pub const MODULE_PLACEHOLDER: &str = "{module}";

const READ_CHUNK: usize = 8 * 1024;

/// Runner command line. Module arguments (argv without argv[0]) are
/// appended after the templated arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl RunnerCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// `wasmtime run --dir <root>::/ <module>`
    pub fn wasmtime() -> Self {
        Self::new(
            "wasmtime",
            vec![
                "run".to_string(),
                "--dir".to_string(),
                format!("{}::/", ROOT_PLACEHOLDER),
                MODULE_PLACEHOLDER.to_string(),
            ],
        )
    }

    /// Expand placeholders and append module arguments.
    pub fn expand(&self, root: &Path, module: &Path, module_args: &[String]) -> Vec<String> {
        let root = root.display().to_string();
        let module = module.display().to_string();
        self.args
            .iter()
            .map(|arg| {
                arg.replace(ROOT_PLACEHOLDER, &root)
                    .replace(MODULE_PLACEHOLDER, &module)
            })
            .chain(module_args.iter().cloned())
            .collect()
    }
}

impl Default for RunnerCommand {
    fn default() -> Self {
        Self::wasmtime()
    }
}

/// Runs every module instance as a child process of a WASI runner.
#[derive(Debug, Clone, Default)]
pub struct CommandRuntime {
    runner: RunnerCommand,
    scratch_parent: Option<PathBuf>,
    skip_module_check: bool,
}

impl CommandRuntime {
    pub fn new(runner: RunnerCommand) -> Self {
        Self {
            runner,
            scratch_parent: None,
            skip_module_check: false,
        }
    }

    /// Hand binaries to the runner without inspecting them first.
    pub fn without_module_check(mut self) -> Self {
        self.skip_module_check = true;
        self
    }

    pub fn checks_modules(&self) -> bool {
        !self.skip_module_check
    }

    /// Create scratch directories under `dir` instead of the system temp dir.
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_parent = Some(dir.into());
        self
    }

    pub fn runner(&self) -> &RunnerCommand {
        &self.runner
    }

    fn scratch(&self) -> std::io::Result<tempfile::TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("gowasm-");
        match &self.scratch_parent {
            Some(parent) => builder.tempdir_in(parent),
            None => builder.tempdir(),
        }
    }
}

/// Write every snapshot file below `root`.
pub fn materialize(fs: &FsSnapshot, root: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(root)?;
    for (path, bytes) in fs.iter() {
        let target = root.join(path.trim_start_matches('/'));
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&target, bytes)?;
    }
    Ok(())
}

/// Read every regular file below `root` back as `(virtual path, bytes)`.
pub fn collect_files(root: &Path) -> std::io::Result<Vec<(String, Vec<u8>)>> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                pending.push(path);
            } else if file_type.is_file() {
                let Ok(relative) = path.strip_prefix(root) else {
                    continue;
                };
                let virtual_path = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect::<Vec<_>>()
                    .join("/");
                files.push((format!("/{}", virtual_path), std::fs::read(&path)?));
            }
        }
    }
    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files)
}

async fn pump<R>(mut reader: R, stream: Stream, output: &dyn ChunkSink) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; READ_CHUNK];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        output.write(stream, &buf[..n]);
    }
}

#[async_trait]
impl ModuleRuntime for CommandRuntime {
    async fn run_module(
        &self,
        image: &ModuleImage,
        argv: &[String],
        fs: &FsSnapshot,
        output: &dyn ChunkSink,
    ) -> Result<InstanceExit, PlaygroundError> {
        let module = image.name().to_string();
        let fail = |reason: String| PlaygroundError::instantiate(module.clone(), reason);

        if !self.skip_module_check {
            check_module(image)?;
        }

        let scratch = self
            .scratch()
            .map_err(|e| fail(format!("failed to create scratch directory: {}", e)))?;
        let root = scratch.path().join("root");
        let module_path = scratch.path().join("module.wasm");

        materialize(fs, &root)
            .map_err(|e| fail(format!("failed to materialize filesystem: {}", e)))?;
        std::fs::write(&module_path, image.bytes())
            .map_err(|e| fail(format!("failed to write module binary: {}", e)))?;

        let module_args = argv.get(1..).unwrap_or(&[]);
        let args = self.runner.expand(&root, &module_path, module_args);
        debug!(module = %module, program = %self.runner.program, ?args, "spawning runner");

        let mut child = Command::new(&self.runner.program)
            .args(&args)
            .current_dir(&root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| fail(format!("failed to spawn {}: {}", self.runner.program, e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| fail("runner stdout unavailable".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| fail("runner stderr unavailable".to_string()))?;

        let (out_res, err_res) = tokio::join!(
            pump(stdout, Stream::Stdout, output),
            pump(stderr, Stream::Stderr, output)
        );
        out_res.map_err(|e| fail(format!("failed to read stdout: {}", e)))?;
        err_res.map_err(|e| fail(format!("failed to read stderr: {}", e)))?;

        let status = child
            .wait()
            .await
            .map_err(|e| fail(format!("failed to wait for runner: {}", e)))?;
        let exit_code = status
            .code()
            .ok_or_else(|| fail("terminated by signal".to_string()))?;

        let files =
            collect_files(&root).map_err(|e| fail(format!("failed to read back files: {}", e)))?;
        Ok(InstanceExit::new(exit_code, files))
    }
}
