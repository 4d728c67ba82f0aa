//! Playground configuration.
//!
//! Settings resolve in three layers: built-in defaults, `GOWASM_*`
//! environment variables, then explicit overrides (CLI flags).
//!
//! | Variable              | Meaning                                   |
//! |-----------------------|-------------------------------------------|
//! | `GOWASM_ASSETS`       | asset base URL or local directory         |
//! | `GOWASM_RUNNER`       | WASI runner program                       |
//! | `GOWASM_RUNNER_ARGS`  | runner arguments, comma separated         |
//! | `GOWASM_SCRATCH_DIR`  | parent directory for instance scratch dirs |
//! | `GOWASM_SKIP_MODULE_CHECK` | hand binaries to the runner uninspected |

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use gowasm_core::command_runtime::MODULE_PLACEHOLDER;
use gowasm_core::{CommandRuntime, Playground, RunnerCommand};
use gowasm_transport::AssetLocation;
use gowasm_types::EnvReader;
use tracing::debug;

/// How module instances are executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    pub command: RunnerCommand,
    pub scratch_dir: Option<PathBuf>,
    /// Inspect module binaries before spawning the runner.
    pub check_modules: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            command: RunnerCommand::wasmtime(),
            scratch_dir: None,
            check_modules: true,
        }
    }
}

impl RunnerConfig {
    pub fn build_runtime(&self) -> CommandRuntime {
        let mut runtime = CommandRuntime::new(self.command.clone());
        if let Some(dir) = &self.scratch_dir {
            runtime = runtime.with_scratch_dir(dir);
        }
        if !self.check_modules {
            runtime = runtime.without_module_check();
        }
        runtime
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaygroundConfig {
    pub assets: AssetLocation,
    pub runner: RunnerConfig,
}

impl PlaygroundConfig {
    /// Defaults overlaid with `GOWASM_*` variables.
    pub fn from_env() -> Self {
        Self::from_reader(&EnvReader::default())
    }

    pub fn from_reader(env: &EnvReader) -> Self {
        let mut config = Self::default();
        if let Some(assets) = env.string("ASSETS") {
            config.assets = AssetLocation::parse(&assets);
        }
        if let Some(program) = env.string("RUNNER") {
            // A custom runner without arguments gets only the module path.
            let args = env
                .list("RUNNER_ARGS")
                .unwrap_or_else(|| vec![MODULE_PLACEHOLDER.to_string()]);
            config.runner.command = RunnerCommand::new(program, args);
        } else if let Some(args) = env.list("RUNNER_ARGS") {
            config.runner.command.args = args;
        }
        if let Some(dir) = env.string("SCRATCH_DIR") {
            config.runner.scratch_dir = Some(PathBuf::from(dir));
        }
        if env.flag("SKIP_MODULE_CHECK") {
            config.runner.check_modules = false;
        }
        config
    }

    pub fn with_assets(mut self, assets: Option<&str>) -> Self {
        if let Some(assets) = assets {
            self.assets = AssetLocation::parse(assets);
        }
        self
    }

    /// Override the runner program and/or its arguments.
    pub fn with_runner(mut self, program: Option<&str>, args: &[String]) -> Self {
        if let Some(program) = program {
            self.runner.command.program = program.to_string();
            if args.is_empty() {
                self.runner.command.args = vec![MODULE_PLACEHOLDER.to_string()];
            }
        }
        if !args.is_empty() {
            self.runner.command.args = args.to_vec();
        }
        self
    }

    pub fn with_module_check_skipped(mut self, skip: bool) -> Self {
        if skip {
            self.runner.check_modules = false;
        }
        self
    }

    /// Load the toolchain and return a ready playground.
    pub async fn initialize(&self) -> Result<Playground> {
        debug!(
            assets = %self.assets,
            runner = %self.runner.command.program,
            "initializing playground"
        );
        let source = self.assets.clone().into_source();
        let runtime = Arc::new(self.runner.build_runtime());
        Playground::initialize(source.as_ref(), runtime)
            .await
            .with_context(|| format!("failed to initialize playground from {}", self.assets))
    }
}
