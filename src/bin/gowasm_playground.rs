//! gowasm-playground: run single-file Go programs on a WebAssembly toolchain
//!
//! The Go compiler, linker and formatter are loaded as WebAssembly modules
//! and executed in isolated instances through a WASI runner. The compiled
//! program runs the same way, and its output is streamed back as it runs.
//!
//! ## Example Usage
//!
//! ```bash
//! # Run a program with the default CDN assets and wasmtime
//! gowasm-playground run hello.go
//!
//! # Stream the output protocol as JSON Lines
//! gowasm-playground run hello.go --json
//!
//! # Use a local asset mirror and rewrite the file in canonical form
//! gowasm-playground --assets ./golang-wasm run hello.go --write-formatted
//!
//! # Print the formatted source
//! cat hello.go | gowasm-playground fmt -
//!
//! # Show the filesystem layout and import configs
//! gowasm-playground layout
//! ```

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use gowasm_playground::PlaygroundConfig;

mod playground_cli;

use playground_cli::{fmt::FmtCmd, layout::LayoutCmd, run::RunCmd};

#[derive(Parser)]
#[command(
    name = "gowasm-playground",
    author,
    version,
    about = "Format, compile, link and run Go programs on a WebAssembly toolchain",
    long_about = "Runs single-file Go programs with the Go toolchain compiled to WebAssembly.\n\n\
                  Every compile, link, format and program run is an isolated module instance \
                  sharing one in-memory filesystem."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Toolchain asset base URL or local directory (env: GOWASM_ASSETS)
    #[arg(long, global = true)]
    assets: Option<String>,

    /// WASI runner program (env: GOWASM_RUNNER, default: wasmtime)
    #[arg(long, global = true)]
    runner: Option<String>,

    /// Runner argument; repeatable. `{root}` and `{module}` are expanded
    #[arg(long = "runner-arg", global = true, allow_hyphen_values = true)]
    runner_args: Vec<String>,

    /// Pass module binaries to the runner without inspecting them first
    /// (env: GOWASM_SKIP_MODULE_CHECK)
    #[arg(long, global = true)]
    skip_module_check: bool,

    /// Verbose output (debug logs and step timings on stderr)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile, link and run a Go source file
    Run(RunCmd),

    /// Print the canonically formatted source
    Fmt(FmtCmd),

    /// Show the virtual filesystem layout and import configs
    Layout(LayoutCmd),
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "warn,gowasm_playground=debug,gowasm_core=debug,gowasm_transport=debug"
    } else {
        "warn"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let Cli {
        command,
        assets,
        runner,
        runner_args,
        skip_module_check,
        verbose,
    } = Cli::parse();
    init_tracing(verbose);

    let config = PlaygroundConfig::from_env()
        .with_assets(assets.as_deref())
        .with_runner(runner.as_deref(), &runner_args)
        .with_module_check_skipped(skip_module_check);

    let code = match command {
        Commands::Run(cmd) => cmd.execute(&config, verbose).await?,
        Commands::Fmt(cmd) => cmd.execute(&config).await?,
        Commands::Layout(cmd) => cmd.execute()?,
    };

    Ok(ExitCode::from(u8::try_from(code).unwrap_or(1)))
}
