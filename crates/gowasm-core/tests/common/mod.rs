#![allow(dead_code)]
//! Shared test utilities for the pipeline integration tests.
//!
//! - `ScriptedRuntime`: a [`ModuleRuntime`] that fakes the toolchain modules
//! - `StaticAssets`: an in-memory [`AssetSource`] holding a complete asset set

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use gowasm_core::layout::{self, Tool, SUPPORT_ARCHIVES};
use gowasm_core::{
    ChunkSink, FsSnapshot, InstanceExit, ModuleImage, ModuleRuntime, Playground, PlaygroundError,
    Stream,
};
use gowasm_transport::AssetSource;
use parking_lot::Mutex;

/// Source text containing this marker fails to compile and to format.
pub const SYNTAX_ERROR: &str = "SYNTAX";
/// Source text containing this marker compiles but fails to link.
pub const LINK_ERROR: &str = "LINKFAIL";
/// Source text containing this marker links "successfully" without
/// producing `/a.out`.
pub const NO_LINK_OUTPUT: &str = "NOLINKOUT";

/// Fake toolchain.
///
/// Programs are line scripts: `stdout <text>` and `stderr <text>` print a
/// line, `exit <n>` stops with that code. The compiler and linker carry the
/// script through `main.a` into `a.out`; the formatter trims trailing
/// whitespace and drops blank lines.
#[derive(Default)]
pub struct ScriptedRuntime {
    /// Module whose instantiation fails.
    broken_module: Mutex<Option<String>>,
    /// Every `main.go` the compiler was handed, in order.
    compiled_sources: Mutex<Vec<String>>,
    /// Module names in start order.
    started: Mutex<Vec<String>>,
}

impl ScriptedRuntime {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn break_module(&self, name: &str) {
        *self.broken_module.lock() = Some(name.to_string());
    }

    pub fn compiled_sources(&self) -> Vec<String> {
        self.compiled_sources.lock().clone()
    }

    pub fn started(&self) -> Vec<String> {
        self.started.lock().clone()
    }
}

/// Canonical form produced by the fake formatter.
pub fn canonical(source: &str) -> String {
    let mut out = String::new();
    for line in source.lines().map(str::trim_end).filter(|l| !l.is_empty()) {
        out.push_str(line);
        out.push('\n');
    }
    out
}

fn contains(bytes: &[u8], marker: &str) -> bool {
    String::from_utf8_lossy(bytes).contains(marker)
}

fn text(fs: &BTreeMap<String, Vec<u8>>, path: &str) -> Option<String> {
    fs.get(path).map(|b| String::from_utf8_lossy(b).into_owned())
}

#[async_trait]
impl ModuleRuntime for ScriptedRuntime {
    async fn run_module(
        &self,
        image: &ModuleImage,
        argv: &[String],
        fs: &FsSnapshot,
        output: &dyn ChunkSink,
    ) -> Result<InstanceExit, PlaygroundError> {
        self.started.lock().push(image.name().to_string());
        if self.broken_module.lock().as_deref() == Some(image.name()) {
            return Err(PlaygroundError::instantiate(
                image.name(),
                "invalid magic number",
            ));
        }

        let mut files: BTreeMap<String, Vec<u8>> = fs
            .iter()
            .map(|(path, bytes)| (path.to_string(), bytes.to_vec()))
            .collect();

        // Let concurrently dispatched instances interleave with this one.
        tokio::task::yield_now().await;

        let exit_code = match image.name() {
            "compile" => {
                assert_eq!(argv[1..], layout::compile_args()[..]);
                let source = text(&files, layout::SOURCE_PATH).unwrap_or_default();
                self.compiled_sources.lock().push(source.clone());
                if source.contains(SYNTAX_ERROR) {
                    output.write(Stream::Stderr, b"./main.go:1:1: syntax error\n");
                    2
                } else {
                    files.insert(layout::OBJECT_PATH.to_string(), source.into_bytes());
                    0
                }
            }
            "link" => {
                assert_eq!(argv[1..], layout::link_args()[..]);
                match files.get(layout::OBJECT_PATH).cloned() {
                    Some(object) if contains(&object, LINK_ERROR) => {
                        output.write(Stream::Stderr, b"main.main: undefined: missing\n");
                        1
                    }
                    Some(object) if contains(&object, NO_LINK_OUTPUT) => 0,
                    Some(object) => {
                        files.insert(layout::OUTPUT_PATH.to_string(), object);
                        0
                    }
                    None => {
                        output.write(Stream::Stderr, b"link: main.a: not found\n");
                        1
                    }
                }
            }
            "gofmt" => {
                assert_eq!(argv[1..], layout::format_args()[..]);
                let source = text(&files, layout::SOURCE_PATH).unwrap_or_default();
                if source.contains(SYNTAX_ERROR) {
                    output.write(Stream::Stderr, b"main.go:1:1: expected 'package'\n");
                    2
                } else {
                    files.insert(layout::SOURCE_PATH.to_string(), canonical(&source).into_bytes());
                    0
                }
            }
            layout::PROGRAM_NAME => run_script(&String::from_utf8_lossy(image.bytes()), output),
            other => panic!("unexpected module {other}"),
        };

        Ok(InstanceExit::new(exit_code, files.into_iter().collect()))
    }
}

fn run_script(script: &str, output: &dyn ChunkSink) -> i32 {
    for line in script.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("stdout ") {
            output.write(Stream::Stdout, format!("{rest}\n").as_bytes());
        } else if let Some(rest) = line.strip_prefix("stderr ") {
            output.write(Stream::Stderr, format!("{rest}\n").as_bytes());
        } else if let Some(code) = line.strip_prefix("exit ") {
            return code.parse().unwrap_or(1);
        }
    }
    0
}

/// Complete, in-memory asset set.
pub struct StaticAssets {
    assets: HashMap<String, Vec<u8>>,
}

impl StaticAssets {
    pub fn complete() -> Self {
        let mut assets = HashMap::new();
        for tool in Tool::ALL {
            assets.insert(tool.asset_path(), format!("\0asm {}", tool.name()).into_bytes());
        }
        for archive in SUPPORT_ARCHIVES.iter() {
            assets.insert(
                archive.asset_path(),
                format!("!<arch> {}", archive.package).into_bytes(),
            );
        }
        Self { assets }
    }

    pub fn without(mut self, relative_path: &str) -> Self {
        self.assets.remove(relative_path);
        self
    }
}

#[async_trait]
impl AssetSource for StaticAssets {
    async fn fetch(&self, relative_path: &str) -> Result<Vec<u8>> {
        self.assets
            .get(relative_path)
            .cloned()
            .ok_or_else(|| anyhow!("404 Not Found"))
    }

    fn describe(&self) -> String {
        "static".to_string()
    }
}

/// Playground over the scripted runtime and a complete asset set.
pub async fn playground() -> (Playground, Arc<ScriptedRuntime>) {
    let runtime = ScriptedRuntime::new();
    let playground = Playground::initialize(&StaticAssets::complete(), runtime.clone())
        .await
        .expect("initialize playground");
    (playground, runtime)
}
