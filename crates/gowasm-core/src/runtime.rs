//! Boundary to the WebAssembly interpreter.
//!
//! The pipeline never interprets module bytecode itself. A [`ModuleRuntime`]
//! turns one [`ModuleImage`] plus argv and a filesystem snapshot into a
//! finished process, forwarding output chunks through a [`ChunkSink`] as
//! they are produced.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use gowasm_types::Stream;

use crate::error::PlaygroundError;
use crate::vfs::FsSnapshot;

/// An immutable, preloaded module binary.
#[derive(Clone)]
pub struct ModuleImage {
    name: Arc<str>,
    bytes: Arc<[u8]>,
}

impl ModuleImage {
    pub fn new(name: impl Into<Arc<str>>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Logical module name (`compile`, `link`, `gofmt`, `a.out`).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for ModuleImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleImage")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Receives raw output chunks from a running module.
pub trait ChunkSink: Send + Sync {
    fn write(&self, stream: Stream, chunk: &[u8]);
}

/// Sink that drops every chunk (formatter output is never shown).
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardChunks;

impl ChunkSink for DiscardChunks {
    fn write(&self, _stream: Stream, _chunk: &[u8]) {}
}

/// What a module instance left behind when it exited normally.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstanceExit {
    pub exit_code: i32,
    /// Every file present when the instance exited. The executor commits
    /// only the ones that differ from the starting snapshot.
    pub files: Vec<(String, Vec<u8>)>,
}

impl InstanceExit {
    pub fn new(exit_code: i32, files: Vec<(String, Vec<u8>)>) -> Self {
        Self { exit_code, files }
    }
}

/// Runs module instances to completion.
///
/// Every call must create a fresh, isolated instance; implementations never
/// pool or reuse instances. A returned `Err` means the instance could not
/// run at all, which callers treat differently from a nonzero exit code.
#[async_trait]
pub trait ModuleRuntime: Send + Sync {
    async fn run_module(
        &self,
        image: &ModuleImage,
        argv: &[String],
        fs: &FsSnapshot,
        output: &dyn ChunkSink,
    ) -> Result<InstanceExit, PlaygroundError>;
}
