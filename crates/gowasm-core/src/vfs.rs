//! In-process virtual filesystem shared by successive module executions.
//!
//! Module instances are stateless apart from their argv; every larger
//! payload (the source file, import configs, archives, the linked program)
//! travels through a [`FileStore`]. Executions work on a point-in-time
//! [`FsSnapshot`] and commit only what they changed.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::VfsError;

/// Normalize a virtual path.
///
/// Relative paths resolve against `/`, the working directory of every
/// module. `.` segments and repeated slashes are dropped; `..` pops a
/// segment and stops at the root.
pub fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    format!("/{}", segments.join("/"))
}

/// Path-keyed byte store with last-write-wins semantics.
pub trait FileStore: Send + Sync {
    /// Store `bytes` under `path`, replacing any previous content.
    fn write(&self, path: &str, bytes: Vec<u8>);

    /// Last bytes written under `path`.
    fn read(&self, path: &str) -> Result<Vec<u8>, VfsError>;

    /// Point-in-time copy of every file.
    fn snapshot(&self) -> FsSnapshot;

    /// Check if a path has been written (without copying bytes).
    fn exists(&self, path: &str) -> bool {
        self.read(path).is_ok()
    }

    /// All written paths, sorted.
    fn paths(&self) -> Vec<String> {
        self.snapshot().paths().map(str::to_string).collect()
    }

    /// Apply the files a module produced.
    fn commit(&self, changed: Vec<(String, Vec<u8>)>) {
        for (path, bytes) in changed {
            self.write(&path, bytes);
        }
    }
}

/// Immutable view of a store at one instant. Byte buffers are shared with
/// the store, so taking a snapshot does not copy file contents.
#[derive(Debug, Clone, Default)]
pub struct FsSnapshot {
    files: BTreeMap<String, Arc<[u8]>>,
}

impl FsSnapshot {
    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.files.get(&normalize_path(path)).map(|bytes| &bytes[..])
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.files
            .iter()
            .map(|(path, bytes)| (path.as_str(), &bytes[..]))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Files in `after` that are new or differ from this snapshot.
    pub fn changes<I>(&self, after: I) -> Vec<(String, Vec<u8>)>
    where
        I: IntoIterator<Item = (String, Vec<u8>)>,
    {
        after
            .into_iter()
            .map(|(path, bytes)| (normalize_path(&path), bytes))
            .filter(|(path, bytes)| self.get(path) != Some(bytes.as_slice()))
            .collect()
    }
}

/// Memory-backed [`FileStore`].
#[derive(Debug, Default)]
pub struct MemoryFs {
    files: RwLock<BTreeMap<String, Arc<[u8]>>>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FileStore for MemoryFs {
    fn write(&self, path: &str, bytes: Vec<u8>) {
        self.files
            .write()
            .insert(normalize_path(path), Arc::from(bytes));
    }

    fn read(&self, path: &str) -> Result<Vec<u8>, VfsError> {
        let path = normalize_path(path);
        self.files
            .read()
            .get(&path)
            .map(|bytes| bytes.to_vec())
            .ok_or(VfsError::NotFound { path })
    }

    fn snapshot(&self) -> FsSnapshot {
        FsSnapshot {
            files: self.files.read().clone(),
        }
    }

    fn exists(&self, path: &str) -> bool {
        self.files.read().contains_key(&normalize_path(path))
    }
}
