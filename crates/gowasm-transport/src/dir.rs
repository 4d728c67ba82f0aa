//! Local directory asset retrieval.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::source::AssetSource;

/// Reads assets from a directory laid out like the remote package
/// (`<root>/cmd/compile.wasm`, `<root>/prebuilt/runtime.a`, ...).
#[derive(Debug, Clone)]
pub struct DirAssetSource {
    root: PathBuf,
}

impl DirAssetSource {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, relative_path: &str) -> PathBuf {
        self.root.join(relative_path.trim_start_matches('/'))
    }
}

#[async_trait]
impl AssetSource for DirAssetSource {
    async fn fetch(&self, relative_path: &str) -> Result<Vec<u8>> {
        let path = self.resolve(relative_path);
        tokio::fs::read(&path)
            .await
            .map_err(|e| anyhow!("Failed to read {}: {}", path.display(), e))
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}
