//! Asset source abstraction.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::dir::DirAssetSource;
use crate::http::HttpAssetSource;

/// Published package carrying the prebuilt toolchain.
pub const DEFAULT_ASSET_BASE: &str = "https://cdn.jsdelivr.net/npm/@chriskoch/golang-wasm@1.0.0";

/// Something that can hand out asset bytes by relative path
/// (e.g. `cmd/compile.wasm`, `prebuilt/runtime.a`).
#[async_trait]
pub trait AssetSource: Send + Sync {
    /// Fetch the whole asset.
    async fn fetch(&self, relative_path: &str) -> Result<Vec<u8>>;

    /// Human-readable origin, used in logs and error messages.
    fn describe(&self) -> String;
}

#[async_trait]
impl<T: AssetSource + ?Sized> AssetSource for Arc<T> {
    async fn fetch(&self, relative_path: &str) -> Result<Vec<u8>> {
        (**self).fetch(relative_path).await
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Where the toolchain assets live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetLocation {
    /// Base URL; assets are fetched with HTTP GET.
    Remote(String),
    /// Local directory mirroring the remote layout.
    Local(PathBuf),
}

impl AssetLocation {
    /// `http://` and `https://` prefixes select a remote location; anything
    /// else is treated as a directory path.
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            AssetLocation::Remote(trimmed.trim_end_matches('/').to_string())
        } else {
            AssetLocation::Local(PathBuf::from(trimmed))
        }
    }

    /// Build the matching source.
    pub fn into_source(self) -> Arc<dyn AssetSource> {
        match self {
            AssetLocation::Remote(base) => Arc::new(HttpAssetSource::new(base)),
            AssetLocation::Local(root) => Arc::new(DirAssetSource::new(root)),
        }
    }
}

impl Default for AssetLocation {
    fn default() -> Self {
        AssetLocation::Remote(DEFAULT_ASSET_BASE.to_string())
    }
}

impl fmt::Display for AssetLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetLocation::Remote(base) => f.write_str(base),
            AssetLocation::Local(root) => write!(f, "{}", root.display()),
        }
    }
}
