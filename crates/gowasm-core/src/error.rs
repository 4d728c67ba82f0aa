//! Error types for the playground pipeline.
//!
//! Nonzero exit codes are not errors: a failing compile is a normal
//! pipeline outcome and is carried as a value (see
//! [`RunOutcome`](crate::pipeline::RunOutcome)). The variants here are the
//! failures that have no exit code to report.

/// Virtual filesystem errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VfsError {
    /// The path was never written.
    NotFound { path: String },
}

impl std::fmt::Display for VfsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VfsError::NotFound { path } => write!(f, "{}: file does not exist", path),
        }
    }
}

impl std::error::Error for VfsError {}

/// Failures of the playground infrastructure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaygroundError {
    /// A module binary or support archive could not be loaded.
    AssetLoad {
        /// Relative asset path (e.g. `cmd/compile.wasm`)
        asset: String,
        reason: String,
    },

    /// A module instance could not be created or did not run to a normal exit.
    Instantiate {
        /// Logical module name (`compile`, `link`, `gofmt`, `a.out`)
        module: String,
        reason: String,
    },

    /// A virtual file was read before it was written.
    NotFound { path: String },

    /// An output event was emitted out of protocol order.
    Lifecycle { reason: String },
}

impl PlaygroundError {
    pub fn instantiate(module: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        PlaygroundError::Instantiate {
            module: module.into(),
            reason: reason.to_string(),
        }
    }

    pub fn asset_load(asset: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        PlaygroundError::AssetLoad {
            asset: asset.into(),
            reason: reason.to_string(),
        }
    }

    pub fn lifecycle(reason: impl Into<String>) -> Self {
        PlaygroundError::Lifecycle {
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for PlaygroundError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaygroundError::AssetLoad { asset, reason } => {
                write!(f, "failed to load asset {}: {}", asset, reason)
            }
            PlaygroundError::Instantiate { module, reason } => {
                write!(f, "{}: {}", module, reason)
            }
            PlaygroundError::NotFound { path } => write!(f, "{}: file does not exist", path),
            PlaygroundError::Lifecycle { reason } => write!(f, "output protocol: {}", reason),
        }
    }
}

impl std::error::Error for PlaygroundError {}

impl From<VfsError> for PlaygroundError {
    fn from(err: VfsError) -> Self {
        match err {
            VfsError::NotFound { path } => PlaygroundError::NotFound { path },
        }
    }
}
