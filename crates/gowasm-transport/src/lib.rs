//! gowasm Transport Layer
//!
//! Retrieval of the precompiled toolchain assets (module binaries and
//! support archives).
//!
//! This crate provides:
//! - [`source`]: the [`AssetSource`] trait and [`AssetLocation`] parsing
//! - [`http`]: HTTP(S) retrieval from a CDN base URL
//! - [`dir`]: retrieval from a local directory with the same layout
//!
//! # Example
//!
//! ```ignore
//! use gowasm_transport::AssetLocation;
//!
//! let source = AssetLocation::parse("https://cdn.jsdelivr.net/npm/@chriskoch/golang-wasm@1.0.0")
//!     .into_source();
//! let compiler = source.fetch("cmd/compile.wasm").await?;
//! ```

pub mod dir;
pub mod http;
pub mod source;

// Re-export main types for convenience
pub use dir::DirAssetSource;
pub use http::HttpAssetSource;
pub use source::{AssetLocation, AssetSource, DEFAULT_ASSET_BASE};
