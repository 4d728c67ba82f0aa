//! Shared types for the gowasm-playground workspace.
//!
//! This crate provides the value types every other crate in the workspace
//! speaks, so the transport, core engine and CLI layers do not depend on
//! each other for them.
//!
//! ## Output Types
//!
//! The [`events`] module contains the ordered event protocol a pipeline run
//! produces:
//! - [`OutputEvent`](events::OutputEvent) - Start / Stdout / Stderr / End
//! - [`Stream`](events::Stream) - which process stream a chunk came from
//!
//! ## Environment
//!
//! The [`env_utils`] module reads `GOWASM_*` style configuration variables.

pub mod env_utils;
pub mod events;

// Re-export commonly used types at crate root
pub use env_utils::EnvReader;
pub use events::{OutputEvent, Stream};
