//! CLI subcommand implementations for gowasm-playground

pub mod fmt;
pub mod layout;
pub mod output;
pub mod run;

use std::io::Read;

use anyhow::{Context, Result};

/// Read a source file, or stdin for `-`.
pub fn read_source(file: &str) -> Result<String> {
    if file == "-" {
        let mut source = String::new();
        std::io::stdin()
            .read_to_string(&mut source)
            .context("Failed to read source from stdin")?;
        return Ok(source);
    }
    std::fs::read_to_string(file).with_context(|| format!("Failed to read {}", file))
}

/// Rewrite `file` with `text` unless it is stdin or already identical.
pub fn write_back(file: &str, original: &str, text: &str) -> Result<bool> {
    if file == "-" || original == text {
        return Ok(false);
    }
    std::fs::write(file, text).with_context(|| format!("Failed to write {}", file))?;
    Ok(true)
}
