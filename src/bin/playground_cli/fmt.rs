//! Fmt command - print or rewrite the canonically formatted source

use anyhow::{anyhow, Result};
use clap::Parser;

use super::{read_source, write_back};
use gowasm_core::FormatOutcome;
use gowasm_playground::PlaygroundConfig;

#[derive(Parser, Debug)]
pub struct FmtCmd {
    /// Go source file, or `-` for stdin
    pub file: String,

    /// Write the result back to FILE instead of stdout
    #[arg(short = 'w', long = "write")]
    pub write: bool,
}

impl FmtCmd {
    pub async fn execute(&self, config: &PlaygroundConfig) -> Result<i32> {
        let source = read_source(&self.file)?;
        let playground = config.initialize().await?;

        match playground.format(&source).await {
            FormatOutcome::Formatted(text) => {
                if self.write && self.file != "-" {
                    write_back(&self.file, &source, &text)?;
                } else {
                    print!("{}", text);
                }
                Ok(0)
            }
            FormatOutcome::Unchanged => Err(anyhow!(
                "{}: formatter rejected the source",
                if self.file == "-" { "<stdin>" } else { self.file.as_str() }
            )),
        }
    }
}
