//! Layout command - show where the pipeline puts things

use anyhow::Result;
use clap::Parser;
use serde_json::json;

use gowasm_core::layout::{self, Tool, SUPPORT_ARCHIVES};

#[derive(Parser, Debug)]
pub struct LayoutCmd {
    /// Output as JSON instead of human-readable format
    #[arg(long)]
    pub json: bool,
}

impl LayoutCmd {
    pub fn execute(&self) -> Result<i32> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(&layout_json())?);
        } else {
            println!("{}", format_layout());
        }
        Ok(0)
    }
}

fn tool_argv(tool: Tool) -> Vec<String> {
    let args = match tool {
        Tool::Compile => layout::compile_args(),
        Tool::Link => layout::link_args(),
        Tool::Gofmt => layout::format_args(),
    };
    std::iter::once(tool.name().to_string()).chain(args).collect()
}

fn layout_json() -> serde_json::Value {
    json!({
        "files": {
            "source": layout::SOURCE_PATH,
            "object": layout::OBJECT_PATH,
            "executable": layout::OUTPUT_PATH,
            "importcfg": layout::IMPORTCFG_PATH,
            "importcfg_link": layout::IMPORTCFG_LINK_PATH,
        },
        "tools": Tool::ALL.iter().map(|tool| json!({
            "name": tool.name(),
            "asset": tool.asset_path(),
            "argv": tool_argv(*tool),
        })).collect::<Vec<_>>(),
        "archives": SUPPORT_ARCHIVES.iter().map(|archive| json!({
            "package": archive.package,
            "asset": archive.asset_path(),
            "path": archive.vfs_path(),
        })).collect::<Vec<_>>(),
        "importcfg": layout::compile_importcfg(),
        "importcfg_link": layout::link_importcfg(),
    })
}

fn format_layout() -> String {
    let mut out = String::new();

    out.push_str("\x1b[1mFiles:\x1b[0m\n");
    for (label, path) in [
        ("source", layout::SOURCE_PATH),
        ("object", layout::OBJECT_PATH),
        ("executable", layout::OUTPUT_PATH),
        ("importcfg", layout::IMPORTCFG_PATH),
        ("importcfg.link", layout::IMPORTCFG_LINK_PATH),
    ] {
        out.push_str(&format!("  {:<16} {}\n", label, path));
    }

    out.push_str("\n\x1b[1mTools:\x1b[0m\n");
    for tool in Tool::ALL {
        out.push_str(&format!(
            "  {:<16} {}\n    {}\n",
            tool.name(),
            tool.asset_path(),
            tool_argv(tool).join(" ")
        ));
    }

    out.push_str("\n\x1b[1mSupport archives:\x1b[0m\n");
    for archive in SUPPORT_ARCHIVES.iter() {
        out.push_str(&format!("  {:<24} {}\n", archive.package, archive.vfs_path()));
    }

    out.push_str("\n\x1b[1mimportcfg:\x1b[0m\n");
    out.push_str(&layout::compile_importcfg());
    out.push_str("\n\n\x1b[1mimportcfg.link:\x1b[0m\n");
    out.push_str(&layout::link_importcfg());
    out
}
