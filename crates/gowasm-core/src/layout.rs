//! Fixed filesystem layout and command lines of the toolchain.
//!
//! The prebuilt compiler and linker were built against these exact paths,
//! so none of them are configurable.

/// Source file every step works on.
pub const SOURCE_PATH: &str = "/main.go";
/// Import configuration read by the compiler.
pub const IMPORTCFG_PATH: &str = "/importcfg";
/// Import configuration read by the linker.
pub const IMPORTCFG_LINK_PATH: &str = "/importcfg.link";
/// Package archive produced by the compiler.
pub const OBJECT_PATH: &str = "/main.a";
/// Executable produced by the linker.
pub const OUTPUT_PATH: &str = "/a.out";
/// Virtual directory holding the runtime support archives.
pub const PREBUILT_DIR: &str = "/golang/prebuilt";

/// Logical name of the produced program.
pub const PROGRAM_NAME: &str = "a.out";

/// A toolchain command shipped as a module binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    Compile,
    Link,
    Gofmt,
}

impl Tool {
    pub const ALL: [Tool; 3] = [Tool::Compile, Tool::Link, Tool::Gofmt];

    pub fn name(self) -> &'static str {
        match self {
            Tool::Compile => "compile",
            Tool::Link => "link",
            Tool::Gofmt => "gofmt",
        }
    }

    /// Path of the module binary relative to the asset base.
    pub fn asset_path(self) -> String {
        format!("cmd/{}.wasm", self.name())
    }
}

/// A runtime support archive: import path plus location under the
/// prebuilt directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupportArchive {
    pub package: &'static str,
    pub file: &'static str,
}

impl SupportArchive {
    /// Path of the archive relative to the asset base.
    pub fn asset_path(&self) -> String {
        format!("prebuilt/{}", self.file)
    }

    /// Where the archive lives in the virtual filesystem.
    pub fn vfs_path(&self) -> String {
        format!("{}/{}", PREBUILT_DIR, self.file)
    }
}

/// Every archive the minimal runtime needs, `runtime` first.
pub static SUPPORT_ARCHIVES: [SupportArchive; 6] = [
    SupportArchive {
        package: "runtime",
        file: "runtime.a",
    },
    SupportArchive {
        package: "internal/bytealg",
        file: "internal/bytealg.a",
    },
    SupportArchive {
        package: "internal/cpu",
        file: "internal/cpu.a",
    },
    SupportArchive {
        package: "runtime/internal/atomic",
        file: "runtime/internal/atomic.a",
    },
    SupportArchive {
        package: "runtime/internal/math",
        file: "runtime/internal/math.a",
    },
    SupportArchive {
        package: "runtime/internal/sys",
        file: "runtime/internal/sys.a",
    },
];

fn packagefile(package: &str, path: &str) -> String {
    format!("packagefile {}={}", package, path)
}

/// Compile-time import config: only the runtime is importable.
pub fn compile_importcfg() -> String {
    let runtime = &SUPPORT_ARCHIVES[0];
    packagefile(runtime.package, &runtime.vfs_path())
}

/// Link-time import config: the compiled package plus every support archive.
pub fn link_importcfg() -> String {
    let mut lines = vec![packagefile("command-line-arguments", "main.a")];
    lines.extend(
        SUPPORT_ARCHIVES
            .iter()
            .map(|archive| packagefile(archive.package, &archive.vfs_path())),
    );
    lines.join("\n")
}

fn to_args(args: &[&str]) -> Vec<String> {
    args.iter().map(|arg| arg.to_string()).collect()
}

/// Compiler arguments: package `main`, no DWARF, packed archive output.
pub fn compile_args() -> Vec<String> {
    to_args(&[
        "-p",
        "main",
        "-complete",
        "-dwarf=false",
        "-pack",
        "-importcfg",
        "importcfg",
        "main.go",
    ])
}

/// Linker arguments producing `a.out`.
pub fn link_args() -> Vec<String> {
    to_args(&["-importcfg", "importcfg.link", "-buildmode=exe", "main.a"])
}

/// Formatter arguments rewriting the source in place.
pub fn format_args() -> Vec<String> {
    to_args(&["-w", "main.go"])
}
