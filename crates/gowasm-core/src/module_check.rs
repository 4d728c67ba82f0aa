//! Pre-flight inspection of a module binary before a runner is started.
//!
//! A runner handed something it cannot load reports that as an ordinary
//! nonzero exit, which would surface as `status N.` instead of an
//! instantiation failure. Inspecting the binary first keeps the two apart.

use wasmparser::{Encoding, Parser, Payload};

use crate::error::PlaygroundError;
use crate::runtime::ModuleImage;

/// Import namespaces of modules built for the js/wasm host (`wasm_exec.js`).
pub const JS_HOST_NAMESPACES: &[&str] = &["go", "gojs"];

/// Check that `image` is a core WebAssembly module a WASI runner can load.
///
/// Only the header and the import section are read; function bodies are
/// left to the runner.
pub fn check_module(image: &ModuleImage) -> Result<(), PlaygroundError> {
    let fail = |reason: String| PlaygroundError::instantiate(image.name(), reason);

    for payload in Parser::new(0).parse_all(image.bytes()) {
        let payload = payload.map_err(|e| fail(format!("not a WebAssembly module: {}", e)))?;
        match payload {
            Payload::Version {
                encoding: Encoding::Component,
                ..
            } => return Err(fail("component binaries are not supported".to_string())),
            Payload::ImportSection(reader) => {
                for import in reader {
                    let import =
                        import.map_err(|e| fail(format!("not a WebAssembly module: {}", e)))?;
                    if JS_HOST_NAMESPACES.contains(&import.module) {
                        return Err(fail(format!(
                            "module needs the js/wasm host (imports {}.{}); a WASI runner cannot instantiate it",
                            import.module, import.name
                        )));
                    }
                }
            }
            Payload::CodeSectionStart { .. } | Payload::End(_) => return Ok(()),
            _ => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &[u8] = b"\0asm\x01\0\0\0";

    fn reason_of(result: Result<(), PlaygroundError>) -> String {
        match result {
            Err(PlaygroundError::Instantiate { reason, .. }) => reason,
            other => panic!("expected an instantiate error, got {:?}", other),
        }
    }

    #[test]
    fn test_header_only_module_passes() {
        assert!(check_module(&ModuleImage::new("compile", HEADER.to_vec())).is_ok());
    }

    #[test]
    fn test_garbage_is_rejected() {
        let image = ModuleImage::new("compile", b"#!/bin/sh\necho hi\n".to_vec());
        let reason = reason_of(check_module(&image));
        assert!(reason.starts_with("not a WebAssembly module"), "got: {}", reason);
    }

    #[test]
    fn test_truncated_header_is_rejected() {
        let image = ModuleImage::new("link", b"\0asm".to_vec());
        let reason = reason_of(check_module(&image));
        assert!(reason.starts_with("not a WebAssembly module"), "got: {}", reason);
    }

    #[test]
    fn test_js_host_import_is_rejected() {
        // import section: one entry, "go" "debug", func type 0
        let mut bytes = HEADER.to_vec();
        bytes.extend_from_slice(&[
            0x02, 0x0c, 0x01, 0x02, b'g', b'o', 0x05, b'd', b'e', b'b', b'u', b'g', 0x00, 0x00,
        ]);
        let err = check_module(&ModuleImage::new("a.out", bytes)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "a.out: module needs the js/wasm host (imports go.debug); a WASI runner cannot instantiate it"
        );
    }
}
