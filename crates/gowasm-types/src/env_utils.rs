//! Environment variable parsing utilities.
//!
//! Every setting the playground reads from the environment shares one
//! prefix, so callers name the setting and [`EnvReader`] builds the key:
//!
//! ```
//! use gowasm_types::env_utils::EnvReader;
//!
//! let env = EnvReader::new("GOWASM");
//! // Reads GOWASM_RUNNER
//! let runner = env.string_or("RUNNER", "wasmtime");
//! assert!(!runner.is_empty());
//! ```

/// Reads prefixed environment variables (`<PREFIX>_<NAME>`).
#[derive(Debug, Clone)]
pub struct EnvReader {
    prefix: String,
}

impl EnvReader {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Full variable name for a setting.
    pub fn key(&self, name: &str) -> String {
        if self.prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}_{}", self.prefix, name)
        }
    }

    /// Raw string value; `None` when unset or empty.
    pub fn string(&self, name: &str) -> Option<String> {
        std::env::var(self.key(name))
            .ok()
            .filter(|v| !v.trim().is_empty())
    }

    /// String value with a default.
    pub fn string_or(&self, name: &str, default: &str) -> String {
        self.string(name).unwrap_or_else(|| default.to_string())
    }

    /// Truthy check: "1", "true", "yes" or "on" (case-insensitive).
    pub fn flag(&self, name: &str) -> bool {
        self.string(name)
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(false)
    }

    /// Comma-separated list. Empty entries are dropped.
    pub fn list(&self, name: &str) -> Option<Vec<String>> {
        self.string(name).map(|v| {
            v.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
    }
}

impl Default for EnvReader {
    fn default() -> Self {
        Self::new("GOWASM")
    }
}
