//! src/config.rs
//!
//! A handful of tunables the core exposes to its host process: batch size,
//! default iteration cap, and whether `optimize` reports progress. Scaled
//! down relative to a full multi-source configuration layer (no env
//! overrides, no local-override file) since this crate has a handful of
//! knobs, not a server's worth of configuration surface.
//!
//! ## Example
//!
//! ```toml
//! batch_size = 64
//! default_iterations = 50
//! report = false
//! ```

use serde::{Deserialize, Serialize};

use crate::interpreter::DEFAULT_BATCH_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Rows processed per batch in the interpreter's inner loop.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Iteration cap handed to `optimize` when the caller has no
    /// per-evaluation override.
    #[serde(default = "default_iterations")]
    pub default_iterations: usize,

    /// Whether `optimize` logs a summary event at `info` level.
    #[serde(default)]
    pub report: bool,
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_iterations() -> usize {
    50
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            default_iterations: default_iterations(),
            report: false,
        }
    }
}

impl CoreConfig {
    /// Parse a TOML document into a `CoreConfig`, falling back to
    /// per-field defaults for anything the document omits.
    pub fn from_toml_str(text: &str) -> anyhow::Result<Self> {
        let config: CoreConfig = toml::from_str(text)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_falls_back_to_defaults() {
        let config = CoreConfig::from_toml_str("").unwrap();
        assert_eq!(config, CoreConfig::default());
    }

    #[test]
    fn partial_document_overrides_only_named_fields() {
        let config = CoreConfig::from_toml_str("batch_size = 128\n").unwrap();
        assert_eq!(config.batch_size, 128);
        assert_eq!(config.default_iterations, default_iterations());
        assert!(!config.report);
    }

    #[test]
    fn malformed_document_is_an_error() {
        assert!(CoreConfig::from_toml_str("batch_size = [this isn't toml").is_err());
    }
}
