use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Optional configuration file looked up in the working directory.
pub const CONFIG_FILE: &str = "psetdoc.toml";
pub const ENV_PREFIX: &str = "PSETDOC";

/// Batch run settings: defaults, then `psetdoc.toml`, then `PSETDOC_*`
/// environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// `tracing` filter used when `RUST_LOG` is unset.
    pub log_filter: String,
    /// Stop the batch at the first failing document.
    pub fail_fast: bool,
    /// Pretty-print JSON output.
    pub pretty: bool,
    /// Extension of documentation pages and enumeration pages.
    pub enum_extension: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            log_filter: "info".to_string(),
            fail_fast: false,
            pretty: true,
            enum_extension: crate::parser::enums::DEFAULT_EXTENSION.to_string(),
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    pub fn load_from(file: &Path) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(file).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?
            .try_deserialize()
    }
}
