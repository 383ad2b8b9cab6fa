//! TOML configuration file parsing.
//!
//! Defines the structure of the configuration file with serde.

use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};

use super::ConfigError;

/// Root configuration structure from TOML file.
///
/// All fields are optional to allow partial configuration
/// that can be merged with CLI arguments.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    /// Debounce options, kept loosely typed.
    ///
    /// Values are checked when the options are built so that a malformed
    /// entry reports the same error as any other dynamic caller.
    #[serde(default)]
    pub debounce: Option<Map<String, Value>>,

    /// Demo handler configuration
    #[serde(default)]
    pub demo: DemoSection,
}

/// Demo handler configuration section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DemoSection {
    /// Simulated handler duration in milliseconds
    pub work: Option<u64>,
}

impl TomlConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::from)
    }
}

/// Generates a default configuration file with comments.
#[must_use]
pub fn default_config_template() -> String {
    r"# Modulate Configuration File

[debounce]
# Quiet period in milliseconds before the handler runs (default: 500)
wait = 500

# Run the handler on the first call of a burst instead of the last
# immediate = false

# Number of distinct results kept in the cache; 0 disables caching (default: 100)
# max_cache_size = 100

# Longest a burst may defer the handler, in milliseconds (must be >= wait)
# max_wait = 2000

[demo]
# Simulated handler duration in milliseconds (default: 0)
# work = 0
"
    .to_string()
}
