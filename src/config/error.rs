//! Error types for configuration parsing and validation.

use std::path::PathBuf;

use thiserror::Error;

use crate::modulate::InvalidArgument;

/// Error type for configuration operations.
///
/// Covers errors from parsing, validation, and file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("Failed to read config file '{}': {source}", path.display())]
    FileRead {
        /// Path to the config file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("Failed to parse TOML config: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to write configuration file (for init command).
    #[error("Failed to write config file '{}': {source}", path.display())]
    FileWrite {
        /// Path to the config file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Unrecognised key in the `[debounce]` section.
    #[error("Unknown debounce option '{key}'")]
    UnknownOption {
        /// The unrecognised key
        key: String,
    },

    /// The merged debounce options are invalid.
    #[error("Invalid debounce options: {0}")]
    InvalidOptions(#[from] InvalidArgument),
}
