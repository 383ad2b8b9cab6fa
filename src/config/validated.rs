//! Validated configuration after merging CLI and TOML sources.
//!
//! This module contains the final, validated configuration that is used
//! by the application. All validation is performed during construction.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde_json::{Map, Number, Value};

use crate::modulate::{InvalidArgument, Options};

use super::cli::Cli;
use super::defaults;
use super::error::ConfigError;
use super::toml::TomlConfig;

/// Keys accepted in the `[debounce]` section.
const DEBOUNCE_KEYS: [&str; 6] = [
    "wait",
    "immediate",
    "max_cache_size",
    "maxCacheSize",
    "max_wait",
    "maxWait",
];

/// Fully validated configuration ready for use by the application.
///
/// # Construction
///
/// Use [`ValidatedConfig::from_raw`] to create from CLI args and optional TOML config.
/// The function validates all inputs and returns errors for invalid configurations.
#[derive(Debug)]
pub struct ValidatedConfig {
    /// Debounce options for the event handler
    pub options: Options,

    /// Simulated handler duration
    pub work: Duration,

    /// Verbose logging enabled
    pub verbose: bool,
}

impl fmt::Display for ValidatedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let max_wait_str = self
            .options
            .max_wait()
            .map_or_else(|| "none".to_string(), |d| format!("{}ms", d.as_millis()));

        write!(
            f,
            "Config {{ wait: {}ms, immediate: {}, max_cache_size: {}, max_wait: {}, work: {}ms }}",
            self.options.wait().as_millis(),
            self.options.immediate(),
            self.options.max_cache_size(),
            max_wait_str,
            self.work.as_millis(),
        )
    }
}

impl ValidatedConfig {
    /// Creates a validated configuration from CLI arguments and optional TOML config.
    ///
    /// CLI arguments take precedence over TOML config values. The
    /// `immediate` flag is enabled if either source enables it.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The `[debounce]` section contains an unknown key
    /// - Any debounce option is malformed or `max_wait < wait`, including a
    ///   non-boolean TOML `immediate` when `--immediate` is also given
    pub fn from_raw(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Self, ConfigError> {
        let document = Self::merge_debounce(cli, toml)?;
        let options = Options::from_document(&document)?;

        let work = cli
            .work
            .or_else(|| toml.and_then(|t| t.demo.work))
            .map_or_else(defaults::work, Duration::from_millis);

        Ok(Self {
            options,
            work,
            verbose: cli.verbose,
        })
    }

    /// Loads and merges configuration from CLI and optional config file.
    ///
    /// If `cli.config` is set, loads the TOML file from that path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The config file cannot be read or parsed
    /// - The merged configuration is invalid
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let toml = if let Some(ref path) = cli.config {
            Some(TomlConfig::load(path)?)
        } else {
            None
        };

        Self::from_raw(cli, toml.as_ref())
    }

    /// Builds the debounce document: TOML values overlaid with explicit CLI values.
    fn merge_debounce(
        cli: &Cli,
        toml: Option<&TomlConfig>,
    ) -> Result<Map<String, Value>, ConfigError> {
        let mut document = toml
            .and_then(|t| t.debounce.clone())
            .unwrap_or_default();

        if let Some(key) = document.keys().find(|k| !DEBOUNCE_KEYS.contains(&k.as_str())) {
            return Err(ConfigError::UnknownOption { key: key.clone() });
        }

        if let Some(wait) = cli.wait {
            document.insert("wait".into(), number(wait, InvalidArgument::Wait)?);
        }
        document
            .entry("wait")
            .or_insert_with(|| Value::from(defaults::WAIT_MS));

        if !matches!(
            document.get("immediate"),
            None | Some(Value::Null | Value::Bool(_))
        ) {
            return Err(InvalidArgument::Immediate.into());
        }
        if cli.immediate {
            document.insert("immediate".into(), Value::Bool(true));
        }

        if let Some(size) = cli.max_cache_size {
            document.remove("maxCacheSize");
            document.insert(
                "max_cache_size".into(),
                number(size, InvalidArgument::MaxCacheSize)?,
            );
        }

        if let Some(max_wait) = cli.max_wait {
            document.remove("maxWait");
            document.insert("max_wait".into(), number(max_wait, InvalidArgument::MaxWait)?);
        }

        Ok(document)
    }
}

/// Writes the default configuration template to a file.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    let template = super::toml::default_config_template();
    std::fs::write(path, template).map_err(|e| ConfigError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

// Non-finite numbers have no JSON form; report them against their field.
fn number(value: f64, field: InvalidArgument) -> Result<Value, ConfigError> {
    Number::from_f64(value)
        .map(Value::Number)
        .ok_or(ConfigError::InvalidOptions(field))
}
