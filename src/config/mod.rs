//! Configuration layer for the modulate demo.
//!
//! This module provides:
//! - CLI argument parsing ([`Cli`], [`Command`])
//! - TOML configuration file parsing ([`TomlConfig`])
//! - Validated configuration ([`ValidatedConfig`])
//! - Configuration file generation ([`write_default_config`])
//! - Default values ([`defaults`])
//!
//! # Priority
//!
//! Configuration values are resolved with the following priority (highest to lowest):
//!
//! 1. **Explicit CLI arguments** - Values explicitly passed via command line
//! 2. **TOML config file** - Values from the configuration file
//! 3. **Built-in defaults** - Hardcoded default values
//!
//! # Boolean Flag Semantics
//!
//! `--immediate` uses OR semantics: if set `true` in either CLI or TOML,
//! the result is `true`. The CLI cannot turn off a flag enabled in TOML.
//!
//! # Debounce Section
//!
//! The `[debounce]` table is read as a loosely typed document and validated
//! by [`Options::from_document`](crate::Options::from_document), so a bad
//! value such as `immediate = "yes"` reports the same error a dynamic caller
//! would see. Unknown keys in the table are rejected.

mod cli;
pub mod defaults;
mod error;
mod toml;
mod validated;

#[cfg(test)]
mod validated_tests;

pub use cli::{Cli, Command};
pub use error::ConfigError;
pub use toml::{DemoSection, TomlConfig, default_config_template};
pub use validated::{ValidatedConfig, write_default_config};
