//! CLI argument parsing using clap.
//!
//! Defines the command-line interface with all options and subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Modulate: debounced event handling demo
///
/// Reads event names from standard input, one per line, and feeds them
/// through a debounced, caching handler.
#[derive(Debug, Parser)]
#[command(name = "modulate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Debounce wait in milliseconds
    #[arg(long, allow_negative_numbers = true)]
    pub wait: Option<f64>,

    /// Invoke on the leading edge instead of the trailing edge
    #[arg(long)]
    pub immediate: bool,

    /// Maximum number of cached results (0 disables caching)
    #[arg(long = "max-cache-size", allow_negative_numbers = true)]
    pub max_cache_size: Option<f64>,

    /// Upper bound in milliseconds on how long a burst may defer invocation
    #[arg(long = "max-wait", allow_negative_numbers = true)]
    pub max_wait: Option<f64>,

    /// Simulated handler duration in milliseconds
    #[arg(long)]
    pub work: Option<u64>,

    /// Path to configuration file
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, short)]
    pub verbose: bool,
}

/// Subcommands for modulate
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a default configuration file
    Init {
        /// Output path for the configuration file
        #[arg(long, short, default_value = "modulate.toml")]
        output: PathBuf,
    },
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Parses CLI arguments from an iterator (useful for testing).
    pub fn parse_from_iter<I, T>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::parse_from(iter)
    }

    /// Parses CLI arguments from an iterator, returning clap's error instead of exiting.
    ///
    /// # Errors
    ///
    /// Returns an error if the arguments are malformed.
    pub fn try_parse_from_iter<I, T>(iter: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::try_parse_from(iter)
    }

    /// Returns true if this is the init command.
    #[must_use]
    pub const fn is_init(&self) -> bool {
        matches!(self.command, Some(Command::Init { .. }))
    }
}
