//! Process-level glue for the `modulate` binary: exit statuses, hints
//! printed after a bad configuration, and the log subscriber.

use modulate::config::ConfigError;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Exit statuses reported by `modulate`.
pub mod exit_code {
    use std::process::ExitCode;

    /// The event loop finished or `init` wrote its template.
    pub const SUCCESS: ExitCode = ExitCode::SUCCESS;

    /// Status 1: the CLI flags or the config file were rejected.
    pub const CONFIG_ERROR: ExitCode = ExitCode::FAILURE;

    /// Status 2: stdin failed or the async runtime could not start.
    // `ExitCode::from` is not const.
    pub fn runtime_error() -> ExitCode {
        ExitCode::from(2)
    }
}

/// Suggests a next step for configuration errors the user can act on.
pub fn print_config_hint(error: &ConfigError) {
    match error {
        ConfigError::FileRead { .. } | ConfigError::UnknownOption { .. } => {
            eprintln!("\nRun 'modulate init' to generate a configuration template.");
        }
        ConfigError::InvalidOptions(_) => {
            eprintln!("\nRun 'modulate --help' to see accepted option values.");
        }
        _ => {}
    }
}

/// Installs the fmt subscriber.
///
/// `-v` lowers the default level to DEBUG, which shows each leading and
/// trailing invocation. `RUST_LOG` still overrides per module.
pub fn setup_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
