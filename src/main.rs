//! `modulate` binary.
//!
//! Reads one event per line from stdin and feeds each through a debounced,
//! cached handler, logging when every caller's result arrives.

use std::path::Path;
use std::process::ExitCode;

use modulate::config::{Cli, Command, ValidatedConfig, write_default_config};

mod app;
mod run;

use app::{exit_code, print_config_hint, setup_tracing};

#[cfg(not(tarpaulin_include))]
fn main() -> ExitCode {
    let cli = Cli::parse_args();

    if let Some(Command::Init { output }) = &cli.command {
        return write_template(output);
    }

    let config = match ValidatedConfig::load(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            print_config_hint(&e);
            return exit_code::CONFIG_ERROR;
        }
    };

    // Tracing needs `verbose`, so it can only start once the config is valid.
    setup_tracing(config.verbose);
    tracing::info!("{config}");

    serve_stdin(config)
}

/// `modulate init`: writes the commented config template to `output`.
fn write_template(output: &Path) -> ExitCode {
    match write_default_config(output) {
        Ok(()) => {
            println!("Configuration template written to: {}", output.display());
            exit_code::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            exit_code::CONFIG_ERROR
        }
    }
}

/// Drives [`run::execute`] on a multi-threaded runtime until stdin closes
/// or a shutdown signal arrives.
#[cfg(not(tarpaulin_include))]
fn serve_stdin(config: ValidatedConfig) -> ExitCode {
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("Cannot start async runtime: {e}");
            return exit_code::runtime_error();
        }
    };

    match runtime.block_on(run::execute(config)) {
        Ok(()) => exit_code::SUCCESS,
        Err(e) => {
            tracing::error!("Event loop stopped: {e}");
            exit_code::runtime_error()
        }
    }
}
