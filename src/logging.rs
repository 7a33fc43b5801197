//! Logging configuration for db-drill.
//!
//! Diagnostics go to stderr so stdout carries only the report, which keeps
//! `--format json` output pipeable.

use tracing_subscriber::EnvFilter;

/// Level used when `RUST_LOG` is unset.
pub const DEFAULT_LEVEL: &str = "warn";

/// Builds the filter: `RUST_LOG` if set and valid, otherwise `default`.
pub fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Initializes logging to stderr.
///
/// `verbose` lowers the default level to `debug`. Calling this twice is
/// harmless: the second subscriber is simply not installed.
pub fn init_stderr_logging(verbose: bool) {
    let default = if verbose { "debug" } else { DEFAULT_LEVEL };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(default))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
