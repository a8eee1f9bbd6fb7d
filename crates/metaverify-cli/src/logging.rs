//! Diagnostic logging.
//!
//! Diagnostics go to stderr so that stdout carries nothing but service
//! messages. The filter is read from `METAVERIFY_LOG` (for example
//! `METAVERIFY_LOG=metaverify_cli=debug`).

use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "METAVERIFY_LOG";

/// Installs the global subscriber. Calling it again is a no-op.
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .try_init();
}
