//! Logging init for the command-line tool.
//!
//! Library code only emits `tracing` events; hosts embedding the crate install their own
//! subscriber.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,h2push=debug";

/// Initialize structured logging to stderr. `RUST_LOG` overrides the default filter.
///
/// Calling it twice is harmless: the second subscriber is ignored.
pub fn init_logging(verbose: bool) {
  let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
    if verbose {
      EnvFilter::new(DEFAULT_FILTER)
    } else {
      EnvFilter::new("warn")
    }
  });

  let _ = tracing_subscriber::fmt()
    .with_env_filter(env_filter)
    .with_writer(std::io::stderr)
    .with_ansi(false)
    .try_init();
}
