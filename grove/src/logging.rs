//! Development-time tracing for debugging grove.
//!
//! Tracing output is dev diagnostics only: it goes to stderr and is gated by
//! `RUST_LOG`. Product output (planned programs, conflict menus, command
//! summaries) is printed to stdout and is unaffected.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the tracing subscriber.
///
/// Reads `RUST_LOG`; defaults to `warn`, or `debug` when `--verbose` is set.
///
/// # Example
/// ```bash
/// RUST_LOG=grove=debug grove sync
/// ```
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
