//! Tracing setup for the `lune` binary.
//!
//! Library code only emits events: store recovery and skipped journal or CSV
//! lines are logged at warn, record mutations at info. Printed command
//! output goes to stdout, so diagnostics are kept on stderr.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Subscriber used by the CLI: warnings only unless RUST_LOG says otherwise
pub fn init() {
    init_with_level("warn")
}

/// Install the stderr subscriber with `default_level` as the fallback filter
///
/// Passing "info" shows every start/end/reset decision; "debug" adds each
/// store load and save.
pub fn init_with_level(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

/// Route predictor and store events into the test harness output
#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new("debug"))
        .try_init();
}
