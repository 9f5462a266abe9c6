//! Logging setup for the binary.

use tracing_subscriber::{filter::EnvFilter, fmt};

/// Install the global fmt subscriber. `RUST_LOG` wins; otherwise the default
/// level is `info`, or `debug` with `--verbose`.
pub(crate) fn init(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_target(false)
        .with_timer(fmt::time::uptime())
        .with_env_filter(filter)
        .try_init();
}
