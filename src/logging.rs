//! Tracing subscriber setup for the binary

use tracing_subscriber::EnvFilter;

/// Install a formatting subscriber honouring `RUST_LOG`.
///
/// Without `RUST_LOG` the engine logs at `info`, or `debug` when `verbose`.
/// Calling this twice is harmless.
pub fn init(verbose: bool) {
    let default_filter = if verbose { "fairwager=debug" } else { "fairwager=info" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()),
        )
        .with_target(false)
        .try_init();
}
