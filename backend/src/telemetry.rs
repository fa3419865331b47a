//! Tracing subscriber setup for the binaries.

use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

/// Install the global subscriber, filtered by `RUST_LOG`.
///
/// Logs go to stderr so stdout stays free for command output. Installing a
/// second subscriber is logged and otherwise ignored.
pub fn init_tracing(json_logs: bool) {
    let builder = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr);
    let installed = if json_logs {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if let Err(error) = installed {
        warn!(error = %error, "tracing init failed");
    }
}
