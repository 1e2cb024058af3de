//! Logging setup

use tracing_subscriber::{fmt, EnvFilter};

/// Default filter when neither `--log` nor `RUST_LOG` is set.
pub const DEFAULT_FILTER: &str = "info,script=debug";

/// Install the global subscriber.
///
/// An explicit `filter` wins over `RUST_LOG`, which wins over
/// [`DEFAULT_FILTER`].
pub fn init_logging(filter: Option<&str>) {
    let filter = match filter {
        Some(filter) => EnvFilter::new(filter),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
