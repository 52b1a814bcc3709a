//! Tracing subscriber setup.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Install a `fmt` subscriber filtered by `RUST_LOG`, or by `default_filter`
/// when `RUST_LOG` is unset or invalid.
///
/// Returns `false` if a global subscriber was already installed; that is not
/// an error.
///
/// ```
/// let _ = pipeline_runtime::telemetry::init_tracing("info,pipeline=debug");
/// ```
pub fn init_tracing(default_filter: &str) -> bool {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_install_is_not_an_error() {
        let _ = init_tracing("debug");
        assert!(!init_tracing("debug"));
    }
}
