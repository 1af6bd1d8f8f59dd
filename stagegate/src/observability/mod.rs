//! Subscriber setup for the `tracing` events the pipeline emits.
//!
//! The runner logs through `tracing` spans (`pipeline.run`, `stage`) and
//! level-tagged events. These helpers install a global `fmt` subscriber for
//! binaries and tests that have none of their own. `RUST_LOG` takes
//! precedence over the filter passed in.

use tracing_subscriber::EnvFilter;

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Installs a human-readable subscriber.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init_tracing(filter: &str) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(filter))
        .with_target(false)
        .try_init()
        .is_ok()
}

/// Installs a subscriber that writes one JSON object per event.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init_json_tracing(filter: &str) -> bool {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(env_filter(filter))
        .with_current_span(true)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_harmless() {
        let _ = init_tracing("debug");
        assert!(!init_tracing("info"));
        assert!(!init_json_tracing("info"));
    }
}
