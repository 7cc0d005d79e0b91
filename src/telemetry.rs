//! Tracing subscriber setup for binaries, demos, and tests.
//!
//! The crate itself only emits `tracing` events; installing a subscriber
//! is the embedding application's choice. This module offers the default
//! wiring: fmt output with an env-filter honoring `RUST_LOG`.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "trackmill=info";

/// Install the default subscriber, if none is installed yet.
///
/// Safe to call from every test or demo entry point; later calls are
/// no-ops.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
