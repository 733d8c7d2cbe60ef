//! Logging setup for the application.

use std::sync::OnceLock;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const DEFAULT_FILTER: &str = "media_gallery=info";

static INITIALIZED: OnceLock<()> = OnceLock::new();

/// Install the global tracing subscriber.
///
/// The filter comes from `RUST_LOG`, falling back to `media_gallery=info`.
/// Subsequent calls are no-ops.
pub fn init() {
    INITIALIZED.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
        let installed = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false))
            .try_init();

        // another subscriber may already be installed by the host process
        if installed.is_ok() {
            tracing::info!("Logging initialized");
        }
    });
}
