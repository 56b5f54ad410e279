//! Observability infrastructure: tracing and metrics.
//!
//! Library code only emits `tracing` events and `metrics` updates. Binaries
//! call [`init`] once to install a subscriber; installing a metrics recorder
//! is left to the embedding process.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub mod metrics;

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` overrides `default_level` (e.g. `RUST_LOG=ibguid_core=debug`).
///
/// # Errors
/// Returns an error if a global subscriber is already installed.
pub fn init(default_level: tracing::Level) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_writer(std::io::stderr),
        )
        .try_init()?;

    metrics::register_metrics();
    Ok(())
}
