//! Logging initialization and configuration.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when neither a configured level nor `RUST_LOG` is available.
pub const DEFAULT_FILTER: &str = "diagram_sync=info";

/// Build the filter: the configured level wins, then `RUST_LOG`.
///
/// The configured level has already absorbed `RUST_LOG` during config
/// layering, so the environment is only consulted when no level was given.
/// A bare level such as `debug` is scoped to this crate so dependency
/// noise (hyper, tower) stays at its defaults.
fn build_filter(level: Option<&str>) -> EnvFilter {
    let directive = match level.filter(|level| !level.is_empty()) {
        Some(level) if level.contains('=') || level.contains(',') => level.to_string(),
        Some(level) => format!("diagram_sync={level},tower_http={level}"),
        None => match EnvFilter::try_from_default_env() {
            Ok(filter) => return filter,
            Err(_) => DEFAULT_FILTER.to_string(),
        },
    };

    EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Initialize the logging system.
///
/// # Panics
///
/// Panics if called more than once, or if another tracing subscriber
/// has already been set.
pub fn init(level: Option<&str>) {
    tracing_subscriber::registry()
        .with(build_filter(level))
        .with(tracing_subscriber::fmt::layer().compact())
        .init();
}

/// Try to initialize the logging system.
///
/// Returns `Err` if logging has already been initialized.
pub fn try_init(level: Option<&str>) -> Result<(), tracing_subscriber::util::TryInitError> {
    tracing_subscriber::registry()
        .with(build_filter(level))
        .with(tracing_subscriber::fmt::layer().compact())
        .try_init()
}
