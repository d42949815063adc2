//! Subscriber setup for applications built on clitree.
//!
//! The framework itself only emits events through `tracing`; installing a
//! subscriber is left to the binary. This module offers a one-call setup
//! writing to stderr so command output on stdout stays clean.

pub use tracing::{debug, error, info, trace, warn, Level};

#[cfg(feature = "subscriber")]
use tracing_subscriber::{
    layer::SubscriberExt, util::SubscriberInitExt, util::TryInitError, EnvFilter, Layer,
    Registry,
};

/// Tracing output format.
#[cfg(feature = "subscriber")]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TracingFormat {
    /// Multi-line, human-readable.
    #[default]
    Pretty,

    /// Single line per event.
    Compact,

    /// Newline-delimited JSON.
    Json,
}

#[cfg(feature = "subscriber")]
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Level filter. `None` defers to `RUST_LOG`, then to `info`.
    pub level: Option<Level>,

    pub format: TracingFormat,

    pub timestamps: bool,

    /// Include the event target (module path).
    pub target: bool,

    pub thread_ids: bool,
}

#[cfg(feature = "subscriber")]
impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: None,
            format: TracingFormat::Pretty,
            timestamps: true,
            target: true,
            thread_ids: false,
        }
    }
}

/// Install a global subscriber with default settings.
///
/// ```no_run
/// clitree::tracing_support::init_subscriber().ok();
/// ```
///
/// Filtering follows `RUST_LOG`, e.g. `RUST_LOG=clitree=debug` shows command
/// resolution and each lifecycle phase, `clitree=trace` adds every flag token.
#[cfg(feature = "subscriber")]
pub fn init_subscriber() -> Result<(), TryInitError> {
    init_subscriber_with_config(TracingConfig::default())
}

/// Install a global subscriber built from `config`.
///
/// Fails if a global subscriber is already set.
#[cfg(feature = "subscriber")]
pub fn init_subscriber_with_config(config: TracingConfig) -> Result<(), TryInitError> {
    let filter = match config.level {
        Some(level) => EnvFilter::new(level.to_string()),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    tracing_subscriber::registry()
        .with(fmt_layer(&config))
        .with(filter)
        .try_init()
}

#[cfg(feature = "subscriber")]
fn fmt_layer(config: &TracingConfig) -> Box<dyn Layer<Registry> + Send + Sync> {
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(config.target)
        .with_thread_ids(config.thread_ids);

    match (config.format, config.timestamps) {
        (TracingFormat::Pretty, true) => layer.pretty().boxed(),
        (TracingFormat::Pretty, false) => layer.pretty().without_time().boxed(),
        (TracingFormat::Compact, true) => layer.compact().boxed(),
        (TracingFormat::Compact, false) => layer.compact().without_time().boxed(),
        (TracingFormat::Json, true) => layer.json().boxed(),
        (TracingFormat::Json, false) => layer.json().without_time().boxed(),
    }
}
