use caviar_core::constants::{CAVIAR_LOG_VAR, DEFAULT_LOG_FILTER};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// Re-export tracing macros for convenience
pub use tracing::{debug, error, info, instrument, span, trace, warn, Level, Span};

/// Initialize the tracing system
///
/// The filter comes from `CAVIAR_LOG`, then `RUST_LOG`, then `fallback`
/// (or `info` when no fallback is given). Output is compact and goes to
/// stderr so that stdout stays free for results. A second call is a no-op
/// error rather than a panic.
pub fn init(fallback: Option<&str>) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let filter = build_filter(fallback);

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .compact()
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

fn build_filter(fallback: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_env(CAVIAR_LOG_VAR)
        .or_else(|_| EnvFilter::try_from_default_env())
        .or_else(|_| EnvFilter::try_new(fallback.unwrap_or(DEFAULT_LOG_FILTER)))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Create a span covering one sampling call
pub fn sampling_span(n_partitions: usize, n_items: usize, prior_kind: &str) -> Span {
    span!(
        Level::INFO,
        "sample_partitions",
        n_partitions = %n_partitions,
        n_items = %n_items,
        prior_kind = %prior_kind
    )
}
