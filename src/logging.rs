use tracing_subscriber::EnvFilter;

/// Install the tracing subscriber for binaries; library code only emits.
///
/// `RUST_LOG` controls the filter, defaulting to `info`. Safe to call more
/// than once; later calls are no-ops.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
