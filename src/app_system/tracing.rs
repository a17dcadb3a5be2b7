use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. Call once at startup; `RUST_LOG`
/// overrides the default `info` level.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}
