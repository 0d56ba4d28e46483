//! tracing subscriber setup shared by the binaries

use tracing_subscriber::EnvFilter;

/// Installs a fmt subscriber. `RUST_LOG` wins when it parses; otherwise
/// `default_directive` (e.g. `orbital_cloud=info`) applies. Calling it twice is harmless.
pub fn init_tracing(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}
