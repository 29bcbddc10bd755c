//! Tracing subscriber setup. `RUST_LOG` wins; otherwise `LOG_LEVEL` applies to this crate and tower-http.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset.
pub fn default_filter(level: &str) -> String {
    format!("pawspace_api={level},server={level},tower_http={level}")
}

/// Install the global fmt subscriber. Safe to call more than once (later calls are ignored).
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(level)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
