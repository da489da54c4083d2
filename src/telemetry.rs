//! Tracing subscriber setup for binaries.

use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "hotel_api=info,server=info,tower_http=info";

/// Install the global fmt subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
