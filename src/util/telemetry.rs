//! Tracing bootstrap for hosts and tests.

use tracing_subscriber::EnvFilter;

/// Install a default fmt subscriber unless the host already set one.
///
/// The filter comes from `RUST_LOG`; when that is unset or unparsable, pool
/// events are logged at `info`. Safe to call more than once.
pub fn init_tracing() {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("elastic_pool=info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
