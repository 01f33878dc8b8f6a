/*!
 * Tracing Setup
 * Structured logging for the simulator using the tracing crate
 */

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize structured tracing and the `log` facade.
///
/// Environment variables:
/// - RUST_LOG: log level filter (default: info)
/// - PSEUDOS_TRACE_JSON: enable JSON output (default: false)
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Domain modules log through the `log` facade; route it to stderr
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();

    let use_json = std::env::var("PSEUDOS_TRACE_JSON")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);
    if use_json {
        let _ = registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .try_init();
    } else {
        let _ = registry
            .with(tracing_subscriber::fmt::layer().with_target(false).compact())
            .try_init();
    }
}
