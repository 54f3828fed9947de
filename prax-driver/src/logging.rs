//! Logging bootstrap for the driver adapters.
//!
//! Adapters log through `tracing`; this module only installs a subscriber
//! when asked to, controlled by environment variables:
//!
//! - `PRAX_DEBUG=true|1|yes` - Enable debug logging
//! - `PRAX_LOG_LEVEL=trace|debug|info|warn|error` - Set a specific level
//! - `PRAX_LOG_FORMAT=json|pretty|compact` - Output format (default: json)
//!
//! ```rust,no_run
//! use prax_driver::logging;
//!
//! // Call once at startup; later calls are no-ops.
//! logging::init();
//! ```
//!
//! Inside the adapters, use the tracing macros directly:
//!
//! ```rust,ignore
//! debug!(sql = %sql, "Executing query");
//! trace!(queued = waiters, "Write lock handed off");
//! warn!(error = %e, "Compensating rollback failed");
//! ```

use std::env;
use std::sync::Once;

static INIT: Once = Once::new();

/// Crates whose events the installed subscriber lets through.
pub const LOG_TARGETS: &[&str] = &["prax_driver", "prax_sqlite", "prax_migrate"];

/// Check if debug logging is enabled via `PRAX_DEBUG`.
#[inline]
pub fn is_debug_enabled() -> bool {
    debug_flag(env::var("PRAX_DEBUG").ok().as_deref())
}

/// Get the configured log level.
///
/// Defaults to "debug" if `PRAX_DEBUG` is enabled, otherwise "warn".
pub fn get_log_level() -> &'static str {
    resolve_level(
        env::var("PRAX_LOG_LEVEL").ok().as_deref(),
        is_debug_enabled(),
    )
}

/// Get the configured log format. Defaults to "json".
pub fn get_log_format() -> &'static str {
    resolve_format(env::var("PRAX_LOG_FORMAT").ok().as_deref())
}

fn debug_flag(value: Option<&str>) -> bool {
    value.is_some_and(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
}

fn resolve_level(level: Option<&str>, debug: bool) -> &'static str {
    let fallback = if debug { "debug" } else { "warn" };
    match level.map(str::to_lowercase).as_deref() {
        Some("trace") => "trace",
        Some("debug") => "debug",
        Some("info") => "info",
        Some("warn") => "warn",
        Some("error") => "error",
        _ => fallback,
    }
}

fn resolve_format(format: Option<&str>) -> &'static str {
    match format.map(str::to_lowercase).as_deref() {
        Some("pretty") => "pretty",
        Some("compact") => "compact",
        _ => "json",
    }
}

/// Build the `EnvFilter` directive string for a level.
pub fn filter_directive(level: &str) -> String {
    LOG_TARGETS
        .iter()
        .map(|target| format!("{}={}", target, level))
        .collect::<Vec<_>>()
        .join(",")
}

/// Initialize the adapter logging system.
///
/// Does nothing unless `PRAX_DEBUG` or `PRAX_LOG_LEVEL` is set, or when the
/// `tracing-subscriber` feature is disabled (install your own subscriber).
pub fn init() {
    INIT.call_once(|| {
        if !is_debug_enabled() && env::var("PRAX_LOG_LEVEL").is_err() {
            return;
        }

        #[cfg(feature = "tracing-subscriber")]
        {
            use tracing_subscriber::{EnvFilter, fmt, prelude::*};

            let level = get_log_level();
            let filter = EnvFilter::try_new(filter_directive(level))
                .unwrap_or_else(|_| EnvFilter::new("warn"));

            let registry = tracing_subscriber::registry().with(filter);
            match get_log_format() {
                "json" => registry.with(fmt::layer().json()).init(),
                "compact" => registry.with(fmt::layer().compact()).init(),
                _ => registry.with(fmt::layer().pretty()).init(),
            }

            tracing::info!(
                level = level,
                format = get_log_format(),
                "Prax driver logging initialized"
            );
        }
    });
}
