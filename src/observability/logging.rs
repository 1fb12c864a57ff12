//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the global `tracing` subscriber
//! - Configure log level from config, overridable by `RUST_LOG`
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - Per-request spans come from the HTTP server, not from here
//! - Initializing twice is an error the caller may ignore (tests do)

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, util::TryInitError, EnvFilter};

/// Default filter directives for `level`: our crate at `level`, HTTP middleware one step quieter.
pub fn default_directives(level: &str) -> String {
    let level = level.to_ascii_lowercase();
    let middleware = match level.as_str() {
        "trace" => "debug",
        "debug" | "info" => "info",
        other => other,
    };
    format!("waypoint={level},tower_http={middleware}")
}

/// Install the global subscriber. `RUST_LOG`, when set, wins over `level`.
pub fn init(level: &str) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_directives(level).into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
}
