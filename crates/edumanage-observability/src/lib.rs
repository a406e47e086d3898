//! # EduManage Observability
//!
//! Console logging for the EduManage binaries. Library crates only emit
//! `tracing` events; installing a subscriber is left to whoever owns `main`.

use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Builds the default filter directive for a binary.
///
/// `RUST_LOG` wins when set; otherwise `LOG_LEVEL` (default `info`) applies
/// to the EduManage crates and noisy dependencies are held at `warn`.
pub fn default_directive(log_level: &str) -> String {
    format!(
        "edumanage={level},edumanage_cli={level},edumanage_db={level},sqlx=warn",
        level = log_level
    )
}

/// Installs a compact console subscriber.
///
/// Returns an error if a global subscriber is already set.
pub fn init_console_logging() -> Result<(), tracing_subscriber::util::TryInitError> {
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(&log_level)));

    let console_layer = fmt::layer()
        .compact()
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .with_filter(env_filter);

    tracing_subscriber::registry().with(console_layer).try_init()
}
