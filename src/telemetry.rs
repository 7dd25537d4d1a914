//! Logging setup.

use std::str::FromStr;
use std::sync::OnceLock;
use tracing::Level;

/// Environment variable overriding the configured log level.
pub const LOG_ENV: &str = "COSYFOCUS_LOG";

static TRACING_INIT: OnceLock<()> = OnceLock::new();

/// Installs a stderr subscriber once. Later calls are ignored.
pub fn init_tracing(configured_level: &str) {
    let level = std::env::var(LOG_ENV)
        .ok()
        .and_then(|value| parse_level(&value))
        .or_else(|| parse_level(configured_level))
        .unwrap_or(Level::INFO);

    TRACING_INIT.get_or_init(|| {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_writer(std::io::stderr)
            .with_target(false)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}

fn parse_level(value: &str) -> Option<Level> {
    Level::from_str(value.trim()).ok()
}
