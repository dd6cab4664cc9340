//! Log output setup for the `podium` binary.
//!
//! The library only emits `tracing` events; installing a subscriber is left
//! to the binary.

use crate::config::LoggingSettings;

/// Install the global fmt subscriber.
///
/// `RUST_LOG` overrides the configured level. Logs go to stderr so `analyze`
/// and `normalize` can print JSON on stdout. Calling this twice is harmless.
pub fn init(settings: &LoggingSettings) {
    let level = fallback_level(&settings.level);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_ansi(settings.ansi)
        .with_writer(std::io::stderr)
        .try_init();
}

/// A plain level name, or `info` for anything unrecognized.
///
/// Full filter directives (`podium=debug,tower_http=warn`) pass through.
fn fallback_level(configured: &str) -> &str {
    let trimmed = configured.trim();
    match trimmed.to_ascii_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" | "off" => trimmed,
        _ if trimmed.contains('=') => trimmed,
        _ => "info",
    }
}
