// src/logging.rs

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::time::FormatTime;

/// A timer that outputs nothing but still enables span timing calculation
struct NoTimestamp;

impl FormatTime for NoTimestamp {
    fn format_time(&self, _w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        Ok(())
    }
}

/// Install a subscriber if `GENUS_LOG` is set.
///
/// `GENUS_LOG_STYLE`: "compact" (default) or "full" (timestamps). Returns
/// false when nothing was installed, including when another subscriber is
/// already set.
pub fn init_logging() -> bool {
    let Ok(filter) = EnvFilter::try_from_env("GENUS_LOG") else {
        return false;
    };
    let style = std::env::var("GENUS_LOG_STYLE").unwrap_or_default();
    let installed = if style == "full" {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_level(true)
            .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
            .with_writer(std::io::stderr)
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_level(true)
            .with_timer(NoTimestamp)
            .with_span_events(FmtSpan::CLOSE)
            .with_writer(std::io::stderr)
            .try_init()
    };
    if installed.is_ok() {
        tracing::debug!(%style, "tracing initialized");
    }
    installed.is_ok()
}
