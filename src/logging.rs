//! Log setup
//!
//! The terminal is in raw mode while the editor runs, so logs only go to a
//! daily-rolling file in `<home>/logs/` (`gvim.log.YYYY-MM-DD`). Filtering
//! comes from `GVIM_LOG`, then `RUST_LOG`, then defaults to `info`.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter variable checked before `RUST_LOG`
pub const LOG_ENV: &str = "GVIM_LOG";

fn filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the file subscriber. Keep the guard alive until exit so buffered
/// lines are flushed.
pub fn init(logs_dir: &Path) -> WorkerGuard {
    let appender = tracing_appender::rolling::daily(logs_dir, "gvim.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true);

    if let Err(e) = tracing_subscriber::registry().with(filter()).with(file_layer).try_init() {
        eprintln!("Warning: could not initialize logging: {}", e);
    }
    guard
}
