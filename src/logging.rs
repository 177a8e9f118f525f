//! Tracing initialisation shared by both binaries.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// `RUST_LOG` if set and valid, `info` otherwise.
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber: a stderr layer, plus a daily rolling file
/// under `log_dir` when given. The returned guard flushes the file writer
/// and must be held until exit.
pub fn init(log_dir: Option<&Path>, file_name: &str) -> Option<WorkerGuard> {
    let mut guard = None;
    let file_layer = log_dir.map(|dir| {
        let appender = tracing_appender::rolling::daily(dir, file_name);
        let (writer, worker_guard) = tracing_appender::non_blocking(appender);
        guard = Some(worker_guard);
        tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_filter(env_filter())
    });

    // stdout belongs to the CLI channel.
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(env_filter());

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .init();

    guard
}
