use anyhow::{Result, anyhow};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;

pub const LOG_FILE: &str = "leave-tracker.log";

/// Installs the global subscriber writing to a daily rolling file in
/// `dir`. Keep the returned guard alive for the life of the process or
/// buffered lines are lost.
pub fn init(dir: &str, level: &str) -> Result<WorkerGuard> {
    let level: Level = level
        .parse()
        .map_err(|_| anyhow!("LOG_LEVEL has an invalid value {level:?}"))?;

    let file_appender = rolling::daily(dir, LOG_FILE);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(level)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .try_init()
        .map_err(|e| anyhow!("Failed to install tracing subscriber: {e}"))?;

    Ok(guard)
}
