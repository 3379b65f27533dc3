//! Logging setup with journald support on Linux.
//!
//! Logs go to systemd's journal when available, with a daily-rolling file
//! in the config directory as the fallback. The terminal stays clean for
//! the UI either way.
//!
//! Level selection via the `PONTO_LOG` environment variable
//! (`error`, `warn`, `info` (default), `debug`, `trace`).

use anyhow::Result;
use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub fn init(log_dir: Option<PathBuf>) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_env("PONTO_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

    #[cfg(target_os = "linux")]
    {
        if let Ok(journald_layer) = tracing_journald::layer() {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(journald_layer)
                .init();

            tracing::info!("logging initialized with journald backend");
            return Ok(());
        }
    }

    let log_dir = log_dir.unwrap_or_else(|| {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ponto")
            .join("logs")
    });

    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "ponto.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // The guard must outlive the process; init() runs once at startup.
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    tracing::info!("logging initialized with file backend at {:?}", log_dir);
    Ok(())
}
