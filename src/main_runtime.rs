use order_watch::config::LoggingConfig;
use tokio::signal;
use tracing::error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const LOG_FILE: &str = "order-watch.log";

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `logging.level`. The returned guard flushes the file
/// writer and must live as long as the process.
pub fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("{},order_watch=debug,sqlx=warn", config.level))
    });

    // `rolling::daily` panics when it cannot create the file, so check first
    let (file_layer, guard) = match config.dir.as_deref().map(prepare_log_dir) {
        Some(Ok(dir)) => {
            let appender = tracing_appender::rolling::daily(&dir, LOG_FILE);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true);
            (Some(layer), Some(guard))
        }
        Some(Err(e)) => {
            eprintln!("Warning: file logging disabled: {}", e);
            (None, None)
        }
        None => (None, None),
    };

    let json_layer = config
        .json
        .then(|| tracing_subscriber::fmt::layer().json().with_target(true));
    let console_layer = (!config.json).then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(console_layer)
        .with(file_layer)
        .init();

    guard
}

fn prepare_log_dir(dir: &str) -> std::io::Result<String> {
    std::fs::create_dir_all(dir)?;
    let probe = std::path::Path::new(dir).join(".order_watch_write_test");
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&probe)?;
    let _ = std::fs::remove_file(&probe);
    Ok(dir.to_string())
}

/// Minimal logging for one-shot commands that fail before config loads
pub fn init_logging_simple() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .try_init();
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => error!("Failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
