pub mod utils;

use std::time::Duration;

use tokio::time::timeout;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::http_server;
use crate::{ServiceConfig, ServiceState};

const FINAL_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("failed to set up relay state: {0}")]
    State(#[from] crate::service_state::StateSetupError),
    #[error("failed to install signal handlers: {0}")]
    Signals(#[from] std::io::Error),
    #[error(transparent)]
    Http(#[from] http_server::HttpServerError),
    #[error("relay task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Initialize logging, panic handler, and build info reporting.
/// Returns guards that must be kept alive for the duration of the program.
pub fn init_logging(
    service_config: &ServiceConfig,
) -> Vec<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::fmt::format::FmtSpan;

    let mut guards = Vec::new();

    let (stdout_writer, stdout_guard) = tracing_appender::non_blocking(std::io::stdout());
    guards.push(stdout_guard);

    let stdout_env_filter = EnvFilter::builder()
        .with_default_directive(service_config.log_level.into())
        .from_env_lossy();

    let stdout_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(stdout_writer)
        .with_filter(stdout_env_filter);

    if let Some(log_dir) = &service_config.log_dir {
        if let Err(e) = std::fs::create_dir_all(log_dir) {
            eprintln!(
                "Warning: Failed to create log directory {:?}: {}",
                log_dir, e
            );
        }

        let file_appender = tracing_appender::rolling::daily(log_dir, "sealdrop-server.log");
        let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);
        guards.push(file_guard);

        let file_env_filter = EnvFilter::builder()
            .with_default_directive(service_config.log_level.into())
            .from_env_lossy();

        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(file_writer)
            .with_ansi(false)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(file_env_filter);

        tracing_subscriber::registry()
            .with(stdout_layer)
            .with(file_layer)
            .init();
    } else {
        tracing_subscriber::registry().with(stdout_layer).init();
    }

    utils::register_panic_logger();

    guards
}

/// Runs the relay until SIGINT/SIGTERM. Use for the CLI binary.
pub async fn spawn_service(service_config: &ServiceConfig) -> Result<(), ProcessError> {
    let _guards = init_logging(service_config);

    let (graceful_waiter, _shutdown_tx, shutdown_rx) = utils::graceful_shutdown_blocker()?;
    let state = ServiceState::from_config(service_config)?;

    utils::report_startup(&state.public_key(), service_config.listen_addr);

    let http_config = http_server::Config::new(service_config.listen_addr, service_config.log_level);
    let mut server =
        tokio::spawn(async move { http_server::run(http_config, state, shutdown_rx).await });

    tokio::select! {
        _ = graceful_waiter => {}
        // the server only returns early when it failed to bind or serve
        result = &mut server => {
            return match result {
                Ok(outcome) => outcome.map_err(ProcessError::from),
                Err(e) => Err(ProcessError::Join(e)),
            };
        }
    }

    match timeout(FINAL_SHUTDOWN_TIMEOUT, server).await {
        Ok(Ok(outcome)) => outcome?,
        Ok(Err(e)) => return Err(ProcessError::Join(e)),
        Err(_) => {
            tracing::error!(
                "Failed to shut down within {} seconds",
                FINAL_SHUTDOWN_TIMEOUT.as_secs()
            );
            std::process::exit(4);
        }
    }

    Ok(())
}
