//! `healthwatch` -- health monitoring daemon.
//!
//! Polls every registered health parameter on a fixed interval, records
//! the results, sends notifications for state changes and serves the
//! current health over HTTP.
//!
//! # Environment variables
//!
//! See [`MonitorSettings::from_env`] for the full list. Notable ones:
//!
//! | Variable             | Default | Description                                |
//! |----------------------|---------|--------------------------------------------|
//! | `NOTIFY_WEBHOOK_URL` | unset   | Webhook receiving notifications            |
//! | `POLL_INTERVAL_SECS` | `60`    | Seconds between polling cycles             |
//! | `RUST_LOG`           | `healthwatch_*=info` | Log filter                   |

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use healthwatch_core::HealthStatus;
use healthwatch_events::{LogSink, NotificationSink, WebhookSink};
use healthwatch_monitor::config::MonitorSettings;
use healthwatch_monitor::params::LogVolumeParam;
use healthwatch_monitor::routes::{self, AppState};
use healthwatch_monitor::{scheduler, HealthOrchestrator};
use tokio_util::sync::CancellationToken;
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// HTTP request timeout for the query surface.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Configuration ---
    // Loaded before tracing so the log-volume layer can be installed with it.
    let settings = MonitorSettings::from_env();

    let error_logs = Arc::new(LogVolumeParam::new(
        Level::ERROR,
        HealthStatus::Unstable,
        settings
            .as_ref()
            .map(|s| s.log_error_max_count)
            .unwrap_or(healthwatch_monitor::config::DEFAULT_LOG_ERROR_MAX_COUNT),
        settings
            .as_ref()
            .map(MonitorSettings::log_error_window)
            .unwrap_or(Duration::from_secs(
                healthwatch_monitor::config::DEFAULT_LOG_ERROR_WINDOW_SECS,
            )),
    ));

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    "healthwatch_monitor=info,healthwatch_events=info,healthwatch_core=info".into()
                }),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(error_logs.layer())
        .init();

    let settings = settings.unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        std::process::exit(1);
    });
    tracing::info!(
        host = %settings.host,
        port = settings.port,
        poll_interval_secs = settings.poll_interval_secs,
        "Loaded monitor configuration"
    );

    // --- Notification sink ---
    let sink: Arc<dyn NotificationSink> = match &settings.webhook_url {
        Some(url) => match WebhookSink::new(url.clone()) {
            Ok(sink) => {
                tracing::info!(url = %url, "Delivering notifications to webhook");
                Arc::new(sink)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to build webhook client");
                std::process::exit(1);
            }
        },
        None => {
            tracing::info!("NOTIFY_WEBHOOK_URL not set, notifications are only logged");
            Arc::new(LogSink)
        }
    };

    // --- Orchestrator ---
    let orchestrator = match HealthOrchestrator::new(&settings.monitor, sink) {
        Ok(orchestrator) => Arc::new(orchestrator),
        Err(e) => {
            tracing::error!(error = %e, "Failed to create health orchestrator");
            std::process::exit(1);
        }
    };
    orchestrator.register(error_logs);

    // --- Polling ---
    let cancel = CancellationToken::new();
    let polling_handle = tokio::spawn(scheduler::run(
        Arc::clone(&orchestrator),
        settings.poll_interval(),
        cancel.clone(),
    ));

    // --- Server ---
    let app = routes::app(
        AppState {
            orchestrator: Arc::clone(&orchestrator),
        },
        REQUEST_TIMEOUT,
    );

    let addr = match settings.host.parse() {
        Ok(ip) => SocketAddr::new(ip, settings.port),
        Err(e) => {
            tracing::error!(host = %settings.host, error = %e, "Invalid HOST address");
            std::process::exit(1);
        }
    };
    tracing::info!(%addr, "Starting server");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(%addr, error = %e, "Failed to bind to address");
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "Server error");
    }

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, stopping polling");
    cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), polling_handle).await;

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT (Ctrl-C) or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
