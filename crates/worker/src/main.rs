use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hirely_db::PgStore;
use hirely_lifecycle::{AutoConfirmSweeper, EscrowStub, RequestService};
use hirely_worker::config::WorkerConfig;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hirely_worker=debug,hirely_lifecycle=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let once = std::env::args().skip(1).any(|arg| arg == "--once");

    // --- Configuration ---
    let config = WorkerConfig::from_env();
    tracing::info!(
        interval_secs = config.interval_secs,
        auto_confirm_after_hours = config.lifecycle.auto_confirm_after_hours,
        once,
        "Loaded worker configuration"
    );

    // --- Database ---
    let pool = hirely_db::create_pool(&config.database_url, config.max_connections)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    hirely_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    hirely_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Lifecycle ---
    let store = Arc::new(PgStore::new(pool.clone()));
    let sink = hirely_events::sink_from_env();
    let requests = RequestService::new(store, sink, Arc::new(EscrowStub), config.lifecycle);
    let sweeper = AutoConfirmSweeper::new(requests);

    if once {
        match sweeper.run_once().await {
            Ok(report) => tracing::info!(?report, "Single auto-confirm sweep complete"),
            Err(e) => tracing::error!(error = %e, "Single auto-confirm sweep failed"),
        }
        pool.close().await;
        return;
    }

    // --- Sweeper ---
    let cancel = CancellationToken::new();
    let interval = config.interval();
    let sweeper_cancel = cancel.clone();
    let sweeper_handle = tokio::spawn(async move {
        sweeper.run(interval, sweeper_cancel).await;
    });
    tracing::info!("Auto-confirm sweeper started");

    shutdown_signal().await;

    cancel.cancel();
    if let Err(e) = sweeper_handle.await {
        tracing::error!(error = %e, "Sweeper task panicked");
    }

    pool.close().await;
    tracing::info!("Worker shut down");
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
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
