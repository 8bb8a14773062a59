use std::sync::Arc;

use anyhow::Context;
use jobwire_ops::OperationRegistry;
use jobwire_worker::{BrokerConfig, PoolConfig, WorkerPool};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let broker_config = BrokerConfig::from_env()?;
    let pool_config = PoolConfig::from_env()?;

    let backend = jobwire_broker::connect(&broker_config.url, broker_config.result_expires)
        .await
        .context("failed to connect to broker")?;
    if backend.in_process {
        tracing::warn!("BROKER_URL is memory://, this worker only sees jobs submitted in-process");
    }

    let pool = WorkerPool::new(
        backend.broker,
        backend.store,
        Arc::new(OperationRegistry::standard()),
        pool_config,
    );

    let cancel = CancellationToken::new();
    let runner = {
        let cancel = cancel.clone();
        tokio::spawn(async move { pool.run(cancel).await })
    };

    shutdown_signal().await;
    tracing::info!("Shutdown signal received, waiting for in-flight jobs");
    cancel.cancel();
    runner.await.context("worker pool task failed")?;

    tracing::info!("Worker stopped");
    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "jobwire_worker=debug,jobwire_broker=info".into());

    if std::env::var("LOG_FORMAT").is_ok_and(|f| f == "json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
