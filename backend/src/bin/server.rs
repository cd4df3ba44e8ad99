//! Bus Scheduler HTTP Server Binary
//!
//! Main entry point: loads the configuration, builds the location graph and
//! the repository, runs the periodic scheduler loop and serves the REST API
//! until Ctrl-C or SIGTERM.
//!
//! # Usage
//!
//! ```bash
//! # Uses ./scheduler.toml (or backend/scheduler.toml)
//! cargo run --bin bus-scheduler-server
//!
//! # Explicit config file, cycles every 5 minutes
//! SCHEDULER_CONFIG=/etc/bus-scheduler.toml SCHEDULER_INTERVAL_MINUTES=5 \
//!   cargo run --bin bus-scheduler-server
//! ```
//!
//! # Environment Variables
//!
//! - `SCHEDULER_CONFIG`: Path to the TOML configuration file
//! - `HOST`, `PORT`: Override `[server]`
//! - `REPOSITORY_TYPE`: Override `[repository] type`
//! - `SCHEDULER_INTERVAL_MINUTES`: Override `[scheduler] interval_minutes`
//! - `RUST_LOG`: Log filter (default: info)

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use bus_scheduler::config::AppConfig;
use bus_scheduler::db::RepositoryFactory;
use bus_scheduler::graph::LocationGraph;
use bus_scheduler::http::{create_router, AppState};
use bus_scheduler::services::{CycleTracker, SchedulerService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging; `log` records from the library are bridged in.
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting bus scheduler");

    let config = AppConfig::load().context("Failed to load configuration")?;

    let graph = LocationGraph::from_config(&config.graph).context("Invalid location graph")?;
    info!(locations = graph.len(), "Location graph built");

    let repository =
        RepositoryFactory::create(&config.repository).context("Failed to create repository")?;
    info!(repository = %config.repository.repo_type, "Repository initialized successfully");

    let tracker = CycleTracker::with_history_limit(config.scheduler.history_limit);
    let scheduler = Arc::new(
        SchedulerService::new(
            repository.set.clone(),
            Arc::new(graph),
            config.scheduler_settings(),
        )
        .with_tracker(tracker),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler_loop = tokio::spawn({
        let scheduler = Arc::clone(&scheduler);
        async move { scheduler.run(shutdown_rx).await }
    });

    let state = AppState::new(repository.set.tasks.clone(), scheduler);
    let app = create_router(state);

    let addr: SocketAddr = config
        .server
        .bind_address()
        .parse()
        .context("Invalid server address")?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped, waiting for the scheduler loop");
    let _ = shutdown_tx.send(true);
    if let Err(e) = scheduler_loop.await {
        warn!(error = %e, "Scheduler loop ended abnormally");
    }

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
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
                warn!(error = %e, "Failed to listen for SIGTERM");
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

    info!("Shutdown signal received");
}
