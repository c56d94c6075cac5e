use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::db::AccountTable;
use crate::setup::{ProverConfig, TransferSetup};

use super::routes::TransferServer;

const LOG_TARGET: &str = "server::bootstrap";

pub struct ServerConfig {
    pub bind: SocketAddr,
    pub prover: ProverConfig,
    pub account_count: usize,
}

pub async fn run_server(config: ServerConfig) -> Result<()> {
    let mut rng = rand::rngs::OsRng;

    let setup = TransferSetup::obtain(&config.prover, &mut rng)
        .with_context(|| format!("failed to obtain setup from {}", config.prover.artifact_dir.display()))?;
    info!(
        target: LOG_TARGET,
        constraint_count = setup.constraint_count,
        fresh = config.prover.fresh_setup,
        "transfer setup ready"
    );

    let accounts = AccountTable::genesis(config.account_count, &mut rng);
    info!(target: LOG_TARGET, root = ?accounts.root(), accounts = config.account_count, "genesis account table built");

    let server = TransferServer::new(accounts, setup);
    let router = server.into_router();
    let make_service = router.into_make_service();

    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    let local_addr = listener.local_addr()?;
    info!(target: LOG_TARGET, %local_addr, "confidential transfer server listening");

    axum::serve(listener, make_service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server exited with error")
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(target: LOG_TARGET, error = %err, "failed to install ctrl-c handler");
    }
    info!(target: LOG_TARGET, "shutdown signal received");
}
