use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

use confidential_transfer::server::{run_server, ServerConfig};
use confidential_transfer::setup::ProverConfig;

const DEFAULT_BIND: &str = "127.0.0.1:4000";
const DEFAULT_ARTIFACT_DIR: &str = "./artifacts";
const DEFAULT_ACCOUNT_COUNT: usize = 32;

#[derive(Debug, Parser)]
#[command(name = "transfer_server")]
#[command(about = "HTTP facade: witness build, Groth16 proving, account/root queries")]
struct Args {
    /// Address to bind the HTTP server to (host:port)
    #[arg(long, env = "TRANSFER_BIND", default_value = DEFAULT_BIND)]
    bind: SocketAddr,

    /// Directory holding (or to receive) the persisted proving/verifying keys
    #[arg(long, env = "TRANSFER_ARTIFACT_DIR", default_value = DEFAULT_ARTIFACT_DIR)]
    artifact_dir: PathBuf,

    /// Run a fresh Groth16 setup instead of loading a persisted one
    #[arg(long, env = "TRANSFER_FRESH_SETUP", default_value_t = false)]
    fresh_setup: bool,

    /// Number of accounts in the genesis balance tree (<= 2^TREE_DEPTH)
    #[arg(long, env = "TRANSFER_ACCOUNT_COUNT", default_value_t = DEFAULT_ACCOUNT_COUNT)]
    account_count: usize,

    /// Toggle structured (JSON) logs
    #[arg(long, env = "TRANSFER_LOG_JSON", default_value_t = false)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.json)?;

    let config = ServerConfig {
        bind: args.bind,
        prover: ProverConfig {
            artifact_dir: args.artifact_dir,
            fresh_setup: args.fresh_setup,
        },
        account_count: args.account_count,
    };

    run_server(config).await.context("transfer server exited with error")
}

fn init_tracing(json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt::fmt().with_env_filter(filter).with_target(false);

    if json {
        builder.json().flatten_event(true).init();
    } else {
        builder.compact().init();
    }

    Ok(())
}
