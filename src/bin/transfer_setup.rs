use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

use confidential_transfer::setup::TransferSetup;

const DEFAULT_ARTIFACT_DIR: &str = "./artifacts";

#[derive(Debug, Parser)]
#[command(name = "transfer_setup")]
#[command(about = "Runs the Groth16 circuit-specific setup and persists the proving/verifying keys")]
struct Args {
    /// Directory to write the proving key, verifying key, constraint count,
    /// and generated Solidity verifier stub to
    #[arg(long, env = "TRANSFER_ARTIFACT_DIR", default_value = DEFAULT_ARTIFACT_DIR)]
    artifact_dir: PathBuf,

    /// Toggle structured (JSON) logs
    #[arg(long, env = "TRANSFER_LOG_JSON", default_value_t = false)]
    json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.json);

    let mut rng = rand::rngs::OsRng;
    let setup = TransferSetup::generate(&mut rng).context("groth16 setup failed")?;
    tracing::info!(constraint_count = setup.constraint_count, "setup complete, persisting artifacts");

    setup
        .save(&args.artifact_dir)
        .with_context(|| format!("failed to persist artifacts to {}", args.artifact_dir.display()))?;

    println!(
        "wrote proving key, verifying key, and verifier stub to {} ({} constraints)",
        args.artifact_dir.display(),
        setup.constraint_count
    );
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt::fmt().with_env_filter(filter).with_target(false);

    if json {
        builder.json().flatten_event(true).init();
    } else {
        builder.compact().init();
    }
}
