use anyhow::Result;
use clap::Parser;

use minewatch_daemon::cli::DaemonCli;
use minewatch_daemon::logging::init_tracing;
use minewatch_daemon::orchestrator::Orchestrator;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = DaemonCli::parse();

    let (config, rejected) = cli.load_config().await?;

    init_tracing(&config.general)?;
    for r in &rejected {
        tracing::warn!(
            env_key = %r.env_key,
            value = %r.value,
            expected = r.expected,
            "failed to parse env var, ignoring"
        );
    }

    if cli.validate {
        println!("configuration OK: {}", cli.config.display());
        return Ok(());
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        "minewatch-daemon starting"
    );

    let mut orchestrator = Orchestrator::build_from_config(config).await?;
    orchestrator.run().await
}
