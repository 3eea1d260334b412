//! Concord CLI - Resolve disputed software registry clusters.

use anyhow::Context;
use clap::Parser;
use concord_cli::commands;
use concord_cli::{Cli, Command, ConcordConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Logs go to stderr so summaries on stdout stay clean
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = ConcordConfig::load(cli.config.as_deref())?;
    if let Some(model) = cli.model {
        config = config.with_model(model);
    }
    config.validate()?;

    let metrics = match cli.command {
        Command::Prepare(args) => commands::execute_prepare(args, &config)
            .await
            .context("prepare failed")?,
        Command::Infer(args) => commands::execute_infer(args, &config, cli.dry_run)
            .await
            .context("inference failed")?,
        Command::Resolve(args) => commands::execute_resolve(args, &config, cli.dry_run)
            .await
            .context("resolution failed")?,
    };

    println!("{}", metrics.summary());
    Ok(())
}
