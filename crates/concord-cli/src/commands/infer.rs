//! Infer command implementation.

use crate::cli::InferArgs;
use crate::config::ConcordConfig;
use crate::error::Result;
use concord_domain::Oracle;
use concord_ledger::MessagesFile;
use concord_llm::{MockOracle, OracleClient};
use concord_resolver::{InferenceRunner, ResolverConfig, ResolverMetrics};
use tracing::info;

/// Execute the infer command.
///
/// With `dry_run` the mock oracle answers every prompt.
pub async fn execute_infer(
    args: InferArgs,
    config: &ConcordConfig,
    dry_run: bool,
) -> Result<ResolverMetrics> {
    let mut resolver = config.resolver_config();
    if let Some(messages) = args.messages {
        resolver.paths.messages = messages;
    }
    if let Some(results) = args.results {
        resolver.paths.ledger = results;
    }
    if let Some(dir) = args.raw_results_dir {
        resolver.paths.raw_results_dir = dir;
    }
    resolver.persist_unparsed |= args.persist_unparsed;

    if dry_run {
        info!("Dry run: answering with the mock oracle");
        run(MockOracle::default(), &resolver).await
    } else {
        run(OracleClient::from_config(&config.oracle)?, &resolver).await
    }
}

async fn run<O: Oracle>(oracle: O, resolver: &ResolverConfig) -> Result<ResolverMetrics> {
    let messages = MessagesFile::open(&resolver.paths.messages);
    let runner = InferenceRunner::new(oracle, resolver)?;
    Ok(runner.run(&messages).await?)
}
